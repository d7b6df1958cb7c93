use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::error::TemplateError;
use crate::model::{
    CoilKind, Component, DipoleKind, Point, Sensor, TemplateDocument, ZPolarity, MAX_CHANNELS,
    PLACEHOLDER_NAME,
};

const KEY_NAME: &str = "TEMPLATE.NAME";
const KEY_ZPOSITIVE: &str = "RX.ZPOSITIVE";
const BLOCK_OPEN: &str = "<CH>";
const BLOCK_CLOSE: &str = "</CH>";

const CH_CMP: &str = "CH.CMP";
const CH_INDEX: &str = "CH.INDEX";
const CH_XYZ1: &str = "CH.OFFSET.XYZ1";
const CH_XYZ2: &str = "CH.OFFSET.XYZ2";

/// Result of a successful parse: the new document plus every `<CH>` block
/// that did not make it into the channel list.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTemplate {
    pub document: TemplateDocument,
    pub dropped: Vec<DroppedBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedBlock {
    /// 1-based position of the block in the file.
    pub ordinal: usize,
    pub reason: DropReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    MissingComponent,
    Inactive,
    UnknownComponent(String),
    /// Valid channel beyond the 16-channel limit.
    OverCapacity,
}

impl fmt::Display for DroppedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            DropReason::MissingComponent => write!(f, "block {}: no CH.CMP", self.ordinal),
            DropReason::Inactive => write!(f, "block {}: channel is Off", self.ordinal),
            DropReason::UnknownComponent(c) => {
                write!(f, "block {}: unknown component {:?}", self.ordinal, c)
            }
            DropReason::OverCapacity => {
                write!(f, "block {}: more than {} channels", self.ordinal, MAX_CHANNELS)
            }
        }
    }
}

/// Key/value pairs collected between `<CH>` and `</CH>`.
#[derive(Debug, Default)]
struct RawBlock {
    fields: HashMap<String, String>,
}

impl RawBlock {
    fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

struct Header {
    name: String,
    z_polarity: ZPolarity,
}

fn value_of(line: &str) -> Option<&str> {
    line.split_once('=').map(|(_, v)| v.trim())
}

fn scan(text: &str) -> (Header, Vec<RawBlock>) {
    let mut header = Header {
        name: PLACEHOLDER_NAME.to_string(),
        z_polarity: ZPolarity::Up,
    };
    let mut blocks = Vec::new();
    let mut current: Option<RawBlock> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with(KEY_NAME) {
            if let Some(v) = value_of(line).filter(|v| !v.is_empty()) {
                header.name = v.to_string();
            }
        } else if line.starts_with(KEY_ZPOSITIVE) {
            if let Some(z) = value_of(line).and_then(ZPolarity::from_keyword) {
                header.z_polarity = z;
            }
        } else if line.starts_with(BLOCK_OPEN) {
            if current.is_some() {
                debug!("unterminated <CH> block discarded");
            }
            current = Some(RawBlock::default());
        } else if line.starts_with(BLOCK_CLOSE) {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
        } else if let Some(block) = current.as_mut() {
            if let Some((key, value)) = line.split_once('=') {
                block
                    .fields
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }

    (header, blocks)
}

/// Longest numeric prefix of `s`, e.g. `"12.5m"` -> 12.5. Anything
/// unparsable (or NaN/infinite) reads as 0.
fn parse_number(s: &str) -> f64 {
    let s = s.trim();
    let end = s
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    (1..=end)
        .rev()
        .find_map(|n| s[..n].parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Leading integer of `s` (optional sign, then digits), 0 when absent.
fn parse_index(s: Option<&str>) -> i64 {
    let s = s.unwrap_or("").trim();
    let digits_from = usize::from(s.starts_with(['+', '-']));
    let end = digits_from
        + s[digits_from..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
    s[..end].parse().unwrap_or(0)
}

/// `X:Y:Z` offset; only X and Y are kept.
fn parse_xy(s: Option<&str>) -> Point {
    let mut parts = s.unwrap_or("").split(':');
    let x = parts.next().map(parse_number).unwrap_or(0.0);
    let y = parts.next().map(parse_number).unwrap_or(0.0);
    Point::new(x, y)
}

fn block_sensor(block: &RawBlock, file_z: ZPolarity) -> Result<(i64, Sensor), DropReason> {
    let tag = block.get(CH_CMP).ok_or(DropReason::MissingComponent)?;
    let component =
        Component::from_tag(tag).ok_or_else(|| DropReason::UnknownComponent(tag.to_string()))?;
    let index = parse_index(block.get(CH_INDEX));

    let local = |p: Point| Point::new(p.x, file_z.from_file_y(p.y));
    let first = local(parse_xy(block.get(CH_XYZ1)));
    let second = local(parse_xy(block.get(CH_XYZ2)));

    let sensor = match component {
        Component::Off => return Err(DropReason::Inactive),
        Component::Ex => Sensor::dipole(DipoleKind::Ex, first, second),
        Component::Ey => Sensor::dipole(DipoleKind::Ey, first, second),
        Component::Tx => Sensor::dipole(DipoleKind::Tx, first, second),
        Component::Hx => Sensor::coil(CoilKind::Hx, first),
        Component::Hy => Sensor::coil(CoilKind::Hy, first),
        Component::Hz => Sensor::coil(CoilKind::Hz, first),
    };
    Ok((index, sensor))
}

/// Parses template text into a fresh document. Fails only when no block
/// yields a channel.
pub fn parse(text: &str) -> Result<ParsedTemplate, TemplateError> {
    let (header, blocks) = scan(text);

    let mut kept: Vec<(usize, i64, Sensor)> = Vec::new();
    let mut dropped = Vec::new();
    for (i, block) in blocks.iter().enumerate() {
        match block_sensor(block, header.z_polarity) {
            Ok((index, sensor)) => kept.push((i + 1, index, sensor)),
            Err(reason) => {
                debug!(block = i + 1, ?reason, "CH block dropped");
                dropped.push(DroppedBlock {
                    ordinal: i + 1,
                    reason,
                });
            }
        }
    }

    if kept.is_empty() {
        warn!(blocks = blocks.len(), "template has no valid CH blocks");
        return Err(TemplateError::NoChannels);
    }

    kept.sort_by_key(|(_, index, _)| *index);
    if kept.len() > MAX_CHANNELS {
        warn!(
            found = kept.len(),
            max = MAX_CHANNELS,
            "template has too many channels, extra ones dropped"
        );
        for (ordinal, _, _) in kept.drain(MAX_CHANNELS..) {
            dropped.push(DroppedBlock {
                ordinal,
                reason: DropReason::OverCapacity,
            });
        }
    }
    dropped.sort_by_key(|d| d.ordinal);

    let sensors = kept.into_iter().map(|(_, _, sensor)| sensor).collect();
    Ok(ParsedTemplate {
        document: TemplateDocument::new(header.name, header.z_polarity, sensors),
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSY: &str = "
<TEMPLATE>
TEMPLATE.NAME=  Field Line 3
      RX.XAZIMUTH=90
  RX.ZPOSITIVE=down

<CH>
CH.CMP = Hz
    CH.INDEX = 7
CH.NAME1 = Hz7
CH.OFFSET.XYZ1 = 2:-4:0
CH.AZIMUTH = 0
CH.INCL = 90.000
CH.VENDOR = foo
</CH>
\t<CH>\r
\t\tCH.CMP = Ex\r
\t\tCH.INDEX = 2\r
\t\tCH.OFFSET.XYZ1 = -50.5:abc\r
\t\tCH.OFFSET.XYZ2 = 50:10:0\r
\t</CH>\r
<CH>
CH.CMP = Bogus
CH.INDEX = 1
</CH>
<CH>
CH.CMP = Off
</CH>
</TEMPLATE>
";

    #[test]
    fn test_parse_messy_file() {
        let parsed = parse(MESSY).unwrap();
        let doc = &parsed.document;
        assert_eq!(doc.name(), "Field Line 3");
        assert_eq!(doc.z_polarity(), ZPolarity::Down);
        assert_eq!(doc.len(), 2);

        // Sorted by recorded index: Ex (2) before Hz (7), then renumbered
        let ex = &doc.channels()[0];
        assert_eq!(ex.index(), 1);
        assert_eq!(ex.component(), Component::Ex);
        assert_eq!(ex.neg(), Point::new(-50.5, 0.0));
        assert_eq!(ex.pos(), Point::new(50.0, -10.0));

        let hz = &doc.channels()[1];
        assert_eq!(hz.index(), 2);
        assert_eq!(hz.component(), Component::Hz);
        assert_eq!(hz.pos(), Point::new(2.0, 4.0));
        assert_eq!(hz.neg(), Point::ORIGIN);

        assert_eq!(
            parsed.dropped,
            vec![
                DroppedBlock {
                    ordinal: 3,
                    reason: DropReason::UnknownComponent("Bogus".to_string())
                },
                DroppedBlock {
                    ordinal: 4,
                    reason: DropReason::Inactive
                },
            ]
        );
    }

    #[test]
    fn test_defaults_when_header_missing_or_malformed() {
        let text = "<CH>\nCH.CMP = Ey\nCH.OFFSET.XYZ2 = 1:2:3\n</CH>\nRX.ZPOSITIVE=sideways\nTEMPLATE.NAME=";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.document.name(), PLACEHOLDER_NAME);
        assert_eq!(parsed.document.z_polarity(), ZPolarity::Up);
        assert_eq!(parsed.document.channels()[0].neg(), Point::ORIGIN);
        assert_eq!(parsed.document.channels()[0].pos(), Point::new(1.0, 2.0));
    }

    #[test]
    fn test_no_valid_blocks_fails() {
        assert_eq!(
            parse("<TEMPLATE>\nTEMPLATE.NAME=x\n</TEMPLATE>"),
            Err(TemplateError::NoChannels)
        );
        assert_eq!(
            parse("<CH>\nCH.CMP = Off\n</CH>\n<CH>\nCH.CMP = ex\n</CH>\n<CH>\nCH.INDEX=1\n</CH>"),
            Err(TemplateError::NoChannels)
        );
        assert_eq!(parse(""), Err(TemplateError::NoChannels));
        // Unterminated block never counts
        assert_eq!(parse("<CH>\nCH.CMP = Ex\n"), Err(TemplateError::NoChannels));
    }

    #[test]
    fn test_garbage_index_sorts_first_and_ties_keep_file_order() {
        let text = "<CH>\nCH.CMP = Hx\nCH.INDEX = 3\n</CH>\n\
                    <CH>\nCH.CMP = Hy\nCH.INDEX = junk\n</CH>\n\
                    <CH>\nCH.CMP = Tx\nCH.INDEX = 3\n</CH>";
        let doc = parse(text).unwrap().document;
        let cmps: Vec<Component> = doc.channels().iter().map(|c| c.component()).collect();
        assert_eq!(cmps, vec![Component::Hy, Component::Hx, Component::Tx]);
        let idx: Vec<usize> = doc.channels().iter().map(|c| c.index()).collect();
        assert_eq!(idx, vec![1, 2, 3]);
    }

    #[test]
    fn test_more_than_sixteen_channels_truncated() {
        let text: String = (1..=18)
            .map(|i| format!("<CH>\nCH.CMP = Ex\nCH.INDEX = {}\nCH.OFFSET.XYZ2 = {}:0:0\n</CH>\n", i, i))
            .collect();
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.document.len(), MAX_CHANNELS);
        assert_eq!(parsed.document.channels()[15].pos().x, 16.0);
        assert_eq!(parsed.dropped.len(), 2);
        assert!(parsed
            .dropped
            .iter()
            .all(|d| d.reason == DropReason::OverCapacity));
    }

    #[test]
    fn test_parse_number_tolerance() {
        assert_eq!(parse_number("12.5"), 12.5);
        assert_eq!(parse_number(" -3 "), -3.0);
        assert_eq!(parse_number("12.5m"), 12.5);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("NaN"), 0.0);
        assert_eq!(parse_number("inf"), 0.0);
        assert_eq!(parse_number("-"), 0.0);
    }

    #[test]
    fn test_parse_index_tolerance() {
        assert_eq!(parse_index(Some("4")), 4);
        assert_eq!(parse_index(Some(" -2 ")), -2);
        assert_eq!(parse_index(Some("5abc")), 5);
        assert_eq!(parse_index(Some("x5")), 0);
        assert_eq!(parse_index(None), 0);
    }

    #[test]
    fn test_failed_load_leaves_document_untouched() {
        let mut doc = TemplateDocument::default();
        doc.set_name("keep me");
        doc.toggle_z_polarity();
        let before = doc.clone();
        assert!(doc.load_template("<CH>\nCH.CMP = Off\n</CH>").is_err());
        assert_eq!(doc, before);

        doc.load_template("<CH>\nCH.CMP = Hy\nCH.OFFSET.XYZ1 = 1:1:0\n</CH>")
            .unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.z_polarity(), ZPolarity::Up);
        assert_eq!(doc.name(), PLACEHOLDER_NAME);
    }
}
