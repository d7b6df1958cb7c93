//! `.stt` template text codec.
//!
//! Serialization writes only non-Off channels, with Y converted to the file
//! frame. Parsing is lenient: malformed fields fall back to 0 and blocks with
//! an unusable `CH.CMP` are dropped, so the only hard failure is a file with
//! no usable channel at all.

mod parse;

pub use parse::{parse, DroppedBlock, DropReason, ParsedTemplate};

use tracing::info;

use crate::error::TemplateError;
use crate::model::{Channel, Component, Point, Sensor, TemplateDocument, ZPolarity};

pub const RX_XAZIMUTH: u32 = 90;

/// 3-decimal offset, never printing a negative zero.
fn fmt_offset(v: f64) -> String {
    format!("{:.3}", v + 0.0)
}

fn offset_line(slot: u8, p: Point, z_polarity: ZPolarity) -> String {
    format!(
        "\t\tCH.OFFSET.XYZ{} = {}:{}:0",
        slot,
        fmt_offset(p.x),
        fmt_offset(z_polarity.to_file_y(p.y))
    )
}

fn channel_block(ch: &Channel, z_polarity: ZPolarity) -> Option<String> {
    let cmp = ch.component();
    let idx = ch.index();
    let mut lines = vec![
        "\t<CH>".to_string(),
        format!("\t\tCH.CMP = {}", cmp),
        format!("\t\tCH.INDEX = {}", idx),
    ];

    match *ch.sensor() {
        Sensor::Off => return None,
        Sensor::Dipole { neg, pos, .. } => {
            lines.push(format!("\t\tCH.NAME1 = {}{}-", cmp, idx));
            lines.push(offset_line(1, neg, z_polarity));
            lines.push(format!("\t\tCH.NAME2 = {}{}+", cmp, idx));
            lines.push(offset_line(2, pos, z_polarity));
        }
        Sensor::Coil { at, .. } => {
            lines.push(format!("\t\tCH.NAME1 = {}{}", cmp, idx));
            lines.push(offset_line(1, at, z_polarity));
            let azimuth = if cmp == Component::Hy { "90" } else { "0" };
            let incl = if cmp == Component::Hz { "90.000" } else { "0" };
            lines.push(format!("\t\tCH.AZIMUTH = {}", azimuth));
            lines.push(format!("\t\tCH.INCL = {}", incl));
        }
    }

    lines.push("\t</CH>".to_string());
    Some(lines.join("\n"))
}

pub fn serialize(doc: &TemplateDocument) -> String {
    let z_polarity = doc.z_polarity();
    let blocks: Vec<String> = doc
        .channels()
        .iter()
        .filter_map(|ch| channel_block(ch, z_polarity))
        .collect();

    let mut out = vec![
        "<TEMPLATE>".to_string(),
        format!("\tTEMPLATE.NAME={}", doc.display_name()),
        format!("\tRX.XAZIMUTH={}", RX_XAZIMUTH),
        format!("\tRX.ZPOSITIVE={}", z_polarity.keyword()),
        String::new(),
    ];
    if !blocks.is_empty() {
        out.push(blocks.join("\n\n"));
        out.push(String::new());
    }
    out.push("</TEMPLATE>".to_string());
    out.join("\n")
}

impl TemplateDocument {
    /// Parses `text` and, on success, replaces the whole document with it.
    /// On failure the document is left untouched.
    pub fn load_template(&mut self, text: &str) -> Result<ParsedTemplate, TemplateError> {
        let parsed = parse(text)?;
        self.replace(parsed.document.clone());
        info!(
            name = %self.display_name(),
            channels = self.len(),
            dropped = parsed.dropped.len(),
            "template loaded"
        );
        Ok(parsed)
    }
}
