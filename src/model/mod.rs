//! Channel data model.
//!
//! A [`TemplateDocument`] owns between 1 and 16 channels. Every channel
//! carries a [`Sensor`] describing which poles are meaningful for its
//! component; indices are re-derived after each mutation so they always read
//! `1..=N` in list order.

mod polarity;

pub use polarity::ZPolarity;

use std::fmt;

use tracing::debug;

use crate::error::EditError;

pub const MIN_CHANNELS: usize = 1;
pub const MAX_CHANNELS: usize = 16;
pub const DEFAULT_CHANNELS: usize = 6;
pub const PLACEHOLDER_NAME: &str = "ZEN_template";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Vector from `self` to `other`.
    pub fn to(self, other: Point) -> Point {
        Point::new(other.x - self.x, other.y - self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Off,
    Ex,
    Ey,
    Hx,
    Hy,
    Hz,
    Tx,
}

impl Component {
    pub fn all() -> &'static [Component] {
        &[
            Component::Off,
            Component::Ex,
            Component::Ey,
            Component::Hx,
            Component::Hy,
            Component::Hz,
            Component::Tx,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Component::Off => "Off",
            Component::Ex => "Ex",
            Component::Ey => "Ey",
            Component::Hx => "Hx",
            Component::Hy => "Hy",
            Component::Hz => "Hz",
            Component::Tx => "Tx",
        }
    }

    /// Exact, case-sensitive tag match as written in `CH.CMP`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Component::all().iter().copied().find(|c| c.as_str() == tag)
    }

    pub fn is_dipole(self) -> bool {
        matches!(self, Component::Ex | Component::Ey | Component::Tx)
    }

    pub fn is_coil(self) -> bool {
        matches!(self, Component::Hx | Component::Hy | Component::Hz)
    }

    /// Preview color for the component.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Component::Ex => (0x22, 0xc5, 0x5e),
            Component::Ey => (0x38, 0xbd, 0xf8),
            Component::Tx => (0xef, 0x44, 0x44),
            Component::Hx => (0xf9, 0x73, 0x16),
            Component::Hy => (0xea, 0xb3, 0x08),
            Component::Hz => (0xa8, 0x55, 0xf7),
            Component::Off => (0x6b, 0x72, 0x80),
        }
    }

    /// Next (or previous) entry of [`Component::all`], wrapping around.
    pub fn cycled(self, forward: bool) -> Component {
        let all = Component::all();
        let idx = all.iter().position(|c| *c == self).unwrap_or(0);
        let next = if forward {
            (idx + 1) % all.len()
        } else {
            (idx + all.len() - 1) % all.len()
        };
        all[next]
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DipoleKind {
    Ex,
    Ey,
    Tx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoilKind {
    Hx,
    Hy,
    Hz,
}

impl DipoleKind {
    pub fn component(self) -> Component {
        match self {
            DipoleKind::Ex => Component::Ex,
            DipoleKind::Ey => Component::Ey,
            DipoleKind::Tx => Component::Tx,
        }
    }
}

impl CoilKind {
    pub fn component(self) -> Component {
        match self {
            CoilKind::Hx => Component::Hx,
            CoilKind::Hy => Component::Hy,
            CoilKind::Hz => Component::Hz,
        }
    }
}

/// Pole geometry of a channel. Only the poles a component actually uses are
/// stored, so an Off channel cannot hold coordinates and a coil has exactly
/// one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sensor {
    Off,
    Dipole { kind: DipoleKind, neg: Point, pos: Point },
    Coil { kind: CoilKind, at: Point },
}

impl Sensor {
    pub fn dipole(kind: DipoleKind, neg: Point, pos: Point) -> Self {
        Sensor::Dipole { kind, neg, pos }
    }

    pub fn coil(kind: CoilKind, at: Point) -> Self {
        Sensor::Coil { kind, at }
    }

    pub fn component(&self) -> Component {
        match self {
            Sensor::Off => Component::Off,
            Sensor::Dipole { kind, .. } => kind.component(),
            Sensor::Coil { kind, .. } => kind.component(),
        }
    }

    /// Re-tag the sensor as `component`, carrying poles over where they
    /// still mean something. The positive pole and the coil position are the
    /// same slot; Off discards everything.
    pub fn with_component(self, component: Component) -> Sensor {
        let (neg, pos) = match self {
            Sensor::Off => (Point::ORIGIN, Point::ORIGIN),
            Sensor::Dipole { neg, pos, .. } => (neg, pos),
            Sensor::Coil { at, .. } => (Point::ORIGIN, at),
        };
        match component {
            Component::Off => Sensor::Off,
            Component::Ex => Sensor::dipole(DipoleKind::Ex, neg, pos),
            Component::Ey => Sensor::dipole(DipoleKind::Ey, neg, pos),
            Component::Tx => Sensor::dipole(DipoleKind::Tx, neg, pos),
            Component::Hx => Sensor::coil(CoilKind::Hx, pos),
            Component::Hy => Sensor::coil(CoilKind::Hy, pos),
            Component::Hz => Sensor::coil(CoilKind::Hz, pos),
        }
    }
}

/// One of the four flat coordinate columns of the channel table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    NegX,
    NegY,
    PosX,
    PosY,
}

impl Field {
    pub fn all() -> &'static [Field] {
        &[Field::NegX, Field::NegY, Field::PosX, Field::PosY]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::NegX => "negX",
            Field::NegY => "negY",
            Field::PosX => "posX",
            Field::PosY => "posY",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    index: usize,
    sensor: Sensor,
}

impl Channel {
    fn off(index: usize) -> Self {
        Self { index, sensor: Sensor::Off }
    }

    /// 1-based channel number.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sensor(&self) -> &Sensor {
        &self.sensor
    }

    pub fn component(&self) -> Component {
        self.sensor.component()
    }

    /// `<component><index>`, e.g. `Ex1`.
    pub fn label(&self) -> String {
        format!("{}{}", self.component(), self.index)
    }

    pub fn neg(&self) -> Point {
        match self.sensor {
            Sensor::Dipole { neg, .. } => neg,
            Sensor::Off | Sensor::Coil { .. } => Point::ORIGIN,
        }
    }

    /// Positive pole of a dipole, or the coil position.
    pub fn pos(&self) -> Point {
        match self.sensor {
            Sensor::Dipole { pos, .. } => pos,
            Sensor::Coil { at, .. } => at,
            Sensor::Off => Point::ORIGIN,
        }
    }

    /// Flat read of a coordinate column. Fields a component does not use
    /// read as 0.
    pub fn coordinate(&self, field: Field) -> f64 {
        match field {
            Field::NegX => self.neg().x,
            Field::NegY => self.neg().y,
            Field::PosX => self.pos().x,
            Field::PosY => self.pos().y,
        }
    }

    pub fn is_editable(&self, field: Field) -> bool {
        match self.sensor {
            Sensor::Off => false,
            Sensor::Dipole { .. } => true,
            Sensor::Coil { .. } => matches!(field, Field::PosX | Field::PosY),
        }
    }

    /// Pole separation in local meters for Ex/Ey/Tx, `None` otherwise.
    pub fn dipole_length(&self) -> Option<f64> {
        match self.sensor {
            Sensor::Dipole { neg, pos, .. } => Some(neg.distance(pos)),
            Sensor::Off | Sensor::Coil { .. } => None,
        }
    }

    /// Dipole length to one decimal, `-` for channels without one.
    pub fn dipole_length_display(&self) -> String {
        match self.dipole_length() {
            Some(len) => format!("{:.1}", len),
            None => "-".to_string(),
        }
    }
}

/// The whole editable template: name, Z polarity and the channel list.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDocument {
    name: String,
    z_polarity: ZPolarity,
    channels: Vec<Channel>,
}

fn single_line(name: String) -> String {
    if name.contains(['\r', '\n']) {
        name.replace("\r\n", " ").replace(['\r', '\n'], " ")
    } else {
        name
    }
}

impl Default for TemplateDocument {
    /// Six channels, the first an Ex dipole at the origin, the rest Off.
    fn default() -> Self {
        let mut sensors = vec![Sensor::Off; DEFAULT_CHANNELS];
        sensors[0] = Sensor::dipole(DipoleKind::Ex, Point::ORIGIN, Point::ORIGIN);
        Self::new(PLACEHOLDER_NAME, ZPolarity::Up, sensors)
    }
}

impl TemplateDocument {
    /// Builds a document from sensors in list order. The list is truncated
    /// to 16 entries and padded with one Off channel if empty.
    pub fn new(name: impl Into<String>, z_polarity: ZPolarity, sensors: Vec<Sensor>) -> Self {
        let mut channels: Vec<Channel> = sensors
            .into_iter()
            .take(MAX_CHANNELS)
            .map(|sensor| Channel { index: 0, sensor })
            .collect();
        if channels.is_empty() {
            channels.push(Channel::off(0));
        }
        let mut doc = Self {
            name: single_line(name.into()),
            z_polarity,
            channels,
        };
        doc.reindex();
        doc
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed name, or the placeholder when blank.
    pub fn display_name(&self) -> &str {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            PLACEHOLDER_NAME
        } else {
            trimmed
        }
    }

    /// Line breaks become spaces; the name is written as a single line.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = single_line(name.into());
    }

    pub fn z_polarity(&self) -> ZPolarity {
        self.z_polarity
    }

    pub fn set_z_polarity(&mut self, z_polarity: ZPolarity) {
        self.z_polarity = z_polarity;
    }

    pub fn toggle_z_polarity(&mut self) {
        self.z_polarity = self.z_polarity.toggled();
        debug!(polarity = %self.z_polarity, "z polarity toggled");
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, row: usize) -> Option<&Channel> {
        self.channels.get(row)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Grow with Off channels or truncate from the tail, clamped to 1..=16.
    pub fn set_count(&mut self, n: usize) {
        let n = n.clamp(MIN_CHANNELS, MAX_CHANNELS);
        if n > self.channels.len() {
            let start = self.channels.len();
            self.channels.extend((start..n).map(|i| Channel::off(i + 1)));
        } else {
            self.channels.truncate(n);
        }
        self.reindex();
        debug!(count = n, "channel count set");
    }

    pub fn set_component(&mut self, row: usize, component: Component) -> Result<(), EditError> {
        let count = self.channels.len();
        let ch = self
            .channels
            .get_mut(row)
            .ok_or(EditError::NoSuchRow { row, count })?;
        ch.sensor = ch.sensor.with_component(component);
        debug!(channel = ch.index, %component, "component set");
        Ok(())
    }

    pub fn cycle_component(&mut self, row: usize, forward: bool) -> Result<Component, EditError> {
        let count = self.channels.len();
        let next = self
            .channels
            .get(row)
            .ok_or(EditError::NoSuchRow { row, count })?
            .component()
            .cycled(forward);
        self.set_component(row, next)?;
        Ok(next)
    }

    pub fn set_coordinate(&mut self, row: usize, field: Field, value: f64) -> Result<(), EditError> {
        let count = self.channels.len();
        let ch = self
            .channels
            .get_mut(row)
            .ok_or(EditError::NoSuchRow { row, count })?;
        let component = ch.component();
        let slot = match (&mut ch.sensor, field) {
            (Sensor::Dipole { neg, .. }, Field::NegX) => &mut neg.x,
            (Sensor::Dipole { neg, .. }, Field::NegY) => &mut neg.y,
            (Sensor::Dipole { pos, .. }, Field::PosX) => &mut pos.x,
            (Sensor::Dipole { pos, .. }, Field::PosY) => &mut pos.y,
            (Sensor::Coil { at, .. }, Field::PosX) => &mut at.x,
            (Sensor::Coil { at, .. }, Field::PosY) => &mut at.y,
            _ => return Err(EditError::NotEditable { component, field }),
        };
        *slot = value;
        debug!(channel = ch.index, %field, value, "coordinate set");
        Ok(())
    }

    /// Wholesale replacement used by a successful template load.
    pub(crate) fn replace(&mut self, other: TemplateDocument) {
        *self = other;
    }

    fn reindex(&mut self) {
        for (i, ch) in self.channels.iter_mut().enumerate() {
            ch.index = i + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn ex(neg: (f64, f64), pos: (f64, f64)) -> Sensor {
        Sensor::dipole(
            DipoleKind::Ex,
            Point::new(neg.0, neg.1),
            Point::new(pos.0, pos.1),
        )
    }

    fn assert_dense(doc: &TemplateDocument) {
        for (i, ch) in doc.channels().iter().enumerate() {
            assert_eq!(ch.index(), i + 1);
        }
    }

    #[test]
    fn test_default_document() {
        let doc = TemplateDocument::default();
        assert_eq!(doc.len(), 6);
        assert_eq!(doc.name(), PLACEHOLDER_NAME);
        assert_eq!(doc.z_polarity(), ZPolarity::Up);
        assert_eq!(doc.channels()[0].component(), Component::Ex);
        assert!(doc.channels()[1..]
            .iter()
            .all(|c| c.component() == Component::Off));
        assert_dense(&doc);
    }

    #[test]
    fn test_set_count_clamps_and_reindexes() {
        let mut doc = TemplateDocument::default();
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let n: usize = rng.gen_range(0..40);
            doc.set_count(n);
            assert_eq!(doc.len(), n.clamp(1, 16));
            assert_dense(&doc);
        }
        doc.set_count(0);
        assert_eq!(doc.len(), 1);
        doc.set_count(usize::MAX);
        assert_eq!(doc.len(), 16);
    }

    #[test]
    fn test_set_count_keeps_head_and_appends_off() {
        let mut doc = TemplateDocument::default();
        doc.set_coordinate(0, Field::PosX, 5.0).unwrap();
        doc.set_count(2);
        doc.set_count(4);
        assert_eq!(doc.channels()[0].pos().x, 5.0);
        assert!(doc.channels()[1..]
            .iter()
            .all(|c| c.component() == Component::Off));
    }

    #[test]
    fn test_off_zeroes_coordinates() {
        let mut doc = TemplateDocument::new("t", ZPolarity::Up, vec![ex((-5.0, 1.0), (5.0, 2.0))]);
        doc.set_component(0, Component::Off).unwrap();
        for field in Field::all() {
            assert_eq!(doc.channels()[0].coordinate(*field), 0.0);
        }
        // Leaving Off does not invent coordinates
        doc.set_component(0, Component::Ey).unwrap();
        assert_eq!(doc.channels()[0].neg(), Point::ORIGIN);
        assert_eq!(doc.channels()[0].pos(), Point::ORIGIN);
        doc.set_component(0, Component::Off).unwrap();
        doc.set_component(0, Component::Hz).unwrap();
        assert_eq!(doc.channels()[0].pos(), Point::ORIGIN);
    }

    #[test]
    fn test_component_switch_preserves_poles() {
        let mut doc = TemplateDocument::new("t", ZPolarity::Up, vec![ex((-5.0, 1.0), (5.0, 2.0))]);
        doc.set_component(0, Component::Tx).unwrap();
        assert_eq!(doc.channels()[0].neg(), Point::new(-5.0, 1.0));
        assert_eq!(doc.channels()[0].pos(), Point::new(5.0, 2.0));

        doc.set_component(0, Component::Hy).unwrap();
        let ch = &doc.channels()[0];
        assert_eq!(ch.pos(), Point::new(5.0, 2.0));
        assert_eq!(ch.neg(), Point::ORIGIN);

        doc.set_component(0, Component::Ex).unwrap();
        assert_eq!(doc.channels()[0].pos(), Point::new(5.0, 2.0));
        assert_eq!(doc.channels()[0].neg(), Point::ORIGIN);
    }

    #[test]
    fn test_set_coordinate_rules() {
        let mut doc = TemplateDocument::default();
        doc.set_component(1, Component::Hx).unwrap();

        assert!(doc.set_coordinate(0, Field::NegY, -2.5).is_ok());
        assert_eq!(doc.channels()[0].neg().y, -2.5);

        assert!(doc.set_coordinate(1, Field::PosY, 7.0).is_ok());
        assert_eq!(
            doc.set_coordinate(1, Field::NegX, 1.0),
            Err(EditError::NotEditable {
                component: Component::Hx,
                field: Field::NegX
            })
        );
        assert_eq!(doc.channels()[1].neg(), Point::ORIGIN);

        let before = doc.clone();
        assert!(doc.set_coordinate(2, Field::PosX, 1.0).is_err());
        assert_eq!(
            doc.set_coordinate(99, Field::PosX, 1.0),
            Err(EditError::NoSuchRow { row: 99, count: 6 })
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_dipole_length() {
        let ch = TemplateDocument::new("t", ZPolarity::Down, vec![ex((-5.0, 0.0), (5.0, 0.0))])
            .channels()[0]
            .clone();
        assert_eq!(ch.dipole_length(), Some(10.0));
        assert_eq!(ch.dipole_length_display(), "10.0");

        let swapped = TemplateDocument::new("t", ZPolarity::Up, vec![ex((5.0, 0.0), (-5.0, 0.0))]);
        assert_eq!(swapped.channels()[0].dipole_length(), Some(10.0));

        let zero = TemplateDocument::new("t", ZPolarity::Up, vec![ex((3.0, 4.0), (3.0, 4.0))]);
        assert_eq!(zero.channels()[0].dipole_length(), Some(0.0));

        let coil = TemplateDocument::new(
            "t",
            ZPolarity::Up,
            vec![Sensor::coil(CoilKind::Hz, Point::new(1.0, 1.0))],
        );
        assert_eq!(coil.channels()[0].dipole_length(), None);
        assert_eq!(coil.channels()[0].dipole_length_display(), "-");
    }

    #[test]
    fn test_cycle_component_wraps() {
        let mut doc = TemplateDocument::default();
        assert_eq!(doc.cycle_component(1, true), Ok(Component::Ex));
        assert_eq!(doc.cycle_component(1, false), Ok(Component::Off));
        assert_eq!(doc.cycle_component(1, false), Ok(Component::Tx));
        assert!(doc.cycle_component(6, true).is_err());
    }

    #[test]
    fn test_new_truncates_and_pads() {
        let doc = TemplateDocument::new("t", ZPolarity::Up, vec![]);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.channels()[0].component(), Component::Off);

        let many = vec![ex((0.0, 0.0), (1.0, 0.0)); 20];
        let doc = TemplateDocument::new("t", ZPolarity::Up, many);
        assert_eq!(doc.len(), MAX_CHANNELS);
        assert_dense(&doc);
    }

    #[test]
    fn test_display_name_placeholder() {
        let mut doc = TemplateDocument::default();
        doc.set_name("   ");
        assert_eq!(doc.display_name(), PLACEHOLDER_NAME);
        doc.set_name("  Line 7 ");
        assert_eq!(doc.display_name(), "Line 7");
    }

    #[test]
    fn test_name_line_breaks_become_spaces() {
        let mut doc = TemplateDocument::default();
        doc.set_name("north\r\ngrid\nB\rC");
        assert_eq!(doc.name(), "north grid B C");
        let doc = TemplateDocument::new("a\nb", ZPolarity::Up, Vec::new());
        assert_eq!(doc.name(), "a b");
    }

    #[test]
    fn test_component_tags() {
        for c in Component::all() {
            assert_eq!(Component::from_tag(c.as_str()), Some(*c));
        }
        assert_eq!(Component::from_tag("ex"), None);
        assert_eq!(Component::from_tag(""), None);
    }
}
