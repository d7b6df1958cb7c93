//! Layout facts a renderer needs: pole positions, orientations and extents.
//!
//! All positions stay in the local frame. Coil orientation vectors are
//! expressed in the signed frame (Y multiplied by the Z-polarity sign), the
//! same frame a preview draws in.

use crate::model::{Channel, Component, Point, Sensor, TemplateDocument, ZPolarity};

/// Tx dipoles longer than this are drawn as a single remote source.
pub const REMOTE_TX_THRESHOLD_M: f64 = 1000.0;

/// Smallest span (per axis) a preview should show, in meters.
pub const MIN_SPAN_M: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    /// Horizontal unit vector.
    Horizontal(Point),
    /// Vertical, pointing up or down.
    Vertical(ZPolarity),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Glyph {
    Dipole {
        neg: Point,
        pos: Point,
        length: f64,
        /// `pos - neg`; zero for coincident poles.
        direction: Point,
    },
    /// A long Tx dipole: only the positive pole is shown, with a vector
    /// pointing back toward the negative pole.
    Remote { at: Point, toward: Point, length: f64 },
    Coil { at: Point, orientation: Orientation },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelGeometry {
    pub index: usize,
    pub component: Component,
    pub label: String,
    pub glyph: Glyph,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extents {
    pub max_x_abs: f64,
    pub max_y_abs: f64,
}

impl Extents {
    fn include(&mut self, p: Point) {
        self.max_x_abs = self.max_x_abs.max(p.x.abs());
        self.max_y_abs = self.max_y_abs.max(p.y.abs());
    }

    /// Full width and height of a view centered on the origin.
    pub fn span(&self) -> (f64, f64) {
        (
            (self.max_x_abs * 2.0).max(MIN_SPAN_M),
            (self.max_y_abs * 2.0).max(MIN_SPAN_M),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub channels: Vec<ChannelGeometry>,
    pub extents: Extents,
    pub z_polarity: ZPolarity,
}

impl Layout {
    pub fn y_sign(&self) -> f64 {
        self.z_polarity.y_sign()
    }

    /// Local point -> signed (file/display) frame.
    pub fn signed(&self, p: Point) -> Point {
        Point::new(p.x, self.z_polarity.to_file_y(p.y))
    }
}

pub fn is_remote_tx(ch: &Channel) -> bool {
    ch.component() == Component::Tx
        && ch
            .dipole_length()
            .is_some_and(|len| len > REMOTE_TX_THRESHOLD_M)
}

/// Geometry for one channel; `None` for Off channels.
pub fn channel_geometry(ch: &Channel, z_polarity: ZPolarity) -> Option<ChannelGeometry> {
    let glyph = match *ch.sensor() {
        Sensor::Off => return None,
        Sensor::Dipole { neg, pos, .. } => {
            let length = neg.distance(pos);
            if is_remote_tx(ch) {
                Glyph::Remote {
                    at: pos,
                    toward: pos.to(neg),
                    length,
                }
            } else {
                Glyph::Dipole {
                    neg,
                    pos,
                    length,
                    direction: neg.to(pos),
                }
            }
        }
        Sensor::Coil { at, .. } => {
            let orientation = match ch.component() {
                Component::Hy => Orientation::Horizontal(Point::new(0.0, z_polarity.y_sign())),
                Component::Hz => Orientation::Vertical(z_polarity),
                _ => Orientation::Horizontal(Point::new(1.0, 0.0)),
            };
            Glyph::Coil { at, orientation }
        }
    };

    let label = match ch.component() {
        Component::Hz => format!("{} {}", ch.label(), z_polarity.arrow()),
        _ => ch.label(),
    };

    Some(ChannelGeometry {
        index: ch.index(),
        component: ch.component(),
        label,
        glyph,
    })
}

/// Largest absolute X/Y over the displayed points. A remote Tx only
/// contributes its positive pole.
pub fn extents(doc: &TemplateDocument) -> Extents {
    let mut ext = Extents::default();
    for ch in doc.channels() {
        match ch.sensor() {
            Sensor::Off => {}
            Sensor::Coil { at, .. } => ext.include(*at),
            Sensor::Dipole { neg, pos, .. } => {
                ext.include(*pos);
                if !is_remote_tx(ch) {
                    ext.include(*neg);
                }
            }
        }
    }
    ext
}

pub fn derive(doc: &TemplateDocument) -> Layout {
    let z_polarity = doc.z_polarity();
    Layout {
        channels: doc
            .channels()
            .iter()
            .filter_map(|ch| channel_geometry(ch, z_polarity))
            .collect(),
        extents: extents(doc),
        z_polarity,
    }
}
