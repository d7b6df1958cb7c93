use std::fmt;

/// Direction of positive Z. The same flag decides the sign of every Y
/// coordinate written to (or read from) a template file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZPolarity {
    #[default]
    Up,
    Down,
}

impl ZPolarity {
    pub fn y_sign(self) -> f64 {
        match self {
            ZPolarity::Up => 1.0,
            ZPolarity::Down => -1.0,
        }
    }

    /// Local Y -> file Y.
    pub fn to_file_y(self, local_y: f64) -> f64 {
        local_y * self.y_sign()
    }

    /// File Y -> local Y, using the polarity recorded in that file.
    pub fn from_file_y(self, file_y: f64) -> f64 {
        file_y / self.y_sign()
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ZPolarity::Up => "UP",
            ZPolarity::Down => "DOWN",
        }
    }

    /// Case-insensitive match against `UP` / `DOWN`.
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" => Some(ZPolarity::Up),
            "DOWN" => Some(ZPolarity::Down),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ZPolarity::Up => ZPolarity::Down,
            ZPolarity::Down => ZPolarity::Up,
        }
    }

    pub fn y_axis_label(self) -> &'static str {
        match self {
            ZPolarity::Up => "Y (left)",
            ZPolarity::Down => "Y (right)",
        }
    }

    pub fn arrow(self) -> char {
        match self {
            ZPolarity::Up => '↑',
            ZPolarity::Down => '↓',
        }
    }
}

impl fmt::Display for ZPolarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.keyword())
    }
}
