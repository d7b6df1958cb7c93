//! Channel layout model and `.stt` template codec for EM/MT receivers.
//!
//! The library is pure computation over an explicitly owned
//! [`TemplateDocument`]; the `sttlayout` binary wraps it in a terminal editor.

pub mod error;
pub mod geometry;
pub mod model;
pub mod storage;
pub mod template;

pub use error::{EditError, StorageError, TemplateError};
pub use geometry::{derive, Layout};
pub use model::{Channel, Component, Field, Point, Sensor, TemplateDocument, ZPolarity};
pub use template::{parse, serialize, ParsedTemplate};
