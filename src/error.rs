use std::path::PathBuf;

use thiserror::Error;

use crate::model::{Component, Field};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("no valid CH blocks found in template")]
    NoChannels,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("no channel at row {row} (document has {count})")]
    NoSuchRow { row: usize, count: usize },

    #[error("{field} is not editable for a {component} channel")]
    NotEditable { component: Component, field: Field },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },
}
