use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::StorageError;
use crate::model::{TemplateDocument, PLACEHOLDER_NAME};
use crate::template::{serialize, ParsedTemplate};

pub const EXTENSION: &str = "stt";

/// File stem for a template name: every run of characters outside
/// `[A-Za-z0-9_.-]` becomes a single `_`.
pub fn safe_file_stem(name: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() { PLACEHOLDER_NAME } else { name };

    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

pub fn template_path(doc: &TemplateDocument, dir: &Path) -> PathBuf {
    dir.join(format!("{}.{}", safe_file_stem(doc.display_name()), EXTENSION))
}

/// Writes `<safe name>.stt` into `dir` and returns the written path.
pub fn save_template(doc: &TemplateDocument, dir: &Path) -> Result<PathBuf, StorageError> {
    let path = template_path(doc, dir);
    fs::write(&path, serialize(doc)).map_err(|source| StorageError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "template saved");
    Ok(path)
}

/// Reads `path` and loads it into `doc`. The document only changes when the
/// file holds at least one valid channel.
pub fn load_template_file(
    doc: &mut TemplateDocument,
    path: &Path,
) -> Result<ParsedTemplate, StorageError> {
    let text = read_text(path)?;
    doc.load_template(&text)
        .map_err(|source| StorageError::Template {
            path: path.to_path_buf(),
            source,
        })
}

/// Parses `path` without touching any existing document.
pub fn read_template_file(path: &Path) -> Result<ParsedTemplate, StorageError> {
    let text = read_text(path)?;
    crate::template::parse(&text).map_err(|source| StorageError::Template {
        path: path.to_path_buf(),
        source,
    })
}

fn read_text(path: &Path) -> Result<String, StorageError> {
    // Lossy so stray Latin-1 bytes in vendor files do not block a load
    let bytes = fs::read(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use crate::model::{Component, Field};

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("ZEN_template"), "ZEN_template");
        assert_eq!(safe_file_stem("Line 3 / site#2"), "Line_3_site_2");
        assert_eq!(safe_file_stem("a.b-c"), "a.b-c");
        assert_eq!(safe_file_stem("   "), PLACEHOLDER_NAME);
        assert_eq!(safe_file_stem("Über"), "_ber");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = TemplateDocument::default();
        doc.set_name("north grid");
        doc.set_coordinate(0, Field::NegX, -25.0).unwrap();
        doc.set_coordinate(0, Field::PosX, 25.0).unwrap();
        doc.set_component(1, Component::Hz).unwrap();

        let path = save_template(&doc, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("north_grid.stt"));

        let mut loaded = TemplateDocument::default();
        let parsed = load_template_file(&mut loaded, &path).unwrap();
        assert!(parsed.dropped.is_empty());
        assert_eq!(loaded.name(), "north grid");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.channels()[0].dipole_length(), Some(50.0));
        assert_eq!(loaded.channels()[1].component(), Component::Hz);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = TemplateDocument::default();
        let err = load_template_file(&mut doc, &dir.path().join("nope.stt")).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
        assert_eq!(doc, TemplateDocument::default());
    }

    #[test]
    fn test_load_empty_template_keeps_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.stt");
        fs::write(&path, "<TEMPLATE>\n</TEMPLATE>\n").unwrap();

        let mut doc = TemplateDocument::default();
        doc.set_name("mine");
        let err = load_template_file(&mut doc, &path).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Template {
                source: TemplateError::NoChannels,
                ..
            }
        ));
        assert_eq!(doc.name(), "mine");
        assert!(read_template_file(&path).is_err());
    }
}
