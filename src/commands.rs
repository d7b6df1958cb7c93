use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use stt_layout::geometry;
use stt_layout::storage;
use stt_layout::template::{serialize, ParsedTemplate};
use stt_layout::Field;

/// Plain-text channel table, the same columns the editor shows.
pub fn report(parsed: &ParsedTemplate) -> String {
    let doc = &parsed.document;
    let layout = geometry::derive(doc);
    let mut out = String::new();

    let _ = writeln!(out, "Template: {}", doc.display_name());
    let _ = writeln!(out, "+Z:       {} ({})", doc.z_polarity(), doc.z_polarity().y_axis_label());
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<5} {:<4} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Ch", "Cmp", "negX", "negY", "posX", "posY", "Dip (m)"
    );
    for ch in doc.channels() {
        let cell = |field: Field| {
            if ch.is_editable(field) {
                format!("{:.3}", ch.coordinate(field))
            } else {
                "n/a".to_string()
            }
        };
        let mut line = format!(
            "{:<5} {:<4} {:>10} {:>10} {:>10} {:>10} {:>10}",
            format!("Ch {}", ch.index()),
            ch.component(),
            cell(Field::NegX),
            cell(Field::NegY),
            cell(Field::PosX),
            cell(Field::PosY),
            ch.dipole_length_display()
        );
        if geometry::is_remote_tx(ch) {
            line.push_str("  remote");
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Extents: |x| <= {:.3} m, |y| <= {:.3} m",
        layout.extents.max_x_abs, layout.extents.max_y_abs
    );
    for d in &parsed.dropped {
        let _ = writeln!(out, "skipped {}", d);
    }
    out
}

pub fn check(file: &Path) -> Result<()> {
    let parsed = storage::read_template_file(file)
        .with_context(|| format!("Failed to read template {}", file.display()))?;
    print!("{}", report(&parsed));
    Ok(())
}

pub fn fmt(file: &Path, output: Option<&Path>) -> Result<()> {
    let parsed = storage::read_template_file(file)
        .with_context(|| format!("Failed to read template {}", file.display()))?;
    let text = serialize(&parsed.document);
    match output {
        Some(out) => {
            fs::write(out, format!("{}\n", text))
                .with_context(|| format!("Failed to write {}", out.display()))?;
            info!(path = %out.display(), "template written");
        }
        None => println!("{}", text),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lists_channels_and_skips() {
        let text = "RX.ZPOSITIVE=DOWN\n\
                    <CH>\nCH.CMP = Tx\nCH.INDEX = 1\nCH.OFFSET.XYZ1 = -3000:0:0\nCH.OFFSET.XYZ2 = 5:0:0\n</CH>\n\
                    <CH>\nCH.CMP = Hy\nCH.INDEX = 2\nCH.OFFSET.XYZ1 = 1:2:0\n</CH>\n\
                    <CH>\nCH.CMP = Qz\n</CH>";
        let parsed = stt_layout::parse(text).unwrap();
        let out = report(&parsed);
        assert!(out.contains("Template: ZEN_template"));
        assert!(out.contains("+Z:       DOWN (Y (right))"));
        assert!(out.contains("3005.0  remote"));
        assert!(out.contains("Ch 2  Hy          n/a        n/a      1.000     -2.000          -"));
        assert!(out.contains("Extents: |x| <= 5.000 m, |y| <= 2.000 m"));
        assert!(out.contains("skipped block 3: unknown component \"Qz\""));
    }

    #[test]
    fn test_fmt_writes_canonical_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.stt");
        let dst = dir.path().join("out.stt");
        fs::write(&src, "<CH>\nCH.CMP=Ex\nCH.OFFSET.XYZ2=2:0\n</CH>").unwrap();
        fmt(&src, Some(&dst)).unwrap();
        let written = fs::read_to_string(&dst).unwrap();
        assert!(written.starts_with("<TEMPLATE>\n\tTEMPLATE.NAME=ZEN_template"));
        assert!(written.contains("CH.OFFSET.XYZ2 = 2.000:0.000:0"));
        assert!(written.ends_with("</TEMPLATE>\n"));
        assert!(check(&dst).is_ok());
        assert!(check(&dir.path().join("none.stt")).is_err());
    }
}
