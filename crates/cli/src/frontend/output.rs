use std::io::{self, Write};

use engine::Summary;

/// Writes the end-of-run summary, as pretty JSON or as text.
pub(crate) fn write_summary<W: Write + ?Sized>(
    out: &mut W,
    summary: &Summary,
    json: bool,
) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, summary)?;
        writeln!(out)
    } else {
        writeln!(out, "{summary}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::Mode;

    #[test]
    fn text_summary_names_the_mode() {
        let mut summary = Summary::new(Mode::Cleanup, true);
        summary.removals = 4;
        let mut out = Vec::new();
        write_summary(&mut out, &summary, false).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("cleanup summary (dry run):"));
        assert!(text.contains("entries removed: 4"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn json_summary_is_one_document() {
        let mut summary = Summary::new(Mode::Migrate, false);
        summary.additions = 2;
        let mut out = Vec::new();
        write_summary(&mut out, &summary, true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["mode"], "migrate");
        assert_eq!(value["additions"], 2);
        assert_eq!(value["cancelled"], false);
    }
}
