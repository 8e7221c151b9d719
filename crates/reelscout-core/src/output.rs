//! JSON / JSONL output for batch reports and match results.
//!
//! serde_json writes UTF-8 with non-ASCII text preserved, matching the
//! persisted batch output format.

use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// A writer that serializes items to JSON or JSONL.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
}

impl<W: Write> OutputWriter<W> {
    /// `pretty` only affects the JSON format — JSONL is always one compact
    /// object per line.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
        }
    }

    /// Write a single item (one JSON document, or one JSONL line).
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            OutputFormat::Json if self.pretty => {
                serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
            }
            _ => {
                serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
            }
        }
        writeln!(self.writer)
    }

    /// Write a slice of items: a JSON array, or one JSONL line per item.
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.write(&items),
            OutputFormat::JsonLines => {
                for item in items {
                    self.write(item)?;
                }
                Ok(())
            }
        }
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Serialize an item to a JSON string.
pub fn to_json<T: Serialize>(item: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(item)
    } else {
        serde_json::to_string(item)
    }
}

/// Persist an item as an indented, non-ASCII-preserving JSON file.
pub fn save_json<T: Serialize>(item: &T, path: &Path) -> crate::error::Result<()> {
    let json = serde_json::to_string_pretty(item)?;
    std::fs::write(path, json)?;
    tracing::info!("Results saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BatchReport, ItemReport};

    fn sample_report() -> BatchReport {
        BatchReport {
            items: vec![
                ItemReport::success("/data/clip_1.mp4", "A makeup tutorial. #美妆"),
                ItemReport::failure("/data/clip_2.mp4", "Timeout after 300000ms"),
            ],
        }
    }

    #[test]
    fn test_write_json_array() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, false);
        writer.write_all(&sample_report().items).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.starts_with('['));
        assert!(output.contains("\"media\":\"/data/clip_1.mp4\""));
        assert!(output.contains("美妆"));
    }

    #[test]
    fn test_write_jsonl_one_line_per_item() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::JsonLines, false);
        writer.write_all(&sample_report().items).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.trim().split('\n').collect();
        assert_eq!(lines.len(), 2);
        let parsed: ItemReport = serde_json::from_str(lines[1]).unwrap();
        assert!(!parsed.success);
    }

    #[test]
    fn test_pretty_json_is_indented() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, true);
        writer.write(&sample_report()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("\n  "));
    }

    #[test]
    fn test_save_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        save_json(&sample_report(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        // Non-ASCII preserved on disk
        assert!(content.contains("美妆"));
        let parsed: BatchReport = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.succeeded(), 1);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("JSONL"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("ndjson"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }
}
