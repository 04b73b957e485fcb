//! Output formatting for JSON, JSON Lines and plain text.
//!
//! Provides a writer that can output single items or batches. JSON Lines
//! and text are streamable; JSON wraps batches in an array.

use serde::Serialize;
use std::io::{self, Write};

/// Items with a one-line plain text rendering.
pub trait TextRecord {
    /// The line to emit, without a trailing newline.
    fn text_line(&self) -> String;
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
    /// One `TextRecord::text_line` per item
    Text,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            "text" | "txt" => Some(Self::Text),
            _ => None,
        }
    }

    /// Whether items can be written as they arrive.
    pub fn is_streaming(self) -> bool {
        !matches!(self, Self::Json)
    }
}

/// A writer that serializes items in the selected format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// `pretty` only affects the JSON format.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write a single item.
    pub fn write<T: Serialize + TextRecord>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            OutputFormat::Json if self.pretty => {
                serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
            }
            OutputFormat::Json | OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
            }
            OutputFormat::Text => {
                self.writer.write_all(item.text_line().as_bytes())?;
            }
        }
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write multiple items.
    ///
    /// For JSON format, writes a JSON array; otherwise one item per line.
    pub fn write_all<T: Serialize + TextRecord>(&mut self, items: &[T]) -> io::Result<()> {
        if self.format != OutputFormat::Json {
            return items.iter().try_for_each(|item| self.write(item));
        }

        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, items).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, items).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.items_written += items.len();
        Ok(())
    }

    /// Get the number of items written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct TestItem {
        name: String,
        value: i32,
    }

    impl TextRecord for TestItem {
        fn text_line(&self) -> String {
            format!("{}={}", self.name, self.value)
        }
    }

    fn items() -> Vec<TestItem> {
        vec![
            TestItem {
                name: "a".to_string(),
                value: 1,
            },
            TestItem {
                name: "b".to_string(),
                value: 2,
            },
        ]
    }

    #[test]
    fn test_write_json() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, false);
        writer.write(&items()[0]).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output, "{\"name\":\"a\",\"value\":1}\n");
    }

    #[test]
    fn test_write_jsonl() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::JsonLines, true);
        for item in &items() {
            writer.write(item).unwrap();
        }
        assert_eq!(writer.items_written(), 2);

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.trim().split('\n').collect();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_write_all_json_array() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, false);
        writer.write_all(&items()).unwrap();
        assert_eq!(writer.items_written(), 2);

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.starts_with('['));
        assert!(output.trim().ends_with(']'));
    }

    #[test]
    fn test_write_all_text() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Text, false);
        writer.write_all(&items()).unwrap();

        assert_eq!(String::from_utf8(buffer).unwrap(), "a=1\nb=2\n");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("jsonl"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("JSONL"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::parse("invalid"), None);
        assert!(!OutputFormat::Json.is_streaming());
        assert!(OutputFormat::Text.is_streaming());
    }
}
