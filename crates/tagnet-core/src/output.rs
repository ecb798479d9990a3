//! Report serialization as JSON or JSON Lines.
//!
//! JSON writes the whole [`EvaluationReport`] as one object. JSON Lines
//! writes one `mismatch` record per line followed by a single `summary`
//! record, so large evaluations can be streamed through line tools.

use serde::Serialize;
use std::io::{self, Write};

use crate::evaluate::{EvaluationReport, Mismatch};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON document
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

/// One line of a JSON Lines report.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReportLine<'a> {
    Mismatch(&'a Mismatch),
    Summary {
        examples: usize,
        mismatches: usize,
        loss: f32,
        accuracy: f32,
    },
}

/// Serializes values to an underlying writer in the chosen format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// `pretty` only affects [`OutputFormat::Json`].
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write one value followed by a newline.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        if self.pretty && self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write an evaluation report in the writer's format.
    pub fn write_report(&mut self, report: &EvaluationReport) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.write(report),
            OutputFormat::JsonLines => {
                for mismatch in &report.mismatches {
                    self.write(&ReportLine::Mismatch(mismatch))?;
                }
                self.write(&ReportLine::Summary {
                    examples: report.examples,
                    mismatches: report.mismatches.len(),
                    loss: report.loss,
                    accuracy: report.accuracy,
                })
            }
        }
    }

    /// Number of JSON values written so far.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn report() -> EvaluationReport {
        EvaluationReport {
            examples: 3,
            mismatches: vec![
                Mismatch {
                    index: 0,
                    name: "pidgey".to_string(),
                    source: PathBuf::from("evaluate/images/pidgey.png"),
                    predicted: Some("Normal".to_string()),
                    actual: Some("Flying".to_string()),
                },
                Mismatch {
                    index: 2,
                    name: "onix".to_string(),
                    source: PathBuf::from("evaluate/images/onix.jpg"),
                    predicted: Some("Ground".to_string()),
                    actual: Some("Rock".to_string()),
                },
            ],
            loss: 1.25,
            accuracy: 1.0 / 3.0,
        }
    }

    #[test]
    fn test_report_json_is_single_document() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, true);
        writer.write_report(&report()).unwrap();
        assert_eq!(writer.items_written(), 1);

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["examples"], 3);
        assert_eq!(value["mismatches"][1]["name"], "onix");
        assert_eq!(value["mismatches"][1]["actual"], "Rock");
    }

    #[test]
    fn test_report_jsonl_mismatches_then_summary() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::JsonLines, true);
        writer.write_report(&report()).unwrap();
        assert_eq!(writer.items_written(), 3);

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["type"], "mismatch");
        assert_eq!(lines[0]["name"], "pidgey");
        assert_eq!(lines[2]["type"], "summary");
        assert_eq!(lines[2]["mismatches"], 2);
    }

    #[test]
    fn test_report_jsonl_without_mismatches() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::JsonLines, false);
        let mut clean = report();
        clean.mismatches.clear();
        writer.write_report(&clean).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("\"type\":\"summary\""));
    }
}
