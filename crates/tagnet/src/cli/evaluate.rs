//! The `tagnet evaluate` command.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tagnet_core::{evaluate_saved_model, Config, EvaluationReport, OutputFormat, OutputWriter};

use super::{expand_path, DatasetArgs};

/// Report formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportFormat {
    /// Single JSON report object
    Json,
    /// One mismatch per line, then a summary line
    Jsonl,
}

impl From<ReportFormat> for OutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => OutputFormat::Json,
            ReportFormat::Jsonl => OutputFormat::JsonLines,
        }
    }
}

/// Arguments for the `evaluate` command.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Report file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ReportFormat,
}

/// Execute the evaluate command.
pub async fn execute(args: EvaluateArgs, mut config: Config) -> anyhow::Result<()> {
    args.dataset.apply(&mut config)?;

    let epochs = config.training.epochs;
    let report = evaluate_saved_model(&config, epochs).await?;

    match &args.output {
        Some(path) => {
            let path = expand_path(path);
            let file = File::create(&path)?;
            write_report(BufWriter::new(file), args.format, &report)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => write_report(std::io::stdout().lock(), args.format, &report)?,
    }
    Ok(())
}

fn write_report<W: Write>(
    writer: W,
    format: ReportFormat,
    report: &EvaluationReport,
) -> std::io::Result<()> {
    let mut writer = OutputWriter::new(writer, format.into(), true);
    writer.write_report(report)?;
    writer.flush()?;
    tracing::debug!("Wrote {} report records", writer.items_written());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> EvaluationReport {
        EvaluationReport {
            examples: 2,
            mismatches: Vec::new(),
            loss: 0.1,
            accuracy: 1.0,
        }
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let file = File::create(&path).unwrap();
        write_report(BufWriter::new(file), ReportFormat::Json, &report()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["examples"], 2);
        assert_eq!(value["accuracy"], 1.0);
    }

    #[test]
    fn test_jsonl_report_is_line_delimited() {
        let mut buffer = Vec::new();
        write_report(&mut buffer, ReportFormat::Jsonl, &report()).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("\"type\":\"summary\""));
    }
}
