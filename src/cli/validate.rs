use std::path::PathBuf;

use clap::Parser;
use pathway::storage::{Report, batch};
use serde_json::json;
use tracing::instrument;

use super::terminal::{Colorize, Mark};

#[derive(Debug, Parser)]
#[command(about = "Validate pathway documents")]
pub struct Validate {
    /// Files or directories to check
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Summary,
}

impl Validate {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let mut report = Report::default();
        for path in &self.paths {
            let scanned = batch::scan(path);
            report.summaries.extend(scanned.summaries);
            report.failures.extend(scanned.failures);
        }

        if !self.quiet {
            match self.output {
                OutputFormat::Table => Self::output_table(&report),
                OutputFormat::Json => Self::output_json(&report)?,
                OutputFormat::Summary => Self::output_summary(&report),
            }
        }

        // Exit with appropriate code
        if !report.is_clean() {
            std::process::exit(2);
        }
        Ok(())
    }

    fn output_table(report: &Report) {
        for summary in &report.summaries {
            let path = summary.path.display().to_string();
            if summary.is_valid() {
                println!("{} {path}", Mark::Pass);
                continue;
            }
            println!("{} {path}", Mark::Warn);
            for problem in &summary.problems {
                println!("    {}", problem.dim());
            }
        }
        for failure in &report.failures {
            println!("{} {}", Mark::Fail, failure.path.display());
            println!("    {}", failure.error.error());
        }
        Self::output_summary(report);
    }

    fn output_json(report: &Report) -> anyhow::Result<()> {
        let failures: Vec<_> = report
            .failures
            .iter()
            .map(|failure| {
                json!({
                    "path": failure.path,
                    "error": failure.error.to_string(),
                })
            })
            .collect();

        let output = json!({
            "clean": report.is_clean(),
            "documents": report.summaries,
            "failures": failures,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_summary(report: &Report) {
        let invalid = report.summaries.iter().filter(|s| !s.is_valid()).count();
        let valid = report.summaries.len() - invalid;
        let unreadable = report.failures.len();

        let line = format!("{valid} valid, {invalid} invalid, {unreadable} unreadable");
        if report.is_clean() {
            println!("{}", line.success());
        } else {
            println!("{}", line.warning());
        }
    }
}
