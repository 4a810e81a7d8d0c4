//! Terminal output: progress spinner and result reporting.
//!
//! Uses `indicatif` for the spinner and `console` for colour. Only the
//! report (table or JSON) goes to stdout. The spinner, status verdicts and
//! log lines share stderr, and logs are written through the spinner so the
//! two never overwrite each other.

use std::io::{self, Write};

use console::Style;
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
use serde::Serialize;
use tracing_subscriber::fmt::MakeWriter;

use crate::error::CriticalityError;
use crate::orchestrator::RunOutcome;
use crate::scoring::{AssetClass, ScoredRecord};

/// Spinner shown while asset types are being queried and scored.
pub struct RunProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl RunProgress {
    /// Builds the spinner without drawing it, so logging can be wired
    /// through [`RunProgress::log_writer`] before the run starts.
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner().with_finish(ProgressFinish::AndClear);
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    pub fn start(&self, asset_types: &[String]) {
        self.pb.set_message(format!(
            "acquiring criticality data for {}",
            asset_types.join(", ")
        ));
        self.pb
            .enable_steady_tick(std::time::Duration::from_millis(100));
    }

    pub fn log_writer(&self) -> LogWriter {
        LogWriter {
            pb: self.pb.clone(),
        }
    }

    /// Clears the spinner and prints a one-line verdict on stderr.
    pub fn complete(&self, outcome: &RunOutcome) {
        self.pb.finish_and_clear();
        match outcome {
            RunOutcome::NoData => {
                eprintln!("  {} No criticality data was found", self.yellow.apply_to("-"));
            }
            RunOutcome::DryRun { records } => {
                eprintln!(
                    "  {} Scored {} assets (dry run, nothing uploaded)",
                    self.yellow.apply_to("○"),
                    records.len()
                );
            }
            RunOutcome::Uploaded { summary, .. } => {
                eprintln!(
                    "  {} Ingested {} scores (job {}, {})",
                    self.green.apply_to("✓"),
                    summary.entity_count,
                    summary.job_id,
                    summary.status
                );
            }
        }
    }

    pub fn fail(&self, err: &CriticalityError) {
        self.pb.finish_and_clear();
        let marker = if err.is_validation() {
            self.yellow.apply_to("!")
        } else {
            self.red.apply_to("✗")
        };
        eprintln!("  {marker} {err}");
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// stderr writer for log output that hides the spinner while a line is written.
#[derive(Clone)]
pub struct LogWriter {
    pb: ProgressBar,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pb.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Writes the scored records to `out`: pretty JSON when `json` is set,
/// otherwise a table with the highest score first.
pub fn write_report<W: Write>(
    out: &mut W,
    records: &[ScoredRecord],
    json: bool,
) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, &CriticalityOutput::from_records(records))?;
        writeln!(out)?;
        return Ok(());
    }

    let header = Style::new().bold();
    let mut sorted: Vec<&ScoredRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.criticality_score.cmp(&a.criticality_score));

    writeln!(out)?;
    writeln!(
        out,
        "{}",
        header.apply_to(format!(
            "{:<32} {:<20} {:>6} {:>6} {:>10}",
            "ASSET", "CLASS", "DEPS", "AGE", "SCORE"
        ))
    )?;
    for record in sorted {
        let name = if record.display_name.is_empty() {
            record.id.as_str()
        } else {
            record.display_name.as_str()
        };
        writeln!(
            out,
            "{:<32} {:<20} {:>6} {:>6} {:>10}",
            truncate(name, 32),
            truncate(&record.class.to_string(), 20),
            record.dependency_count,
            record.age_in_days,
            record.criticality_score
        )?;
    }
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// JSON report shape: `{"results": [...]}` without internal ids.
#[derive(Debug, Serialize)]
pub struct CriticalityOutput<'a> {
    pub results: Vec<CriticalityResult<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalityResult<'a> {
    pub asset_name: &'a str,
    pub asset_class: &'a AssetClass,
    pub dependencies: i64,
    pub age_in_days: i64,
    pub criticality_score: i64,
}

impl<'a> CriticalityOutput<'a> {
    pub fn from_records(records: &'a [ScoredRecord]) -> Self {
        Self {
            results: records
                .iter()
                .map(|record| CriticalityResult {
                    asset_name: &record.display_name,
                    asset_class: &record.class,
                    dependencies: record.dependency_count,
                    age_in_days: record.age_in_days,
                    criticality_score: record.criticality_score,
                })
                .collect(),
        }
    }
}
