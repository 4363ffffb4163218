//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use chrono::{DateTime, Utc};
use colored::*;
use solvr_domain::{Approach, ApproachStatus, VersionHistory};
use solvr_janitor::{ForgettingReport, SweepReport};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a list of approaches.
    pub fn format_approaches(&self, approaches: &[Approach]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(approaches)?),
            OutputFormat::Table => Ok(self.format_approaches_table(approaches)),
            OutputFormat::Quiet => Ok(ids(approaches.iter())),
        }
    }

    /// Format a single approach.
    pub fn format_approach(&self, approach: &Approach) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(approach)?),
            _ => self.format_approaches(std::slice::from_ref(approach)),
        }
    }

    /// Format a version chain, oldest version first.
    pub fn format_chain(&self, chain: &VersionHistory) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(chain)?),
            OutputFormat::Table => Ok(self.format_chain_table(chain)),
            OutputFormat::Quiet => Ok(ids(chain.history.iter().chain(std::iter::once(&chain.current)))),
        }
    }

    /// Format a sweep report.
    pub fn format_report(&self, report: &SweepReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(format!("{} {} {}", report.warned, report.abandoned, report.dormant)),
            OutputFormat::Table => Ok(self.format_report_table(report)),
        }
    }

    /// Format the result of an archival pass.
    pub fn format_forgetting(&self, report: &ForgettingReport, dry_run: bool) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(format!("{} {} {}", report.processed, report.archived, report.failed)),
            OutputFormat::Table => {
                if dry_run {
                    return Ok(self.info(&format!(
                        "Dry run: {} approach(es) would be archived.",
                        report.processed
                    )));
                }
                let mut lines = vec![self.success(&format!(
                    "Archived {} of {} stale approach(es)",
                    report.archived, report.processed
                ))];
                if report.failed > 0 {
                    lines.push(self.warning(&format!(
                        "{} approach(es) could not be archived and remain stale",
                        report.failed
                    )));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    fn format_approaches_table(&self, approaches: &[Approach]) -> String {
        if approaches.is_empty() {
            return self.colorize("No approaches found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Status", "Latest", "Angle", "Author", "Updated"]);

        for approach in approaches {
            builder.push_record([
                approach.id.to_string(),
                self.status(approach.status),
                latest_mark(approach.is_latest).to_string(),
                approach.angle.clone(),
                format!("{}:{}", approach.author.kind.as_str(), approach.author.id),
                timestamp(approach.updated_at),
            ]);
        }

        render(builder)
    }

    fn format_chain_table(&self, chain: &VersionHistory) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Version", "ID", "Status", "Latest", "Angle", "Created"]);

        let versions = chain.history.iter().chain(std::iter::once(&chain.current));
        for (n, approach) in versions.enumerate() {
            builder.push_record([
                format!("v{}", n + 1),
                approach.id.to_string(),
                self.status(approach.status),
                latest_mark(approach.is_latest).to_string(),
                approach.angle.clone(),
                timestamp(approach.created_at),
            ]);
        }

        let mut out = render(builder);
        if chain.history.is_empty() {
            out.push('\n');
            out.push_str(&self.info("No earlier versions."));
        }
        out
    }

    fn format_report_table(&self, report: &SweepReport) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Step", if report.dry_run { "Candidates" } else { "Changed" }]);
        builder.push_record(["warn".to_string(), report.warned.to_string()]);
        builder.push_record(["abandon".to_string(), report.abandoned.to_string()]);
        builder.push_record(["dormant".to_string(), report.dormant.to_string()]);

        let mut lines = vec![render(builder)];
        if report.dry_run {
            lines.push(self.info("Dry run: nothing was changed."));
        }
        if report.notification_failures > 0 {
            lines.push(self.warning(&format!(
                "{} warning notification(s) failed and will be retried",
                report.notification_failures
            )));
        }
        for failure in &report.failures {
            lines.push(self.error(&format!("{} step failed: {}", failure.step, failure.message)));
        }
        lines.join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn status(&self, status: ApproachStatus) -> String {
        let color = match status {
            ApproachStatus::Succeeded => "green",
            ApproachStatus::Failed => "red",
            ApproachStatus::Stuck => "yellow",
            ApproachStatus::Abandoned => "magenta",
            ApproachStatus::Starting | ApproachStatus::Working => "cyan",
        };
        self.colorize(status.as_str(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn ids<'a>(approaches: impl Iterator<Item = &'a Approach>) -> String {
    approaches.map(|a| a.id.to_string()).collect::<Vec<_>>().join("\n")
}

fn latest_mark(is_latest: bool) -> &'static str {
    if is_latest {
        "yes"
    } else {
        "no"
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}
