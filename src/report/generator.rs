//! Markdown and JSON rendering.
//!
//! This module turns analysis outputs into Markdown tables for the
//! terminal, and wraps them with run metadata when writing a report.

use crate::comparison::PeriodComparison;
use crate::models::{Chart, Frame, Output, PeriodDefinition, SeriesPoint};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Shown instead of tables when a valid comparison matched no rows.
pub const EMPTY_COMPARISON: &str = "No sales data for the selected periods and years.";

const NO_DATA: &str = "No data.\n";

/// Information about the run that produced a report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub dataset_source: String,
    pub records: usize,
    pub analysis: String,
    pub generated_at: DateTime<Utc>,
}

/// A rendered result plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub output: Output,
}

/// Render a single output as Markdown.
pub fn render_markdown(output: &Output) -> String {
    match output {
        Output::Chart(chart) => generate_chart_section(chart),
        Output::Comparison(comparison) => generate_comparison_section(comparison),
        Output::Answer { question, answer } => {
            format!("**Question:** {}\n\n**Answer:** {}\n", question, answer)
        }
        Output::Periods(periods) => generate_periods_list(periods),
        Output::Years(years) => {
            let mut section = String::from("## Years\n\n");
            for year in years {
                section.push_str(&format!("- {}\n", year));
            }
            section
        }
        Output::Message(message) => format!("{}\n", message),
    }
}

/// Render a single output as pretty JSON.
pub fn render_json(output: &Output) -> Result<String> {
    serde_json::to_string_pretty(output).map_err(Into::into)
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Sales Dashboard Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&render_markdown(&report.output));
    output.push('\n');
    output.push_str(&generate_footer());

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** {}\n", metadata.dataset_source));
    section.push_str(&format!("- **Records:** {}\n", metadata.records));
    section.push_str(&format!("- **Analysis:** {}\n", metadata.analysis));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

fn generate_chart_section(chart: &Chart) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", chart.title));
    section.push_str(&format!("*{} chart*\n\n", chart.kind));

    if let Some(points) = chart.points() {
        if points.is_empty() {
            section.push_str(NO_DATA);
        } else {
            section.push_str(&series_table(points));
        }
    } else if let Some(frame) = chart.as_frame() {
        if frame.is_empty() {
            section.push_str(NO_DATA);
        } else {
            section.push_str(&frame_table(frame));
        }
    }

    section
}

fn generate_comparison_section(comparison: &PeriodComparison) -> String {
    if comparison.is_empty() {
        return format!("{}\n", EMPTY_COMPARISON);
    }

    let mut section = String::new();

    section.push_str(&generate_chart_section(&comparison.chart()));
    section.push('\n');
    section.push_str("## Summary\n\n");
    section.push_str(&frame_table(&comparison.summary_frame()));
    section.push_str(&format!(
        "\n**Total sales:** {}\n",
        format_value(Some(comparison.total_sales()))
    ));

    section
}

fn generate_periods_list(periods: &[PeriodDefinition]) -> String {
    let mut section = String::from("## Periods\n\n");
    for period in periods {
        section.push_str(&format!("- {}\n", period));
    }
    section
}

fn series_table(points: &[SeriesPoint]) -> String {
    let mut table = String::new();

    table.push_str("| Label | Value |\n");
    table.push_str("|:---|---:|\n");
    for point in points {
        table.push_str(&format!(
            "| {} | {} |\n",
            point.label,
            format_value(Some(point.value))
        ));
    }

    table
}

fn frame_table(frame: &Frame) -> String {
    let mut table = String::new();

    table.push_str("| |");
    for column in &frame.columns {
        table.push_str(&format!(" {} |", column));
    }
    table.push('\n');

    table.push_str("|:---|");
    for _ in &frame.columns {
        table.push_str("---:|");
    }
    table.push('\n');

    for row in &frame.rows {
        table.push_str(&format!("| {} |", row.label));
        for value in &row.values {
            table.push_str(&format!(" {} |", format_value(*value)));
        }
        table.push('\n');
    }

    table
}

/// Whole numbers print without decimals; absent cells print as `-`.
fn format_value(value: Option<f64>) -> String {
    match value {
        None => "-".to_string(),
        Some(v) if v == 0.0 => "0".to_string(),
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{:.0}", v),
        Some(v) => format!("{:.2}", v),
    }
}

fn generate_footer() -> String {
    format!(
        "---\n\n*Report generated by salesdash v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}
