//! Period comparison engine.
//!
//! Filters the sales table by year and by a period's month set, then builds
//! per-(period, year) records, a period×year pivot and per-period summary
//! statistics.
//!
//! A (period, year) combination with no matching rows produces *no record*.
//! It is not reported as zero sales, and its pivot cell stays `None`.
//! Consumers must read a missing combination as "no data".

use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::models::{Chart, ChartKind, Frame, FrameRow, SalesRecord, SeriesPoint};
use crate::periods::PeriodRegistry;
use chrono::Datelike;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Sales for one (period, year) pair that had at least one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRecord {
    pub period: String,
    pub year: i32,
    /// Sum of Sales.
    pub sales: f64,
    /// Mean of Sales.
    pub avg_sales: f64,
}

impl PeriodRecord {
    /// Composite row label, e.g. "Q1 2023".
    pub fn label(&self) -> String {
        format!("{} {}", self.period, self.year)
    }
}

/// One pivot row, keyed by the composite "<period> <year>" label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub label: String,
    /// One cell per entry in `PivotTable::years`; `None` when no record exists.
    pub cells: Vec<Option<f64>>,
}

/// Summed sales reshaped with period/year labels as rows and years as columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PivotTable {
    pub years: Vec<i32>,
    pub rows: Vec<PivotRow>,
}

impl PivotTable {
    fn from_records(records: &[PeriodRecord]) -> Self {
        let years: Vec<i32> = records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut by_label: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
        for record in records {
            let cells = by_label
                .entry(record.label())
                .or_insert_with(|| vec![None; years.len()]);
            if let Some(col) = years.iter().position(|y| *y == record.year) {
                cells[col] = Some(record.sales);
            }
        }

        Self {
            years,
            rows: by_label
                .into_iter()
                .map(|(label, cells)| PivotRow { label, cells })
                .collect(),
        }
    }

    /// Cell value, `None` when the combination had no data.
    #[cfg(test)]
    pub fn get(&self, label: &str, year: i32) -> Option<f64> {
        let col = self.years.iter().position(|y| *y == year)?;
        self.rows
            .iter()
            .find(|r| r.label == label)
            .and_then(|r| r.cells[col])
    }

    pub fn to_frame(&self) -> Frame {
        Frame {
            columns: self.years.iter().map(|y| y.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| FrameRow {
                    label: r.label.clone(),
                    values: r.cells.clone(),
                })
                .collect(),
        }
    }
}

/// Statistics for one period across all selected years, rounded to 2 places.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub period: String,
    pub sales_sum: f64,
    /// Mean of the per-year sums.
    pub sales_mean: f64,
    /// Number of (period, year) records.
    pub count: usize,
    /// Mean of the per-year average sale.
    pub avg_sales_mean: f64,
}

/// Column labels of the summary table.
pub const SUMMARY_COLUMNS: [&str; 4] = ["Sales sum", "Sales mean", "Sales count", "AvgSales mean"];

/// Result of a period comparison.
///
/// Empty when the selection was valid but matched no rows at all; that is
/// distinct from a rejected (empty) selection, which never produces a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub records: Vec<PeriodRecord>,
    pub pivot: PivotTable,
    pub summary: Vec<PeriodSummary>,
}

impl PeriodComparison {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_sales(&self) -> f64 {
        self.records.iter().map(|r| r.sales).sum()
    }

    #[cfg(test)]
    pub fn summary_for(&self, period: &str) -> Option<&PeriodSummary> {
        self.summary.iter().find(|s| s.period == period)
    }

    /// Pivot as a bar chart.
    pub fn chart(&self) -> Chart {
        Chart::frame("Sales by Period and Year", ChartKind::Bar, self.pivot.to_frame())
    }

    pub fn summary_frame(&self) -> Frame {
        Frame {
            columns: SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: self
                .summary
                .iter()
                .map(|s| FrameRow {
                    label: s.period.clone(),
                    values: vec![
                        Some(s.sales_sum),
                        Some(s.sales_mean),
                        Some(s.count as f64),
                        Some(s.avg_sales_mean),
                    ],
                })
                .collect(),
        }
    }
}

/// Compare sales across the selected periods and years.
///
/// Both selections must be non-empty and every period must be known to the
/// registry. Duplicate selections are ignored.
pub fn compare_periods(
    dataset: &Dataset,
    registry: &PeriodRegistry,
    periods: &[String],
    years: &[i32],
) -> Result<PeriodComparison> {
    if periods.is_empty() || years.is_empty() {
        return Err(DashboardError::validation(
            "Please select at least one period and one year.",
        ));
    }

    let periods = dedup(periods);
    let years = dedup(years);

    let resolved = periods
        .iter()
        .map(|name| {
            registry
                .resolve(name)
                .ok_or_else(|| {
                    DashboardError::validation(format!(
                        "Unknown period '{}'. Available: {}",
                        name,
                        registry.names().join(", ")
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::new();

    for year in &years {
        let year_rows: Vec<&SalesRecord> = dataset
            .records()
            .iter()
            .filter(|r| r.year() == *year)
            .collect();

        for period in &resolved {
            let sales: Vec<f64> = year_rows
                .iter()
                .filter(|r| period.contains(&r.month_id()))
                .map(|r| r.sales)
                .collect();

            if sales.is_empty() {
                debug!("No rows for {} {}, skipping", period.name, year);
                continue;
            }

            let total: f64 = sales.iter().sum();
            records.push(PeriodRecord {
                period: period.name.clone(),
                year: *year,
                sales: total,
                avg_sales: total / sales.len() as f64,
            });
        }
    }

    debug!("Period comparison produced {} records", records.len());

    if records.is_empty() {
        return Ok(PeriodComparison::default());
    }

    let pivot = PivotTable::from_records(&records);
    let summary = summarize(&records);

    Ok(PeriodComparison {
        records,
        pivot,
        summary,
    })
}

fn summarize(records: &[PeriodRecord]) -> Vec<PeriodSummary> {
    let mut grouped: BTreeMap<&str, Vec<&PeriodRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.period.as_str()).or_default().push(record);
    }

    grouped
        .into_iter()
        .map(|(period, group)| {
            let count = group.len();
            let sales_sum: f64 = group.iter().map(|r| r.sales).sum();
            let avg_sum: f64 = group.iter().map(|r| r.avg_sales).sum();
            PeriodSummary {
                period: period.to_string(),
                sales_sum: round2(sales_sum),
                sales_mean: round2(sales_sum / count as f64),
                count,
                avg_sales_mean: round2(avg_sum / count as f64),
            }
        })
        .collect()
}

/// Total sales per calendar month, from the first month with data to the
/// last. Months in between without rows are reported as zero.
pub fn monthly_sales(dataset: &Dataset) -> Chart {
    let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in dataset.records() {
        *by_month
            .entry((record.date.year(), record.date.month()))
            .or_default() += record.sales;
    }

    let mut points = Vec::new();
    if let (Some(&first), Some(&last)) = (by_month.keys().next(), by_month.keys().last()) {
        let (mut year, mut month) = first;
        while (year, month) <= last {
            let total = by_month.get(&(year, month)).copied().unwrap_or(0.0);
            points.push(SeriesPoint::new(format!("{}-{:02}", year, month), total));

            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }
    }

    Chart::series("Monthly Sales", ChartKind::Line, points)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn dedup<T: PartialEq + Clone>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}
