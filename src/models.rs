//! Data models for the sales dashboard.
//!
//! This module contains the core data structures shared across the
//! application: loaded sales rows, period definitions, and the chart-ready
//! outputs handed to the rendering layer.

use crate::comparison::PeriodComparison;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One row of the sales table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// Timestamp of the sale.
    #[serde(rename = "Date", deserialize_with = "deserialize_date")]
    pub date: NaiveDateTime,
    /// Sale amount.
    #[serde(rename = "Sales")]
    pub sales: f64,
    /// Product category label.
    #[serde(rename = "Product")]
    pub product: String,
    /// Region label.
    #[serde(rename = "Region")]
    pub region: String,
    /// Customer age in years.
    #[serde(rename = "Customer_Age")]
    pub customer_age: f64,
    /// Customer gender label.
    #[serde(rename = "Customer_Gender")]
    pub customer_gender: String,
    /// Customer satisfaction score.
    #[serde(rename = "Customer_Satisfaction")]
    pub customer_satisfaction: f64,
}

impl SalesRecord {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Month of the sale as a two-digit identifier ("01".."12").
    pub fn month_id(&self) -> String {
        format!("{:02}", self.date.month())
    }
}

/// Date formats accepted in the `Date` column.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse a calendar timestamp from the dataset's `Date` column.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_date(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized date '{}'", s)))
}

/// A named set of calendar months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDefinition {
    pub name: String,
    pub months: BTreeSet<String>,
}

impl PeriodDefinition {
    pub fn new<I, S>(name: impl Into<String>, months: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            months: months.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, month_id: &str) -> bool {
        self.months.contains(month_id)
    }
}

impl fmt::Display for PeriodDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let months: Vec<&str> = self.months.iter().map(String::as_str).collect();
        write!(f, "{}: {}", self.name, months.join(", "))
    }
}

/// How the rendering surface should draw a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Histogram,
    Table,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Line => write!(f, "line"),
            ChartKind::Bar => write!(f, "bar"),
            ChartKind::Histogram => write!(f, "histogram"),
            ChartKind::Table => write!(f, "table"),
        }
    }
}

/// A labelled value in a single series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// One row of a frame. `None` cells mean "no data", not zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRow {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// A labelled two-dimensional table of optional values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<FrameRow>,
}

impl Frame {
    /// Look up a cell by row and column label.
    #[cfg(test)]
    pub fn cell(&self, row: &str, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|r| r.label == row)
            .and_then(|r| r.values.get(col).copied().flatten())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Data carried by a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartData {
    Series(Vec<SeriesPoint>),
    Frame(Frame),
}

/// A chart-ready result of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub kind: ChartKind,
    pub data: ChartData,
}

impl Chart {
    pub fn series(title: impl Into<String>, kind: ChartKind, points: Vec<SeriesPoint>) -> Self {
        Self {
            title: title.into(),
            kind,
            data: ChartData::Series(points),
        }
    }

    pub fn frame(title: impl Into<String>, kind: ChartKind, frame: Frame) -> Self {
        Self {
            title: title.into(),
            kind,
            data: ChartData::Frame(frame),
        }
    }

    /// Series points, if this chart holds a single series.
    pub fn points(&self) -> Option<&[SeriesPoint]> {
        match &self.data {
            ChartData::Series(points) => Some(points),
            ChartData::Frame(_) => None,
        }
    }

    /// Frame, if this chart holds a two-dimensional table.
    pub fn as_frame(&self) -> Option<&Frame> {
        match &self.data {
            ChartData::Frame(frame) => Some(frame),
            ChartData::Series(_) => None,
        }
    }
}

/// Anything a single interaction can produce.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Output {
    Chart(Chart),
    Comparison(PeriodComparison),
    Answer { question: String, answer: String },
    Periods(Vec<PeriodDefinition>),
    Years(Vec<i32>),
    Message(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 2, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date("2023-02-15"), Some(expected));
        assert_eq!(parse_date(" 02/15/2023 "), Some(expected));
        assert_eq!(parse_date("2023-02-15 00:00:00"), Some(expected));
        assert_eq!(parse_date("2023-02-15T00:00:00"), Some(expected));
        assert_eq!(parse_date("15th of February"), None);
    }

    #[test]
    fn test_month_id_is_two_digits() {
        let record = SalesRecord {
            date: parse_date("2023-05-10").unwrap(),
            sales: 50.0,
            product: "A".to_string(),
            region: "North".to_string(),
            customer_age: 30.0,
            customer_gender: "Male".to_string(),
            customer_satisfaction: 3.0,
        };
        assert_eq!(record.month_id(), "05");
        assert_eq!(record.year(), 2023);
    }

    #[test]
    fn test_period_definition_dedups_months() {
        let period = PeriodDefinition::new("Peak", ["12", "11", "12"]);
        assert_eq!(period.months.len(), 2);
        assert!(period.contains("11"));
        assert_eq!(period.to_string(), "Peak: 11, 12");
    }

    #[test]
    fn test_frame_cell_lookup() {
        let frame = Frame {
            columns: vec!["2023".to_string(), "2024".to_string()],
            rows: vec![FrameRow {
                label: "Q1 2023".to_string(),
                values: vec![Some(100.0), None],
            }],
        };
        assert_eq!(frame.cell("Q1 2023", "2023"), Some(100.0));
        assert_eq!(frame.cell("Q1 2023", "2024"), None);
        assert_eq!(frame.cell("Q2 2023", "2023"), None);
    }
}
