//! Sales dataset loading.
//!
//! The dataset is fetched once at startup from a URL or a local CSV file and
//! is read-only afterwards. Sessions share it through an `Arc`.

use crate::error::{DashboardError, Result};
use crate::models::SalesRecord;
use chrono::Timelike;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Column order of the sales CSV.
pub const COLUMNS: [&str; 7] = [
    "Date",
    "Sales",
    "Product",
    "Region",
    "Customer_Age",
    "Customer_Gender",
    "Customer_Satisfaction",
];

/// Options for loading the dataset.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// HTTP timeout for remote sources.
    pub timeout: Duration,
    /// Whether to show a download spinner.
    pub show_progress: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            show_progress: false,
        }
    }
}

/// The immutable in-memory sales table.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SalesRecord>,
    source: String,
}

impl Dataset {
    pub fn new(records: Vec<SalesRecord>, source: impl Into<String>) -> Self {
        Self {
            records,
            source: source.into(),
        }
    }

    /// Load the dataset from an `http(s)://` URL or a local file path.
    pub async fn load(source: &str, options: &LoadOptions) -> Result<Self> {
        info!("Loading dataset from: {}", source);

        let records = if is_remote(source) {
            let body = fetch_remote(source, options).await?;
            parse_csv(body.as_bytes())?
        } else {
            let file = std::fs::File::open(Path::new(source))
                .map_err(|e| DashboardError::DataLoad(format!("{}: {}", source, e)))?;
            parse_csv(file)?
        };

        info!("Loaded {} sales records", records.len());
        Ok(Self::new(records, source))
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct years present in the table, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.records
            .iter()
            .map(SalesRecord::year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Render the whole table as fixed-width text, one line per row with a
    /// leading row index, for use as question-answering context.
    pub fn to_context_text(&self) -> String {
        let date_only = self
            .records
            .iter()
            .all(|r| r.date.time().num_seconds_from_midnight() == 0);

        let mut rows: Vec<Vec<String>> = Vec::with_capacity(self.records.len() + 1);

        let mut header = vec![String::new()];
        header.extend(COLUMNS.iter().map(|c| c.to_string()));
        rows.push(header);

        for (i, r) in self.records.iter().enumerate() {
            let date = if date_only {
                r.date.format("%Y-%m-%d").to_string()
            } else {
                r.date.format("%Y-%m-%d %H:%M:%S").to_string()
            };
            rows.push(vec![
                i.to_string(),
                date,
                r.sales.to_string(),
                r.product.clone(),
                r.region.clone(),
                r.customer_age.to_string(),
                r.customer_gender.clone(),
                r.customer_satisfaction.to_string(),
            ]);
        }

        let widths: Vec<usize> = (0..rows[0].len())
            .map(|col| rows.iter().map(|row| row[col].len()).max().unwrap_or(0))
            .collect();

        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(&widths)
                    .map(|(cell, width)| format!("{:>width$}", cell, width = width))
                    .collect::<Vec<_>>()
                    .join("  ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse sales records from CSV text with a header row.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<SalesRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: SalesRecord = result.map_err(|e| {
            DashboardError::DataLoad(format!("CSV parse error at line {}: {}", line_num + 2, e))
        })?;
        records.push(record);
    }

    debug!("Parsed {} CSV rows", records.len());
    Ok(records)
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

async fn fetch_remote(url: &str, options: &LoadOptions) -> Result<String> {
    let spinner = options.show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Downloading {}", url));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let result = download(url, options.timeout).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    result
}

async fn download(url: &str, timeout: Duration) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DashboardError::DataLoad(format!("Failed to create HTTP client: {}", e)))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DashboardError::DataLoad(format!("Request timed out after {}s", timeout.as_secs()))
        } else if e.is_connect() {
            DashboardError::DataLoad(format!("Cannot connect to {}", url))
        } else {
            DashboardError::DataLoad(format!("Failed to fetch {}: {}", url, e))
        }
    })?;

    if !response.status().is_success() {
        return Err(DashboardError::DataLoad(format!(
            "HTTP {} fetching {}",
            response.status(),
            url
        )));
    }

    response
        .text()
        .await
        .map_err(|e| DashboardError::DataLoad(format!("Failed to read response body: {}", e)))
}
