//! Single-dimension breakdowns of the sales table.
//!
//! Each function is a pure query over the full table and returns a chart
//! ready for the rendering layer.

use super::grouping::{histogram, mean_by, pearson, sum_by, value_frequency, NumericKey};
use crate::dataset::Dataset;
use crate::models::{Chart, ChartKind, Frame, FrameRow, SalesRecord};
use std::cmp::Ordering;

/// Number of buckets in the age distribution.
pub const AGE_BINS: usize = 10;

pub fn product_sales(dataset: &Dataset) -> Chart {
    Chart::series(
        "Sales by Product",
        ChartKind::Bar,
        sum_by(dataset.records(), |r| r.product.clone(), |r| r.sales),
    )
}

pub fn product_customer_age(dataset: &Dataset) -> Chart {
    Chart::series(
        "Average Customer Age by Product",
        ChartKind::Bar,
        mean_by(dataset.records(), |r| r.product.clone(), |r| r.customer_age),
    )
}

pub fn product_satisfaction(dataset: &Dataset) -> Chart {
    Chart::series(
        "Average Customer Satisfaction by Product",
        ChartKind::Bar,
        mean_by(
            dataset.records(),
            |r| r.product.clone(),
            |r| r.customer_satisfaction,
        ),
    )
}

pub fn product_gender_ratio(dataset: &Dataset) -> Chart {
    Chart::frame(
        "Customer Gender Ratio by Product",
        ChartKind::Bar,
        value_frequency(
            dataset.records(),
            |r| r.product.clone(),
            |r| r.customer_gender.clone(),
        ),
    )
}

pub fn regional_sales(dataset: &Dataset) -> Chart {
    Chart::series(
        "Sales by Region",
        ChartKind::Bar,
        sum_by(dataset.records(), |r| r.region.clone(), |r| r.sales),
    )
}

pub fn regional_customer_age(dataset: &Dataset) -> Chart {
    Chart::series(
        "Average Customer Age by Region",
        ChartKind::Bar,
        mean_by(dataset.records(), |r| r.region.clone(), |r| r.customer_age),
    )
}

pub fn regional_satisfaction(dataset: &Dataset) -> Chart {
    Chart::series(
        "Average Customer Satisfaction by Region",
        ChartKind::Bar,
        mean_by(
            dataset.records(),
            |r| r.region.clone(),
            |r| r.customer_satisfaction,
        ),
    )
}

pub fn regional_gender_ratio(dataset: &Dataset) -> Chart {
    Chart::frame(
        "Customer Gender Ratio by Region",
        ChartKind::Bar,
        region_gender_frame(dataset),
    )
}

pub fn gender_sales(dataset: &Dataset) -> Chart {
    Chart::series(
        "Sales by Customer Gender",
        ChartKind::Bar,
        sum_by(dataset.records(), |r| r.customer_gender.clone(), |r| r.sales),
    )
}

pub fn age_sales(dataset: &Dataset) -> Chart {
    Chart::series(
        "Sales by Customer Age",
        ChartKind::Bar,
        sum_by(dataset.records(), |r| NumericKey(r.customer_age), |r| r.sales),
    )
}

pub fn regional_demographics(dataset: &Dataset) -> Chart {
    Chart::frame(
        "Regional Demographics",
        ChartKind::Bar,
        region_gender_frame(dataset),
    )
}

pub fn regional_age(dataset: &Dataset) -> Chart {
    Chart::series(
        "Regional Age Analysis",
        ChartKind::Bar,
        mean_by(dataset.records(), |r| r.region.clone(), |r| r.customer_age),
    )
}

/// Numeric columns considered by the satisfaction correlation.
const NUMERIC_COLUMNS: [(&str, fn(&SalesRecord) -> f64); 3] = [
    ("Sales", |r: &SalesRecord| r.sales),
    ("Customer_Age", |r: &SalesRecord| r.customer_age),
    ("Customer_Satisfaction", |r: &SalesRecord| r.customer_satisfaction),
];

/// Correlation of every numeric column with Customer_Satisfaction, sorted
/// descending. Undefined correlations (no variance) sort last.
pub fn satisfaction_correlation(dataset: &Dataset) -> Chart {
    let satisfaction: Vec<f64> = dataset
        .records()
        .iter()
        .map(|r| r.customer_satisfaction)
        .collect();

    let mut rows: Vec<FrameRow> = NUMERIC_COLUMNS
        .iter()
        .map(|(name, column)| {
            let values: Vec<f64> = dataset.records().iter().map(column).collect();
            FrameRow {
                label: name.to_string(),
                values: vec![pearson(&values, &satisfaction)],
            }
        })
        .collect();

    rows.sort_by(|a, b| match (a.values[0], b.values[0]) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    Chart::frame(
        "Correlation with Customer Satisfaction",
        ChartKind::Table,
        Frame {
            columns: vec!["Customer_Satisfaction".to_string()],
            rows,
        },
    )
}

pub fn age_distribution(dataset: &Dataset) -> Chart {
    let ages: Vec<f64> = dataset.records().iter().map(|r| r.customer_age).collect();
    Chart::series(
        "Customer Age Distribution",
        ChartKind::Histogram,
        histogram(&ages, AGE_BINS),
    )
}

fn region_gender_frame(dataset: &Dataset) -> Frame {
    value_frequency(
        dataset.records(),
        |r| r.region.clone(),
        |r| r.customer_gender.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::sample_dataset;
    use crate::models::{parse_date, SeriesPoint};

    fn value_of(chart: &Chart, label: &str) -> Option<f64> {
        chart
            .points()?
            .iter()
            .find(|p| p.label == label)
            .map(|p| p.value)
    }

    #[test]
    fn test_product_sales() {
        let chart = product_sales(&sample_dataset());

        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(
            chart.points().unwrap(),
            &[
                SeriesPoint::new("Gadget", 490.0),
                SeriesPoint::new("Gizmo", 250.0),
                SeriesPoint::new("Widget", 720.0),
            ]
        );
    }

    #[test]
    fn test_product_means() {
        let dataset = sample_dataset();

        let age = product_customer_age(&dataset);
        assert!((value_of(&age, "Widget").unwrap() - 37.4).abs() < 1e-9);
        assert!((value_of(&age, "Gadget").unwrap() - 49.75).abs() < 1e-9);

        let satisfaction = product_satisfaction(&dataset);
        assert!((value_of(&satisfaction, "Gizmo").unwrap() - 8.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_regional_breakdowns() {
        let dataset = sample_dataset();

        let sales = regional_sales(&dataset);
        assert_eq!(value_of(&sales, "North"), Some(540.0));
        assert_eq!(value_of(&sales, "West"), Some(310.0));

        let age = regional_customer_age(&dataset);
        assert_eq!(age.points(), regional_age(&dataset).points());

        let satisfaction = regional_satisfaction(&dataset);
        assert_eq!(value_of(&satisfaction, "East"), Some(4.0));
    }

    #[test]
    fn test_gender_ratio_frames() {
        let dataset = sample_dataset();

        let by_region = regional_gender_ratio(&dataset);
        let frame = by_region.as_frame().unwrap();
        assert_eq!(frame.columns, vec!["Female", "Male"]);
        assert!((frame.cell("East", "Female").unwrap() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(frame.cell("North", "Male"), Some(0.5));

        let demographics = regional_demographics(&dataset);
        assert_eq!(demographics.as_frame(), Some(frame));

        let by_product = product_gender_ratio(&dataset);
        assert_eq!(by_product.as_frame().unwrap().cell("Gadget", "Male"), Some(0.5));
    }

    #[test]
    fn test_gender_ratio_missing_category_is_empty_cell() {
        let records = vec![
            SalesRecord {
                date: parse_date("2023-01-01").unwrap(),
                sales: 10.0,
                product: "A".to_string(),
                region: "North".to_string(),
                customer_age: 30.0,
                customer_gender: "Female".to_string(),
                customer_satisfaction: 3.0,
            },
            SalesRecord {
                date: parse_date("2023-01-02").unwrap(),
                sales: 20.0,
                product: "B".to_string(),
                region: "South".to_string(),
                customer_age: 40.0,
                customer_gender: "Male".to_string(),
                customer_satisfaction: 4.0,
            },
        ];
        let dataset = Dataset::new(records, "memory");

        let chart = product_gender_ratio(&dataset);
        let frame = chart.as_frame().unwrap();
        assert_eq!(frame.cell("A", "Female"), Some(1.0));
        assert_eq!(frame.cell("A", "Male"), None);
    }

    #[test]
    fn test_demographic_sales() {
        let dataset = sample_dataset();

        let gender = gender_sales(&dataset);
        assert_eq!(value_of(&gender, "Female"), Some(720.0));
        assert_eq!(value_of(&gender, "Male"), Some(740.0));

        let age = age_sales(&dataset);
        assert_eq!(age.points().unwrap().len(), 7);
        assert_eq!(value_of(&age, "52"), Some(330.0));
    }

    #[test]
    fn test_satisfaction_correlation_sorted_descending() {
        let chart = satisfaction_correlation(&sample_dataset());
        let frame = chart.as_frame().unwrap();

        assert_eq!(chart.kind, ChartKind::Table);
        assert_eq!(frame.rows.len(), 3);
        assert_eq!(frame.rows[0].label, "Customer_Satisfaction");
        assert!((frame.rows[0].values[0].unwrap() - 1.0).abs() < 1e-9);

        let values: Vec<f64> = frame.rows.iter().filter_map(|r| r.values[0]).collect();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_correlation_without_variance_sorts_last() {
        let dataset = crate::dataset::tests::dataset_from_sales(&[
            ("2023-01-01", 10.0),
            ("2023-01-02", 20.0),
        ]);
        let chart = satisfaction_correlation(&dataset);
        let frame = chart.as_frame().unwrap();

        // satisfaction is constant, so nothing correlates
        assert!(frame.rows.iter().all(|r| r.values[0].is_none()));
    }

    #[test]
    fn test_age_distribution() {
        let chart = age_distribution(&sample_dataset());
        let points = chart.points().unwrap();

        assert_eq!(chart.kind, ChartKind::Histogram);
        assert_eq!(points.len(), AGE_BINS);
        assert_eq!(points.iter().map(|p| p.value).sum::<f64>(), 12.0);
    }

    #[test]
    fn test_breakdowns_are_idempotent() {
        let dataset = sample_dataset();
        assert_eq!(product_sales(&dataset), product_sales(&dataset));
        assert_eq!(
            regional_gender_ratio(&dataset),
            regional_gender_ratio(&dataset)
        );
        assert_eq!(
            satisfaction_correlation(&dataset),
            satisfaction_correlation(&dataset)
        );
    }
}
