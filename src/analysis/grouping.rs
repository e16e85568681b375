//! Grouping and reduction helpers over sales records.
//!
//! Groups are kept in sorted key order so every breakdown is deterministic.

use crate::models::{Frame, FrameRow, SalesRecord, SeriesPoint};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Group records by a key.
pub fn group_by<'a, K, F>(records: &'a [SalesRecord], key: F) -> BTreeMap<K, Vec<&'a SalesRecord>>
where
    K: Ord,
    F: Fn(&SalesRecord) -> K,
{
    let mut grouped: BTreeMap<K, Vec<&SalesRecord>> = BTreeMap::new();

    for record in records {
        grouped.entry(key(record)).or_default().push(record);
    }

    grouped
}

/// Sum of `value` per group.
pub fn sum_by<K, F, V>(records: &[SalesRecord], key: F, value: V) -> Vec<SeriesPoint>
where
    K: Ord + ToString,
    F: Fn(&SalesRecord) -> K,
    V: Fn(&SalesRecord) -> f64,
{
    group_by(records, key)
        .into_iter()
        .map(|(k, group)| SeriesPoint::new(k.to_string(), group.iter().map(|r| value(*r)).sum()))
        .collect()
}

/// Mean of `value` per group.
pub fn mean_by<K, F, V>(records: &[SalesRecord], key: F, value: V) -> Vec<SeriesPoint>
where
    K: Ord + ToString,
    F: Fn(&SalesRecord) -> K,
    V: Fn(&SalesRecord) -> f64,
{
    group_by(records, key)
        .into_iter()
        .map(|(k, group)| {
            let total: f64 = group.iter().map(|r| value(*r)).sum();
            SeriesPoint::new(k.to_string(), total / group.len() as f64)
        })
        .collect()
}

/// Share of each `value` category within each group.
///
/// One column per distinct category (sorted). A category that never occurs
/// in a group leaves its cell empty rather than zero.
pub fn value_frequency<F, V>(records: &[SalesRecord], key: F, value: V) -> Frame
where
    F: Fn(&SalesRecord) -> String,
    V: Fn(&SalesRecord) -> String,
{
    let columns: Vec<String> = records
        .iter()
        .map(&value)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let rows = group_by(records, key)
        .into_iter()
        .map(|(label, group)| {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for record in &group {
                *counts.entry(value(*record)).or_default() += 1;
            }

            let values = columns
                .iter()
                .map(|c| counts.get(c).map(|n| *n as f64 / group.len() as f64))
                .collect();

            FrameRow { label, values }
        })
        .collect();

    Frame { columns, rows }
}

/// A float usable as an ordered map key.
#[derive(Debug, Clone, Copy)]
pub struct NumericKey(pub f64);

impl PartialEq for NumericKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NumericKey {}

impl PartialOrd for NumericKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NumericKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::fmt::Display for NumericKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pearson correlation; `None` when either side has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }

    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Equal-width histogram over `bins` buckets. The last bucket includes its
/// upper edge. A constant input is spread over `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<SeriesPoint> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let start = lo + width * i as f64;
            let end = start + width;
            SeriesPoint::new(format!("{:.1}-{:.1}", start, end), count as f64)
        })
        .collect()
}
