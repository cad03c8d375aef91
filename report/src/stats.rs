//! Descriptive statistics over a policy partition.
//!
//! Every function accepts an empty slice and then returns an empty result.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::error::ReportError;
use crate::table::Row;

/// Mean (and sample standard deviation) of one field at one demand count.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStat {
    pub demands: u64,
    pub count: usize,
    pub mean: f64,
    /// `None` for single-sample groups.
    pub std: Option<f64>,
}

pub fn mean_std_by_demands(rows: &[&Row], field: &str) -> Result<Vec<GroupStat>, ReportError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let mut groups: BTreeMap<u64, Vec<f64>> = BTreeMap::new();
    for row in rows {
        if let Some(value) = row.number(field) {
            groups.entry(row.demands()).or_default().push(value);
        }
    }
    if groups.is_empty() {
        return Err(ReportError::schema(format!(
            "no numeric `{field}` values in {} rows",
            rows.len()
        )));
    }
    Ok(groups
        .into_iter()
        .map(|(demands, values)| {
            let (mean, std) = mean_std(&values);
            GroupStat {
                demands,
                count: values.len(),
                mean,
                std,
            }
        })
        .collect())
}

fn mean_std(values: &[f64]) -> (f64, Option<f64>) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, None);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, Some(variance.sqrt()))
}

/// Columns starting with `prefix`, ordered by their suffix (numerically when
/// both suffixes are numbers).
pub fn prefixed_columns<'a>(columns: impl IntoIterator<Item = &'a str>, prefix: &str) -> Vec<String> {
    columns
        .into_iter()
        .filter(|column| column.len() > prefix.len() && column.starts_with(prefix))
        .map(str::to_string)
        .sorted_by(|a, b| {
            let (sa, sb) = (&a[prefix.len()..], &b[prefix.len()..]);
            match (sa.parse::<u64>(), sb.parse::<u64>()) {
                (Ok(na), Ok(nb)) => na.cmp(&nb),
                _ => sa.cmp(sb),
            }
        })
        .collect()
}

/// One region's normalised transponder count per demand count.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSeries {
    pub region: String,
    pub points: Vec<(u64, f64)>,
}

/// Per demand count: `sum(region column) / sum(demands) / region size`.
///
/// `region_columns` must line up with `region_sizes`; a length mismatch is a
/// schema error rather than a silent truncation.
pub fn normalized_region_sums(
    rows: &[&Row],
    region_columns: &[String],
    region_sizes: &[f64],
) -> Result<Vec<RegionSeries>, ReportError> {
    if region_columns.is_empty() {
        return Err(ReportError::schema("no region columns found"));
    }
    if region_columns.len() != region_sizes.len() {
        return Err(ReportError::schema(format!(
            "{} region columns but {} region sizes",
            region_columns.len(),
            region_sizes.len()
        )));
    }

    let by_demands = rows.iter().into_group_map_by(|row| row.demands());
    let by_demands: BTreeMap<u64, Vec<&&Row>> = by_demands.into_iter().collect();

    let series = region_columns
        .iter()
        .zip(region_sizes)
        .map(|(column, size)| {
            let points = by_demands
                .iter()
                .filter_map(|(demands, group)| {
                    let total_demands: f64 = group.iter().map(|row| row.demands() as f64).sum();
                    if total_demands <= 0.0 {
                        return None;
                    }
                    let sum: f64 = group.iter().filter_map(|row| row.number(column)).sum();
                    Some((*demands, sum / total_demands / size))
                })
                .collect();
            RegionSeries {
                region: column.clone(),
                points,
            }
        })
        .collect();
    Ok(series)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    pub label: String,
    pub value: f64,
}

/// Sum of each node column over all rows, labelled by the node id.
pub fn node_totals(rows: &[&Row], node_columns: &[String], prefix: &str) -> Vec<Ranked> {
    node_columns
        .iter()
        .map(|column| Ranked {
            label: column.strip_prefix(prefix).unwrap_or(column).to_string(),
            value: rows.iter().filter_map(|row| row.number(column)).sum(),
        })
        .collect()
}

/// Highest `n` values, plus every entry tied with the `n`-th.
///
/// Ordered by value descending, then label.
pub fn top_n_with_ties(items: Vec<Ranked>, n: usize) -> Vec<Ranked> {
    if n == 0 {
        return Vec::new();
    }
    let sorted: Vec<Ranked> = items
        .into_iter()
        .sorted_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.label.cmp(&b.label)))
        .collect();
    if sorted.len() <= n {
        return sorted;
    }
    let cutoff = sorted[n - 1].value;
    sorted
        .into_iter()
        .enumerate()
        .take_while(|(index, item)| *index < n || item.value == cutoff)
        .map(|(_, item)| item)
        .collect()
}

/// Trials missing at one demand count relative to the smallest demand count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTrials {
    pub demands: u64,
    pub trials: usize,
    /// `(trials at the minimum demand count) - trials`.
    pub missing: i64,
}

/// Approximate failure counts: the row count at the minimum demand count is
/// taken as the number of trials attempted everywhere.
pub fn missing_trials(rows: &[&Row]) -> Vec<MissingTrials> {
    let counts = rows.iter().counts_by(|row| row.demands());
    let counts: BTreeMap<u64, usize> = counts.into_iter().collect();
    let Some(baseline) = counts.values().next().copied() else {
        return Vec::new();
    };
    counts
        .into_iter()
        .map(|(demands, trials)| MissingTrials {
            demands,
            trials,
            missing: baseline as i64 - trials as i64,
        })
        .collect()
}
