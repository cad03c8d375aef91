//! The report battery.
//!
//! A report is data: which columns it reads ([`Selector`]), how it reduces
//! them ([`Aggregation`]) and how it is drawn ([`ChartKind`]). [`run_reports`]
//! evaluates every spec independently; one failing report is logged and
//! skipped without touching the others.

use std::path::{Path, PathBuf};

use sweep::core::layout::{TransponderPolicy, skew_segment};
use tracing::{debug, info, instrument, warn};

use crate::chart::{Chart, ChartKind, Series, XValues, write_chart};
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::stats::{
    mean_std_by_demands, missing_trials, node_totals, normalized_region_sums, prefixed_columns,
    top_n_with_ties,
};
use crate::table::{Row, UnifiedTable, by_skew};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// One named column.
    Field(&'static str),
    /// Every column starting with the prefix.
    Prefix(&'static str),
    /// Row counts only.
    Rows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Mean and sample std by demand count, one trace per policy.
    MeanStd,
    /// Region sums / total demands / region size, one chart per policy.
    RegionNormalized,
    /// Node totals ranked, one chart per policy.
    TopNodes,
    /// Rows at the minimum demand count minus rows at each demand count.
    MissingTrials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub y_label: &'static str,
    pub selector: Selector,
    pub aggregation: Aggregation,
    pub chart: ChartKind,
}

pub fn battery() -> Vec<ReportSpec> {
    let mean = |name, title, field| ReportSpec {
        name,
        title,
        y_label: field,
        selector: Selector::Field(field),
        aggregation: Aggregation::MeanStd,
        chart: ChartKind::Lines,
    };
    let region = |name, title, prefix| ReportSpec {
        name,
        title,
        y_label: "transponders per demand per node",
        selector: Selector::Prefix(prefix),
        aggregation: Aggregation::RegionNormalized,
        chart: ChartKind::Lines,
    };
    let top = |name, title, prefix| ReportSpec {
        name,
        title,
        y_label: "transponders",
        selector: Selector::Prefix(prefix),
        aggregation: Aggregation::TopNodes,
        chart: ChartKind::Bars,
    };
    vec![
        mean("total_cost", "Mean total cost", "total_Cost"),
        mean("number_zr", "Mean number of ZR+ transponders", "number_ZR"),
        mean("number_lr", "Mean number of long reach transponders", "number_LR"),
        region(
            "region_transponders",
            "Transponders per region",
            "Transponder_Island",
        ),
        region("region_zr", "ZR+ transponders per region", "ZR_Island"),
        region("region_lr", "Long reach transponders per region", "LR_Island"),
        top("top_nodes_zr", "Nodes with most ZR+ transponders", "ZR_Node"),
        top("top_nodes_lr", "Nodes with most long reach transponders", "LR_Node"),
        ReportSpec {
            name: "missing_trials",
            title: "Missing trials per number of demands",
            y_label: "missing trials",
            selector: Selector::Rows,
            aggregation: Aggregation::MissingTrials,
            chart: ChartKind::Bars,
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStatus {
    Rendered(Vec<PathBuf>),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    pub name: &'static str,
    pub status: ReportStatus,
}

/// Rows of one policy at one skew. Every chart line or chart covers one slice.
struct Slice<'a> {
    policy: TransponderPolicy,
    skew: f64,
    rows: Vec<&'a Row>,
}

impl Slice<'_> {
    fn label(&self) -> String {
        format!("{} {}", self.policy, skew_segment(self.skew))
    }

    fn file_stem(&self, report: &str) -> String {
        format!(
            "{report}_{}_{}",
            self.policy.dir_name(),
            skew_segment(self.skew)
        )
    }
}

struct ReportContext<'a> {
    table: &'a UnifiedTable,
    /// Non-empty (policy, skew) slices, policy-major.
    slices: Vec<Slice<'a>>,
    config: &'a ReportConfig,
}

impl<'a> ReportContext<'a> {
    fn new(table: &'a UnifiedTable, config: &'a ReportConfig) -> Self {
        let partitions = table.partition();
        let slices = partitions
            .iter()
            .flat_map(|(policy, rows)| {
                by_skew(rows)
                    .into_iter()
                    .map(move |(skew, rows)| Slice { policy, skew, rows })
            })
            .collect();
        Self {
            table,
            slices,
            config,
        }
    }
}

/// Render every report in `specs` into `plots_dir`.
pub fn run_reports(
    specs: &[ReportSpec],
    table: &UnifiedTable,
    config: &ReportConfig,
    plots_dir: &Path,
) -> Vec<ReportOutcome> {
    let ctx = ReportContext::new(table, config);
    specs
        .iter()
        .map(|spec| {
            let status = match run_report(spec, &ctx, plots_dir) {
                Ok(paths) => ReportStatus::Rendered(paths),
                Err(err) => {
                    warn!(report = spec.name, err = %err, "report skipped");
                    ReportStatus::Skipped(err.to_string())
                }
            };
            ReportOutcome {
                name: spec.name,
                status,
            }
        })
        .collect()
}

#[instrument(skip_all, fields(report = spec.name))]
fn run_report(
    spec: &ReportSpec,
    ctx: &ReportContext<'_>,
    plots_dir: &Path,
) -> Result<Vec<PathBuf>, ReportError> {
    let charts = build_charts(spec, ctx)?;
    if charts.is_empty() {
        return Err(ReportError::NoData("every policy partition is empty".to_string()));
    }
    let mut paths = Vec::with_capacity(charts.len());
    for (file_stem, chart) in charts {
        let path = plots_dir.join(format!("{file_stem}.html"));
        write_chart(&chart, &path)?;
        paths.push(path);
    }
    info!(charts = paths.len(), "report rendered");
    Ok(paths)
}

/// Charts for one report, each with the file stem it is written under.
fn build_charts(spec: &ReportSpec, ctx: &ReportContext<'_>) -> Result<Vec<(String, Chart)>, ReportError> {
    let chart = |title: String, series: Vec<Series>| Chart {
        title,
        x_label: "demands".to_string(),
        y_label: spec.y_label.to_string(),
        kind: spec.chart,
        series,
    };

    match (spec.aggregation, spec.selector) {
        (Aggregation::MeanStd, Selector::Field(field)) => {
            let mut series = Vec::new();
            let mut absent = None;
            for slice in &ctx.slices {
                let stats = match mean_std_by_demands(&slice.rows, field) {
                    Ok(stats) => stats,
                    Err(err @ ReportError::SchemaMismatch(_)) => {
                        warn!(slice = %slice.label(), err = %err, "trace omitted");
                        absent.get_or_insert(err);
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                debug!(
                    slice = %slice.label(),
                    groups = stats.len(),
                    samples = stats.iter().map(|s| s.count).sum::<usize>(),
                    "mean computed"
                );
                series.push(Series {
                    name: slice.label(),
                    x: XValues::Numeric(stats.iter().map(|s| s.demands as f64).collect()),
                    y: stats.iter().map(|s| s.mean).collect(),
                    error: Some(stats.iter().map(|s| s.std.unwrap_or(0.0)).collect()),
                });
            }
            if series.is_empty()
                && let Some(err) = absent
            {
                return Err(err);
            }
            Ok(single_chart(spec.name, series, |series| {
                chart(spec.title.to_string(), series)
            }))
        }
        (Aggregation::RegionNormalized, Selector::Prefix(prefix)) => {
            let columns = prefixed_columns(ctx.table.columns(), prefix);
            let mut charts = Vec::new();
            for slice in &ctx.slices {
                let regions =
                    normalized_region_sums(&slice.rows, &columns, &ctx.config.region_sizes)?;
                let series = regions
                    .into_iter()
                    .map(|region| Series {
                        name: region.region,
                        x: XValues::Numeric(region.points.iter().map(|(d, _)| *d as f64).collect()),
                        y: region.points.iter().map(|(_, v)| *v).collect(),
                        error: None,
                    })
                    .collect();
                charts.push((
                    slice.file_stem(spec.name),
                    chart(format!("{} ({})", spec.title, slice.label()), series),
                ));
            }
            Ok(charts)
        }
        (Aggregation::TopNodes, Selector::Prefix(prefix)) => {
            let columns = prefixed_columns(ctx.table.columns(), prefix);
            if columns.is_empty() {
                return Err(ReportError::schema(format!("no `{prefix}*` columns found")));
            }
            let mut charts = Vec::new();
            for slice in &ctx.slices {
                let top =
                    top_n_with_ties(node_totals(&slice.rows, &columns, prefix), ctx.config.top_n);
                let series = vec![Series {
                    name: slice.label(),
                    x: XValues::Labels(top.iter().map(|r| r.label.clone()).collect()),
                    y: top.iter().map(|r| r.value).collect(),
                    error: None,
                }];
                let mut node_chart = chart(format!("{} ({})", spec.title, slice.label()), series);
                node_chart.x_label = "node".to_string();
                charts.push((slice.file_stem(spec.name), node_chart));
            }
            Ok(charts)
        }
        (Aggregation::MissingTrials, Selector::Rows) => {
            let series = ctx
                .slices
                .iter()
                .map(|slice| {
                    let missing = missing_trials(&slice.rows);
                    debug!(
                        slice = %slice.label(),
                        rows = missing.iter().map(|m| m.trials).sum::<usize>(),
                        "missing trials computed"
                    );
                    Series {
                        name: slice.label(),
                        x: XValues::Numeric(missing.iter().map(|m| m.demands as f64).collect()),
                        y: missing.iter().map(|m| m.missing as f64).collect(),
                        error: None,
                    }
                })
                .collect();
            Ok(single_chart(spec.name, series, |series| {
                chart(spec.title.to_string(), series)
            }))
        }
        (aggregation, selector) => Err(ReportError::schema(format!(
            "{aggregation:?} cannot read {selector:?}"
        ))),
    }
}

fn single_chart(
    name: &str,
    series: Vec<Series>,
    chart: impl FnOnce(Vec<Series>) -> Chart,
) -> Vec<(String, Chart)> {
    if series.is_empty() {
        return Vec::new();
    }
    vec![(name.to_string(), chart(series))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Fields, Row, Value};
    use sweep::core::layout::ArtifactKey;
    use tempfile::tempdir;

    fn row(policy: TransponderPolicy, demands: u64, fields: &[(&str, f64)]) -> Row {
        row_at(policy, 50.0, demands, fields)
    }

    fn row_at(policy: TransponderPolicy, skew: f64, demands: u64, fields: &[(&str, f64)]) -> Row {
        let mut all: Fields = fields
            .iter()
            .map(|(name, value)| (name.to_string(), Value::Number(*value)))
            .collect();
        all.insert("demands".to_string(), Value::Number(demands as f64));
        Row::new(
            ArtifactKey {
                policy,
                skew,
                demands,
            },
            all,
        )
    }

    fn table() -> UnifiedTable {
        let mut table = UnifiedTable::default();
        for demands in [10, 20] {
            table.push(row(
                TransponderPolicy::Single,
                demands,
                &[
                    ("total_Cost", 5.0),
                    ("ZR_Island1", 2.0),
                    ("ZR_Island2", 4.0),
                    ("ZR_NodeA", 3.0),
                ],
            ));
        }
        table
    }

    fn status<'a>(outcomes: &'a [ReportOutcome], name: &str) -> &'a ReportStatus {
        &outcomes
            .iter()
            .find(|o| o.name == name)
            .expect("report present")
            .status
    }

    #[test]
    fn battery_names_are_unique() {
        let specs = battery();
        let mut names: Vec<&str> = specs.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), specs.len());
    }

    #[test]
    fn missing_columns_skip_only_their_reports() {
        let temp = tempdir().expect("tempdir");
        let config = ReportConfig {
            region_sizes: vec![2.0, 2.0],
            ..ReportConfig::default()
        };
        let outcomes = run_reports(&battery(), &table(), &config, temp.path());
        assert_eq!(outcomes.len(), battery().len());

        assert!(matches!(status(&outcomes, "total_cost"), ReportStatus::Rendered(_)));
        assert!(matches!(status(&outcomes, "region_zr"), ReportStatus::Rendered(_)));
        assert!(matches!(status(&outcomes, "top_nodes_zr"), ReportStatus::Rendered(_)));
        assert!(matches!(status(&outcomes, "missing_trials"), ReportStatus::Rendered(_)));
        assert!(matches!(status(&outcomes, "number_zr"), ReportStatus::Skipped(_)));
        assert!(matches!(status(&outcomes, "region_lr"), ReportStatus::Skipped(_)));
        assert!(matches!(status(&outcomes, "top_nodes_lr"), ReportStatus::Skipped(_)));
        assert!(temp.path().join("total_cost.html").exists());
        assert!(temp.path().join("region_zr_singleTransponder_C50.0.html").exists());
        assert!(!temp.path().join("region_zr_multipleTransponders_C50.0.html").exists());
    }

    #[test]
    fn region_size_mismatch_is_skipped_with_diagnostic() {
        let temp = tempdir().expect("tempdir");
        let config = ReportConfig {
            region_sizes: vec![2.0, 2.0, 2.0],
            ..ReportConfig::default()
        };
        let outcomes = run_reports(&battery(), &table(), &config, temp.path());
        match status(&outcomes, "region_zr") {
            ReportStatus::Skipped(reason) => assert!(reason.contains("region sizes"), "{reason}"),
            other => panic!("expected skip, got {other:?}"),
        }
        assert!(matches!(status(&outcomes, "total_cost"), ReportStatus::Rendered(_)));
    }

    #[test]
    fn empty_table_skips_every_report_without_panicking() {
        let temp = tempdir().expect("tempdir");
        let outcomes = run_reports(
            &battery(),
            &UnifiedTable::default(),
            &ReportConfig::default(),
            temp.path(),
        );
        assert!(
            outcomes
                .iter()
                .all(|o| matches!(o.status, ReportStatus::Skipped(_)))
        );
    }

    #[test]
    fn mean_chart_has_trace_per_non_empty_policy() {
        let mut table = table();
        table.push(row(TransponderPolicy::Multiple, 10, &[("total_Cost", 9.0)]));
        let config = ReportConfig::default();
        let ctx = ReportContext::new(&table, &config);
        let charts = build_charts(&battery()[0], &ctx).expect("charts");
        assert_eq!(charts.len(), 1);
        let names: Vec<&str> = charts[0].1.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["singleTransponder C50.0", "multipleTransponders C50.0"]);
        assert_eq!(charts[0].1.series[0].error, Some(vec![0.0, 0.0]));
    }

    #[test]
    fn field_absent_in_one_policy_keeps_the_other_trace() {
        let mut table = UnifiedTable::default();
        table.push(row(TransponderPolicy::Single, 10, &[("number_ZR", 4.0)]));
        table.push(row(TransponderPolicy::Multiple, 10, &[("total_Cost", 9.0)]));
        let config = ReportConfig::default();
        let ctx = ReportContext::new(&table, &config);

        let spec = battery()
            .into_iter()
            .find(|spec| spec.name == "number_zr")
            .expect("number_zr report");
        let charts = build_charts(&spec, &ctx).expect("charts");
        assert_eq!(charts.len(), 1);
        let series = &charts[0].1.series;
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].name, "singleTransponder C50.0");
        assert_eq!(series[0].y, vec![4.0]);

        let spec = battery()
            .into_iter()
            .find(|spec| spec.name == "number_lr")
            .expect("number_lr report");
        assert!(matches!(
            build_charts(&spec, &ctx),
            Err(ReportError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn skews_are_never_averaged_together() {
        let mut table = UnifiedTable::default();
        table.push(row_at(TransponderPolicy::Single, 25.0, 10, &[("total_Cost", 100.0), ("ZR_NodeA", 1.0)]));
        table.push(row_at(TransponderPolicy::Single, 25.0, 10, &[("total_Cost", 100.0), ("ZR_NodeA", 1.0)]));
        table.push(row_at(TransponderPolicy::Single, 25.0, 20, &[("total_Cost", 100.0), ("ZR_NodeA", 1.0)]));
        table.push(row_at(TransponderPolicy::Single, 75.0, 10, &[("total_Cost", 300.0), ("ZR_NodeA", 5.0)]));
        let config = ReportConfig::default();
        let ctx = ReportContext::new(&table, &config);
        let spec_named = |name: &str| {
            battery()
                .into_iter()
                .find(|spec| spec.name == name)
                .expect("report in battery")
        };

        let charts = build_charts(&spec_named("total_cost"), &ctx).expect("charts");
        let series = &charts[0].1.series;
        let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["singleTransponder C25.0", "singleTransponder C75.0"]);
        assert_eq!(series[0].y, vec![100.0, 100.0]);
        assert_eq!(series[1].y, vec![300.0]);

        let charts = build_charts(&spec_named("missing_trials"), &ctx).expect("charts");
        let series = &charts[0].1.series;
        assert_eq!(series[0].y, vec![0.0, 1.0]);
        assert_eq!(series[1].y, vec![0.0]);

        let charts = build_charts(&spec_named("top_nodes_zr"), &ctx).expect("charts");
        let stems: Vec<&str> = charts.iter().map(|(stem, _)| stem.as_str()).collect();
        assert_eq!(
            stems,
            vec![
                "top_nodes_zr_singleTransponder_C25.0",
                "top_nodes_zr_singleTransponder_C75.0"
            ]
        );
        assert_eq!(charts[0].1.series[0].y, vec![3.0]);
        assert_eq!(charts[1].1.series[0].y, vec![5.0]);
    }
}
