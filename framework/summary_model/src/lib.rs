use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Names of the metrics that the runner always records.
pub mod metric_names {
    pub const CHECKS: &str = "checks";
    pub const DATA_RECEIVED: &str = "data_received";
    pub const DATA_SENT: &str = "data_sent";
    pub const GROUP_DURATION: &str = "group_duration";
    pub const HTTP_REQ_DURATION: &str = "http_req_duration";
    pub const HTTP_REQ_FAILED: &str = "http_req_failed";
    pub const HTTP_REQS: &str = "http_reqs";
    pub const ITERATION_DURATION: &str = "iteration_duration";
    pub const ITERATIONS: &str = "iterations";
    pub const VUS_MAX: &str = "vus_max";
}

/// Aggregate produced at the end of a run and handed to the summary hook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryData {
    /// The unique run id
    ///
    /// Chosen by the runner. Unique for each run.
    pub run_id: String,
    /// The name of the test definition that was run
    pub test_name: String,
    /// The time the run started
    ///
    /// This is a Unix timestamp in seconds.
    pub started_at: i64,
    /// Wall clock time from the first virtual user starting to the last one stopping
    pub duration_ms: u64,
    /// How each named scenario was executed
    pub scenarios: BTreeMap<String, ScenarioSummary>,
    /// Checks, nested by the groups they were recorded in
    pub root_group: GroupSummary,
    /// Aggregated metrics, keyed by metric name. See [metric_names].
    pub metrics: BTreeMap<String, MetricSummary>,
    /// Per operation breakdown of request timings, for example `POST /api/users`
    pub operations: Vec<OperationSummary>,
}

impl SummaryData {
    pub fn metric(&self, name: &str) -> Option<&MetricSummary> {
        self.metrics.get(name)
    }

    /// True if no threshold configured on any metric was breached.
    pub fn thresholds_passed(&self) -> bool {
        self.metrics
            .values()
            .flat_map(|metric| metric.thresholds.values())
            .all(|outcome| outcome.ok)
    }

    /// Threshold expressions that were breached, as `(metric, expression)` pairs.
    pub fn breached_thresholds(&self) -> Vec<(&str, &str)> {
        self.metrics
            .iter()
            .flat_map(|(name, metric)| {
                metric
                    .thresholds
                    .iter()
                    .filter(|(_, outcome)| !outcome.ok)
                    .map(move |(expr, _)| (name.as_str(), expr.as_str()))
            })
            .collect()
    }

    /// Total passing and failing checks across every group.
    pub fn check_totals(&self) -> (u64, u64) {
        self.root_group
            .all_checks()
            .fold((0, 0), |(passes, fails), check| {
                (passes + check.passes, fails + check.fails)
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioSummary {
    /// Human readable description of the executor, for example `constant-vus`
    pub executor: String,
    pub vus: usize,
    pub iterations_completed: u64,
    /// Iterations that ended with an error rather than running to completion
    pub iterations_interrupted: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupSummary {
    /// Group name, empty for the root group
    pub name: String,
    /// `::` separated path from the root, for example `::postScenario`
    pub path: String,
    pub checks: Vec<CheckSummary>,
    pub groups: Vec<GroupSummary>,
}

impl GroupSummary {
    pub fn root() -> Self {
        Self::default()
    }

    /// Find the group at `path` below this one, creating any missing groups on the way.
    pub fn group_mut(&mut self, path: &[String]) -> &mut GroupSummary {
        let Some((first, rest)) = path.split_first() else {
            return self;
        };

        let index = match self.groups.iter().position(|g| &g.name == first) {
            Some(index) => index,
            None => {
                self.groups.push(GroupSummary {
                    name: first.clone(),
                    path: format!("{}::{}", self.path, first),
                    checks: Vec::new(),
                    groups: Vec::new(),
                });
                self.groups.len() - 1
            }
        };

        self.groups[index].group_mut(rest)
    }

    /// Every check in this group and its sub-groups, depth first.
    pub fn all_checks(&self) -> Box<dyn Iterator<Item = &CheckSummary> + '_> {
        Box::new(
            self.checks
                .iter()
                .chain(self.groups.iter().flat_map(|g| g.all_checks())),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckSummary {
    pub name: String,
    pub path: String,
    pub passes: u64,
    pub fails: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Trend,
    Rate,
    Counter,
    Gauge,
}

/// What a metric's values measure, used to pick a display unit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueUnit {
    #[default]
    Default,
    /// Milliseconds
    Time,
    /// Bytes
    Data,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricSummary {
    pub values: MetricValues,
    #[serde(default)]
    pub contains: ValueUnit,
    /// Threshold expression to outcome. Empty if no thresholds were configured for the metric.
    #[serde(default)]
    pub thresholds: BTreeMap<String, ThresholdOutcome>,
}

impl MetricSummary {
    pub fn new(values: MetricValues, contains: ValueUnit) -> Self {
        Self {
            values,
            contains,
            thresholds: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.values.kind()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricValues {
    Trend(TrendValues),
    Rate(RateValues),
    Counter(CounterValues),
    Gauge(GaugeValues),
}

impl MetricValues {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValues::Trend(_) => MetricKind::Trend,
            MetricValues::Rate(_) => MetricKind::Rate,
            MetricValues::Counter(_) => MetricKind::Counter,
            MetricValues::Gauge(_) => MetricKind::Gauge,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrendValues {
    pub avg: f64,
    pub min: f64,
    pub med: f64,
    pub max: f64,
    pub p90: f64,
    pub p95: f64,
    /// The raw samples are kept so that arbitrary percentiles can be evaluated by thresholds
    #[serde(skip)]
    pub samples: Vec<f64>,
}

impl TrendValues {
    /// Build trend values from unsorted samples.
    pub fn from_samples(mut samples: Vec<f64>) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        samples.sort_by(f64::total_cmp);
        let sum: f64 = samples.iter().sum();

        Self {
            avg: sum / samples.len() as f64,
            min: samples[0],
            med: percentile_of_sorted(&samples, 50.0),
            max: samples[samples.len() - 1],
            p90: percentile_of_sorted(&samples, 90.0),
            p95: percentile_of_sorted(&samples, 95.0),
            samples,
        }
    }

    /// Percentile over the raw samples. When the samples are not available (for example after
    /// deserializing) only the stored percentiles can be answered, anything else is `None`.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if !self.samples.is_empty() {
            return Some(percentile_of_sorted(&self.samples, p));
        }

        match p {
            p if p == 50.0 => Some(self.med),
            p if p == 90.0 => Some(self.p90),
            p if p == 95.0 => Some(self.p95),
            p if p >= 100.0 => Some(self.max),
            p if p <= 0.0 => Some(self.min),
            _ => None,
        }
    }
}

/// Linear interpolation between closest ranks.
fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RateValues {
    /// Fraction of samples that were `true`
    pub rate: f64,
    pub passes: u64,
    pub fails: u64,
}

impl RateValues {
    pub fn new(passes: u64, fails: u64) -> Self {
        let total = passes + fails;
        Self {
            rate: if total == 0 {
                0.0
            } else {
                passes as f64 / total as f64
            },
            passes,
            fails,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CounterValues {
    pub count: f64,
    /// Count per second of run time
    pub rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GaugeValues {
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThresholdOutcome {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationSummary {
    pub operation_id: String,
    pub total_operations: usize,
    pub failed_operations: usize,
    pub avg_time_ms: f64,
    pub min_time_ms: f64,
    pub max_time_ms: f64,
    pub total_duration_ms: f64,
}

/// Serialize the summary to a writer as JSON
pub fn store_summary<W: Write>(summary: &SummaryData, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, summary)?;
    Ok(())
}

/// Load a summary from a reader
pub fn load_summary<R: Read>(reader: R) -> anyhow::Result<SummaryData> {
    let reader = std::io::BufReader::new(reader);
    let summary: SummaryData = serde_json::from_reader(reader)?;
    Ok(summary)
}
