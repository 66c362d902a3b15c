use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use gust_summary_model::{
    metric_names, CheckSummary, CounterValues, GaugeValues, GroupSummary, MetricSummary,
    MetricValues, OperationSummary, RateValues, ScenarioSummary, SummaryData, TrendValues,
    ValueUnit,
};
use parking_lot::Mutex;

use crate::record::{CheckRecord, GroupRecord, IterationRecord, OperationRecord};

/// Facts about the run that the reporter cannot observe itself.
#[derive(Debug, Clone)]
pub struct RunMeta {
    pub run_id: String,
    pub test_name: String,
    pub started_at: i64,
    pub duration: Duration,
    /// Scenario name to `(executor description, virtual users)`
    pub scenarios: BTreeMap<String, (String, usize)>,
}

/// Keeps every measurement of a run in memory and aggregates them into [SummaryData] once the
/// run is over.
///
/// Shared between all virtual users, so every method takes `&self`.
#[derive(Default)]
pub struct Reporter {
    state: Mutex<ReporterState>,
}

#[derive(Default)]
struct ReporterState {
    operations: Vec<OperationRecord>,
    // Checks keep the order they were first seen in
    checks: Vec<CheckTally>,
    check_index: HashMap<(Vec<String>, String), usize>,
    iterations: Vec<IterationRecord>,
    groups: Vec<GroupRecord>,
    vus_max: usize,
}

struct CheckTally {
    name: String,
    group_path: Vec<String>,
    passes: u64,
    fails: u64,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_operation(&self, operation_record: OperationRecord) {
        if operation_record.elapsed.is_none() {
            log::warn!(
                "Dropping unfinished operation record: {}",
                operation_record.operation_id
            );
            return;
        }

        self.state.lock().operations.push(operation_record);
    }

    pub fn add_check(&self, check_record: CheckRecord) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let CheckRecord { name, tags, passed } = check_record;
        let key = (tags.group_path, name);

        let index = match state.check_index.get(&key) {
            Some(index) => *index,
            None => {
                let index = state.checks.len();
                state.checks.push(CheckTally {
                    name: key.1.clone(),
                    group_path: key.0.clone(),
                    passes: 0,
                    fails: 0,
                });
                state.check_index.insert(key, index);
                index
            }
        };

        let tally = &mut state.checks[index];
        if passed {
            tally.passes += 1;
        } else {
            tally.fails += 1;
        }
    }

    pub fn add_iteration(&self, iteration_record: IterationRecord) {
        self.state.lock().iterations.push(iteration_record);
    }

    pub fn add_group_duration(&self, group_record: GroupRecord) {
        self.state.lock().groups.push(group_record);
    }

    /// Record that `vus` virtual users have been started in total.
    pub fn set_vus_max(&self, vus: usize) {
        let mut state = self.state.lock();
        state.vus_max = state.vus_max.max(vus);
    }

    pub fn operation_count(&self) -> usize {
        self.state.lock().operations.len()
    }

    /// Aggregate everything recorded so far.
    pub fn summarize(&self, meta: RunMeta) -> SummaryData {
        let state = self.state.lock();
        let duration_s = meta.duration.as_secs_f64();

        let mut metrics = BTreeMap::new();

        let (check_passes, check_fails) = state
            .checks
            .iter()
            .fold((0, 0), |(p, f), c| (p + c.passes, f + c.fails));
        metrics.insert(
            metric_names::CHECKS.to_string(),
            MetricSummary::new(
                MetricValues::Rate(RateValues::new(check_passes, check_fails)),
                ValueUnit::Default,
            ),
        );

        let failed_requests = state.operations.iter().filter(|op| op.is_error).count() as u64;
        metrics.insert(
            metric_names::HTTP_REQ_FAILED.to_string(),
            MetricSummary::new(
                MetricValues::Rate(RateValues::new(
                    failed_requests,
                    state.operations.len() as u64 - failed_requests,
                )),
                ValueUnit::Default,
            ),
        );
        metrics.insert(
            metric_names::HTTP_REQ_DURATION.to_string(),
            trend(
                state
                    .operations
                    .iter()
                    .filter_map(|op| op.duration())
                    .map(as_ms)
                    .collect(),
            ),
        );
        metrics.insert(
            metric_names::HTTP_REQS.to_string(),
            counter(state.operations.len() as f64, duration_s, ValueUnit::Default),
        );
        metrics.insert(
            metric_names::DATA_SENT.to_string(),
            counter(
                state.operations.iter().map(|op| op.bytes_sent).sum::<u64>() as f64,
                duration_s,
                ValueUnit::Data,
            ),
        );
        metrics.insert(
            metric_names::DATA_RECEIVED.to_string(),
            counter(
                state
                    .operations
                    .iter()
                    .map(|op| op.bytes_received)
                    .sum::<u64>() as f64,
                duration_s,
                ValueUnit::Data,
            ),
        );

        let completed = state.iterations.iter().filter(|i| !i.interrupted).count();
        metrics.insert(
            metric_names::ITERATIONS.to_string(),
            counter(completed as f64, duration_s, ValueUnit::Default),
        );
        metrics.insert(
            metric_names::ITERATION_DURATION.to_string(),
            trend(state.iterations.iter().map(|i| as_ms(i.elapsed)).collect()),
        );
        metrics.insert(
            metric_names::GROUP_DURATION.to_string(),
            trend(state.groups.iter().map(|g| as_ms(g.elapsed)).collect()),
        );
        metrics.insert(
            metric_names::VUS_MAX.to_string(),
            MetricSummary::new(
                MetricValues::Gauge(GaugeValues {
                    value: state.vus_max as f64,
                    min: state.vus_max as f64,
                    max: state.vus_max as f64,
                }),
                ValueUnit::Default,
            ),
        );

        let scenarios = meta
            .scenarios
            .into_iter()
            .map(|(name, (executor, vus))| {
                let (iterations_completed, iterations_interrupted) = state
                    .iterations
                    .iter()
                    .filter(|i| i.scenario == name)
                    .fold((0, 0), |(c, i), it| {
                        if it.interrupted {
                            (c, i + 1)
                        } else {
                            (c + 1, i)
                        }
                    });

                (
                    name,
                    ScenarioSummary {
                        executor,
                        vus,
                        iterations_completed,
                        iterations_interrupted,
                    },
                )
            })
            .collect();

        let mut root_group = GroupSummary::root();
        for tally in &state.checks {
            let group = root_group.group_mut(&tally.group_path);
            let path = group.path.clone();
            group.checks.push(CheckSummary {
                name: tally.name.clone(),
                path: format!("{}::{}", path, tally.name),
                passes: tally.passes,
                fails: tally.fails,
            });
        }
        // Groups with timings but no checks still belong in the tree
        for group in &state.groups {
            root_group.group_mut(&group.tags.group_path);
        }

        SummaryData {
            run_id: meta.run_id,
            test_name: meta.test_name,
            started_at: meta.started_at,
            duration_ms: meta.duration.as_millis() as u64,
            scenarios,
            root_group,
            metrics,
            operations: summarize_operations(&state.operations),
        }
    }
}

fn summarize_operations(operation_records: &[OperationRecord]) -> Vec<OperationSummary> {
    let mut rows = operation_records
        .iter()
        .fold(HashMap::<&str, Vec<&OperationRecord>>::new(), |mut acc, record| {
            acc.entry(record.operation_id.as_str())
                .or_default()
                .push(record);
            acc
        })
        .into_iter()
        .map(|(operation_id, operations)| {
            let total_operations = operations.len();
            let durations_ms = operations
                .iter()
                .filter_map(|op| op.duration())
                .map(as_ms)
                .collect::<Vec<_>>();
            let total_duration_ms = durations_ms.iter().sum::<f64>();

            // Min and max describe successful requests where there are any
            let successful_ms = operations
                .iter()
                .filter(|op| !op.is_error)
                .filter_map(|op| op.duration())
                .map(as_ms)
                .collect::<Vec<_>>();
            let range_source = if successful_ms.is_empty() {
                &durations_ms
            } else {
                &successful_ms
            };

            OperationSummary {
                operation_id: operation_id.to_string(),
                total_operations,
                failed_operations: operations.iter().filter(|op| op.is_error).count(),
                avg_time_ms: total_duration_ms / total_operations as f64,
                min_time_ms: range_source.iter().copied().reduce(f64::min).unwrap_or(0.0),
                max_time_ms: range_source.iter().copied().reduce(f64::max).unwrap_or(0.0),
                total_duration_ms,
            }
        })
        .collect::<Vec<_>>();

    rows.sort_by(|a, b| a.operation_id.cmp(&b.operation_id));
    rows
}

fn as_ms(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}

fn trend(samples: Vec<f64>) -> MetricSummary {
    MetricSummary::new(
        MetricValues::Trend(TrendValues::from_samples(samples)),
        ValueUnit::Time,
    )
}

fn counter(count: f64, duration_s: f64, contains: ValueUnit) -> MetricSummary {
    MetricSummary::new(
        MetricValues::Counter(CounterValues {
            count,
            rate: if duration_s > 0.0 {
                count / duration_s
            } else {
                0.0
            },
        }),
        contains,
    )
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("operations", &self.operation_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Tags;
    use pretty_assertions::assert_eq;

    fn check(name: &str, tags: &Tags, passed: bool) -> CheckRecord {
        CheckRecord {
            name: name.to_string(),
            tags: tags.clone(),
            passed,
        }
    }

    fn meta() -> RunMeta {
        RunMeta {
            run_id: "test-run".to_string(),
            test_name: "reporter_test".to_string(),
            started_at: 0,
            duration: Duration::from_secs(2),
            scenarios: BTreeMap::from([("post".to_string(), ("constant-vus".to_string(), 2))]),
        }
    }

    #[test]
    fn summarize_http_metrics() {
        let reporter = Reporter::new();
        let tags = Tags::new("post");
        reporter.add_operation(OperationRecord::completed(
            "POST /api/users",
            tags.clone(),
            Duration::from_millis(100),
            Some(201),
        ));
        reporter.add_operation(OperationRecord::completed(
            "POST /api/users",
            tags.clone(),
            Duration::from_millis(300),
            Some(500),
        ));

        let summary = reporter.summarize(meta());

        let MetricValues::Trend(duration) = &summary.metrics["http_req_duration"].values else {
            panic!("http_req_duration should be a trend");
        };
        assert_eq!(200.0, duration.avg);

        let MetricValues::Rate(failed) = &summary.metrics["http_req_failed"].values else {
            panic!("http_req_failed should be a rate");
        };
        assert_eq!(0.5, failed.rate);

        let MetricValues::Counter(reqs) = &summary.metrics["http_reqs"].values else {
            panic!("http_reqs should be a counter");
        };
        assert_eq!(2.0, reqs.count);
        assert_eq!(1.0, reqs.rate);

        assert_eq!(1, summary.operations.len());
        let op = &summary.operations[0];
        assert_eq!(2, op.total_operations);
        assert_eq!(1, op.failed_operations);
        assert_eq!(100.0, op.min_time_ms);
        assert_eq!(100.0, op.max_time_ms);
    }

    #[test]
    fn checks_are_tallied_per_group_in_first_seen_order() {
        let reporter = Reporter::new();
        let root = Tags::new("default");
        let grouped = Tags::new("default").with_group("postScenario");

        reporter.add_check(check("Correct Status code is 201", &grouped, true));
        reporter.add_check(check("Correct Status code is 201", &grouped, false));
        reporter.add_check(check("Headers Match Expected Values", &root, true));
        reporter.add_check(check("Correct Status code is 201", &grouped, true));

        let summary = reporter.summarize(meta());

        assert_eq!(1, summary.root_group.checks.len());
        assert_eq!(
            "::Headers Match Expected Values",
            summary.root_group.checks[0].path
        );
        let group = &summary.root_group.groups[0];
        assert_eq!("postScenario", group.name);
        assert_eq!(2, group.checks[0].passes);
        assert_eq!(1, group.checks[0].fails);
        assert_eq!((3, 1), summary.check_totals());

        let MetricValues::Rate(checks) = &summary.metrics["checks"].values else {
            panic!("checks should be a rate");
        };
        assert_eq!(0.75, checks.rate);
    }

    #[test]
    fn iterations_are_counted_per_scenario() {
        let reporter = Reporter::new();
        for interrupted in [false, false, true] {
            reporter.add_iteration(IterationRecord {
                scenario: "post".to_string(),
                elapsed: Duration::from_millis(10),
                interrupted,
            });
        }

        let summary = reporter.summarize(meta());

        let scenario = &summary.scenarios["post"];
        assert_eq!(2, scenario.iterations_completed);
        assert_eq!(1, scenario.iterations_interrupted);
        let MetricValues::Counter(iterations) = &summary.metrics["iterations"].values else {
            panic!("iterations should be a counter");
        };
        assert_eq!(2.0, iterations.count);
    }

    #[test]
    fn unfinished_operations_are_dropped() {
        let reporter = Reporter::new();
        reporter.add_operation(OperationRecord::new("GET /", Tags::new("default")));
        assert_eq!(0, reporter.operation_count());
    }
}
