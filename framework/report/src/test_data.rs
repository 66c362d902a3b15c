use std::collections::BTreeMap;

use gust_summary_model::{
    metric_names, CheckSummary, CounterValues, GroupSummary, MetricSummary, MetricValues,
    OperationSummary, RateValues, ScenarioSummary, SummaryData, ThresholdOutcome, TrendValues,
    ValueUnit,
};

pub(crate) fn sample_summary() -> SummaryData {
    let mut root_group = GroupSummary::root();
    let group = root_group.group_mut(&["postScenario".to_string()]);
    group.checks.push(CheckSummary {
        name: "Correct Status code is 201".to_string(),
        path: "::postScenario::Correct Status code is 201".to_string(),
        passes: 2,
        fails: 0,
    });
    group.checks.push(CheckSummary {
        name: "Response body field 'job' same with 'leader'".to_string(),
        path: "::postScenario::Response body field 'job' same with 'leader'".to_string(),
        passes: 1,
        fails: 1,
    });

    let mut failed = MetricSummary::new(
        MetricValues::Rate(RateValues::new(1, 1)),
        ValueUnit::Default,
    );
    failed
        .thresholds
        .insert("rate < 0.01".to_string(), ThresholdOutcome { ok: false });

    let mut duration = MetricSummary::new(
        MetricValues::Trend(TrendValues::from_samples(vec![100.0, 200.0])),
        ValueUnit::Time,
    );
    duration
        .thresholds
        .insert("avg < 2000".to_string(), ThresholdOutcome { ok: true });

    SummaryData {
        run_id: "sample-run".to_string(),
        test_name: "users_performance".to_string(),
        started_at: 1_700_000_000,
        duration_ms: 2500,
        scenarios: BTreeMap::from([(
            "default".to_string(),
            ScenarioSummary {
                executor: "shared-iterations: 2 iterations shared among 1 VUs".to_string(),
                vus: 1,
                iterations_completed: 2,
                iterations_interrupted: 0,
            },
        )]),
        root_group,
        metrics: BTreeMap::from([
            (metric_names::HTTP_REQ_DURATION.to_string(), duration),
            (metric_names::HTTP_REQ_FAILED.to_string(), failed),
            (
                metric_names::HTTP_REQS.to_string(),
                MetricSummary::new(
                    MetricValues::Counter(CounterValues {
                        count: 2.0,
                        rate: 0.8,
                    }),
                    ValueUnit::Default,
                ),
            ),
            (
                metric_names::CHECKS.to_string(),
                MetricSummary::new(
                    MetricValues::Rate(RateValues::new(3, 1)),
                    ValueUnit::Default,
                ),
            ),
        ]),
        operations: vec![OperationSummary {
            operation_id: "POST /api/users".to_string(),
            total_operations: 2,
            failed_operations: 1,
            avg_time_ms: 150.0,
            min_time_ms: 100.0,
            max_time_ms: 100.0,
            total_duration_ms: 300.0,
        }],
    }
}
