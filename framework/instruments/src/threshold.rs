use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use gust_summary_model::{
    metric_names, MetricKind, MetricValues, SummaryData, ThresholdOutcome,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ThresholdError {
    #[error("Invalid threshold expression '{expr}': {reason}")]
    Parse { expr: String, reason: String },
    #[error("Aggregation '{aggregation}' cannot be used with {kind:?} metric '{metric}'")]
    NotApplicable {
        metric: String,
        aggregation: Aggregation,
        kind: MetricKind,
    },
    #[error("Unknown metric '{0}'")]
    UnknownMetric(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    Avg,
    Min,
    Max,
    Med,
    Percentile(f64),
    Rate,
    Count,
    Value,
}

impl Aggregation {
    pub fn applies_to(&self, kind: MetricKind) -> bool {
        match kind {
            MetricKind::Trend => matches!(
                self,
                Aggregation::Avg
                    | Aggregation::Min
                    | Aggregation::Max
                    | Aggregation::Med
                    | Aggregation::Percentile(_)
            ),
            MetricKind::Rate => matches!(self, Aggregation::Rate),
            MetricKind::Counter => matches!(self, Aggregation::Count | Aggregation::Rate),
            MetricKind::Gauge => matches!(self, Aggregation::Value),
        }
    }

    fn value_of(&self, values: &MetricValues) -> Option<f64> {
        match (self, values) {
            (Aggregation::Avg, MetricValues::Trend(t)) => Some(t.avg),
            (Aggregation::Min, MetricValues::Trend(t)) => Some(t.min),
            (Aggregation::Max, MetricValues::Trend(t)) => Some(t.max),
            (Aggregation::Med, MetricValues::Trend(t)) => Some(t.med),
            (Aggregation::Percentile(p), MetricValues::Trend(t)) => t.percentile(*p),
            (Aggregation::Rate, MetricValues::Rate(r)) => Some(r.rate),
            (Aggregation::Rate, MetricValues::Counter(c)) => Some(c.rate),
            (Aggregation::Count, MetricValues::Counter(c)) => Some(c.count),
            (Aggregation::Value, MetricValues::Gauge(g)) => Some(g.value),
            _ => None,
        }
    }
}

impl Display for Aggregation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Aggregation::Avg => write!(f, "avg"),
            Aggregation::Min => write!(f, "min"),
            Aggregation::Max => write!(f, "max"),
            Aggregation::Med => write!(f, "med"),
            Aggregation::Percentile(p) => write!(f, "p({p})"),
            Aggregation::Rate => write!(f, "rate"),
            Aggregation::Count => write!(f, "count"),
            Aggregation::Value => write!(f, "value"),
        }
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avg" => Ok(Aggregation::Avg),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "med" => Ok(Aggregation::Med),
            "rate" => Ok(Aggregation::Rate),
            "count" => Ok(Aggregation::Count),
            "value" => Ok(Aggregation::Value),
            other => {
                let p = other
                    .strip_prefix("p(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .ok_or_else(|| format!("unknown aggregation '{other}'"))?;
                let p = p
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| format!("invalid percentile '{p}': {e}"))?;
                if !(0.0..=100.0).contains(&p) {
                    return Err(format!("percentile {p} is not between 0 and 100"));
                }
                Ok(Aggregation::Percentile(p))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    // Longest operators first so that `<=` is not read as `<`
    const OPERATORS: [(&'static str, Comparison); 6] = [
        ("<=", Comparison::Le),
        (">=", Comparison::Ge),
        ("==", Comparison::Eq),
        ("!=", Comparison::Ne),
        ("<", Comparison::Lt),
        (">", Comparison::Gt),
    ];

    fn holds(&self, actual: f64, target: f64) -> bool {
        match self {
            Comparison::Lt => actual < target,
            Comparison::Le => actual <= target,
            Comparison::Gt => actual > target,
            Comparison::Ge => actual >= target,
            Comparison::Eq => actual == target,
            Comparison::Ne => actual != target,
        }
    }
}

/// A pass/fail condition over one aggregate of a metric, for example `avg < 2000` on
/// `http_req_duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    source: String,
    pub aggregation: Aggregation,
    pub comparison: Comparison,
    pub target: f64,
}

impl Threshold {
    /// The expression as it was written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check that this threshold can be evaluated against the named built-in metric.
    pub fn validate_for(&self, metric: &str) -> Result<(), ThresholdError> {
        let kind =
            builtin_metric_kind(metric).ok_or_else(|| ThresholdError::UnknownMetric(metric.to_string()))?;
        if !self.aggregation.applies_to(kind) {
            return Err(ThresholdError::NotApplicable {
                metric: metric.to_string(),
                aggregation: self.aggregation,
                kind,
            });
        }
        Ok(())
    }

    pub fn evaluate(&self, values: &MetricValues) -> Option<bool> {
        self.aggregation
            .value_of(values)
            .map(|actual| self.comparison.holds(actual, self.target))
    }
}

impl FromStr for Threshold {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = |reason: String| ThresholdError::Parse {
            expr: s.to_string(),
            reason,
        };

        let (index, op, comparison) = Comparison::OPERATORS
            .iter()
            .filter_map(|(op, comparison)| s.find(op).map(|index| (index, *op, *comparison)))
            .min_by_key(|(index, op, _)| (*index, std::cmp::Reverse(op.len())))
            .ok_or_else(|| parse_err("missing comparison operator".to_string()))?;

        let aggregation = s[..index].trim();
        if aggregation.is_empty() {
            return Err(parse_err("missing aggregation".to_string()));
        }
        let aggregation = aggregation.parse::<Aggregation>().map_err(parse_err)?;

        let target = s[index + op.len()..].trim();
        let target = target
            .parse::<f64>()
            .map_err(|e| parse_err(format!("invalid target '{target}': {e}")))?;

        Ok(Self {
            source: s.trim().to_string(),
            aggregation,
            comparison,
            target,
        })
    }
}

/// Kind of each metric that the runner records.
pub fn builtin_metric_kind(name: &str) -> Option<MetricKind> {
    match name {
        metric_names::CHECKS | metric_names::HTTP_REQ_FAILED => Some(MetricKind::Rate),
        metric_names::HTTP_REQ_DURATION
        | metric_names::ITERATION_DURATION
        | metric_names::GROUP_DURATION => Some(MetricKind::Trend),
        metric_names::HTTP_REQS
        | metric_names::ITERATIONS
        | metric_names::DATA_SENT
        | metric_names::DATA_RECEIVED => Some(MetricKind::Counter),
        metric_names::VUS_MAX => Some(MetricKind::Gauge),
        _ => None,
    }
}

/// Evaluate every threshold against the summary and store the outcome on the metric it belongs
/// to. Returns true if all thresholds passed.
pub fn evaluate_thresholds(
    summary: &mut SummaryData,
    thresholds: &BTreeMap<String, Vec<Threshold>>,
) -> bool {
    let mut all_passed = true;

    for (metric_name, metric_thresholds) in thresholds {
        let Some(metric) = summary.metrics.get_mut(metric_name) else {
            log::error!("Threshold configured for metric '{metric_name}' which was not recorded");
            all_passed = false;
            continue;
        };

        for threshold in metric_thresholds {
            let ok = match threshold.evaluate(&metric.values) {
                Some(ok) => ok,
                None => {
                    log::error!(
                        "Threshold '{}' cannot be evaluated on metric '{metric_name}'",
                        threshold.source()
                    );
                    false
                }
            };

            if !ok {
                log::warn!(
                    "Threshold '{}' on metric '{metric_name}' was breached",
                    threshold.source()
                );
                all_passed = false;
            }

            metric
                .thresholds
                .insert(threshold.source().to_string(), ThresholdOutcome { ok });
        }
    }

    all_passed
}
