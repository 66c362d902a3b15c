mod record;
mod report;
mod threshold;

pub use record::{CheckRecord, GroupRecord, IterationRecord, OperationRecord, Tags};
pub use report::{Reporter, RunMeta};
pub use threshold::{
    builtin_metric_kind, evaluate_thresholds, Aggregation, Comparison, Threshold, ThresholdError,
};
