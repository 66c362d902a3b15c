use gust_summary_model::OperationSummary;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
pub struct OperationRow {
    pub operation_id: String,
    #[tabled(display = "float2")]
    pub avg_time_ms: f64,
    #[tabled(display = "float2")]
    pub min_time_ms: f64,
    #[tabled(display = "float2")]
    pub max_time_ms: f64,
    pub total_operations: usize,
    pub failed_operations: usize,
    #[tabled(display = "float2")]
    pub total_duration_ms: f64,
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}

impl From<&OperationSummary> for OperationRow {
    fn from(op: &OperationSummary) -> Self {
        Self {
            operation_id: op.operation_id.clone(),
            avg_time_ms: op.avg_time_ms,
            min_time_ms: op.min_time_ms,
            max_time_ms: op.max_time_ms,
            total_operations: op.total_operations,
            failed_operations: op.failed_operations,
            total_duration_ms: op.total_duration_ms,
        }
    }
}

/// Render the per operation breakdown as a terminal table.
pub(crate) fn operations_table(operations: &[OperationSummary]) -> String {
    let mut table = Table::new(operations.iter().map(OperationRow::from));
    table.with(Style::modern());
    table.to_string()
}
