/// Recommended error type for your scenario `main` function and any shared behaviour code that you
/// write for hooks. This type is compatible with the [crate::definition::HookResult] type so you can
/// use `?` to propagate errors.
pub type GustResult<T> = anyhow::Result<T>;

/// Returned from a scenario `main` when the run completed but one or more thresholds failed, so that
/// the process exits with an error.
#[derive(derive_more::Error, derive_more::Display, Debug)]
#[display("Thresholds breached: {}", breached.join(", "))]
pub struct ThresholdsBreachedError {
    breached: Vec<String>,
}

impl ThresholdsBreachedError {
    pub fn new(breached: Vec<String>) -> Self {
        Self { breached }
    }
}
