use gust_instruments::CheckRecord;

use crate::context::{AgentContext, UserValuesConstraint};
use crate::types::GustResult;

/// Records labelled pass/fail assertions against the run.
///
/// Implemented by [AgentContext] so that assertions written against this trait can be used from any
/// behaviour, and by test doubles so they can be exercised without a run.
pub trait CheckRecorder {
    fn record_check(&self, name: &str, passed: bool);

    /// Evaluate `predicate` and record its outcome under `name`.
    ///
    /// If the predicate itself fails, nothing is recorded and the error is returned to the caller,
    /// which normally ends the iteration.
    fn check<F>(&self, name: &str, predicate: F) -> GustResult<bool>
    where
        F: FnOnce() -> GustResult<bool>,
    {
        let passed = predicate()?;
        self.record_check(name, passed);
        Ok(passed)
    }
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> CheckRecorder for AgentContext<RV, V> {
    fn record_check(&self, name: &str, passed: bool) {
        self.runner_context().reporter().add_check(CheckRecord {
            name: name.to_string(),
            tags: self.tags(),
            passed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorded(RefCell<Vec<(String, bool)>>);

    impl CheckRecorder for Recorded {
        fn record_check(&self, name: &str, passed: bool) {
            self.0.borrow_mut().push((name.to_string(), passed));
        }
    }

    #[test]
    fn outcome_is_recorded() {
        let recorded = Recorded::default();

        assert!(recorded.check("always", || Ok(true)).unwrap());
        assert!(!recorded.check("never", || Ok(false)).unwrap());

        assert_eq!(
            vec![("always".to_string(), true), ("never".to_string(), false)],
            *recorded.0.borrow()
        );
    }

    #[test]
    fn failing_predicate_records_nothing() {
        let recorded = Recorded::default();

        let result = recorded.check("broken", || Err(anyhow::anyhow!("boom")));

        assert!(result.is_err());
        assert!(recorded.0.borrow().is_empty());
    }
}
