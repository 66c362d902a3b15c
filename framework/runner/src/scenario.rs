use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::GustScenarioCli;

/// Iteration based scenarios give up after this long unless configured otherwise.
const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(10 * 60);

/// How the virtual users of a scenario are scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioExecutor {
    /// A fixed number of virtual users loop over the entry point for a fixed duration.
    ConstantVus { vus: usize, duration: Duration },
    /// A fixed number of virtual users share a total number of iterations between them.
    SharedIterations {
        vus: usize,
        iterations: u64,
        max_duration: Duration,
    },
    /// Every virtual user runs the entry point a fixed number of times.
    PerVuIterations {
        vus: usize,
        iterations: u64,
        max_duration: Duration,
    },
}

impl ScenarioExecutor {
    pub fn constant_vus(vus: usize, duration: Duration) -> Self {
        ScenarioExecutor::ConstantVus { vus, duration }
    }

    pub fn shared_iterations(vus: usize, iterations: u64) -> Self {
        ScenarioExecutor::SharedIterations {
            vus,
            iterations,
            max_duration: DEFAULT_MAX_DURATION,
        }
    }

    pub fn per_vu_iterations(vus: usize, iterations: u64) -> Self {
        ScenarioExecutor::PerVuIterations {
            vus,
            iterations,
            max_duration: DEFAULT_MAX_DURATION,
        }
    }

    /// Bound the run time of an iteration based scenario. Has no effect on constant VUs, which
    /// are already bounded by their duration.
    pub fn with_max_duration(mut self, limit: Duration) -> Self {
        match &mut self {
            ScenarioExecutor::ConstantVus { .. } => {}
            ScenarioExecutor::SharedIterations { max_duration, .. }
            | ScenarioExecutor::PerVuIterations { max_duration, .. } => *max_duration = limit,
        }
        self
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioExecutor::ConstantVus { .. } => "constant-vus",
            ScenarioExecutor::SharedIterations { .. } => "shared-iterations",
            ScenarioExecutor::PerVuIterations { .. } => "per-vu-iterations",
        }
    }

    pub fn vus(&self) -> usize {
        match self {
            ScenarioExecutor::ConstantVus { vus, .. }
            | ScenarioExecutor::SharedIterations { vus, .. }
            | ScenarioExecutor::PerVuIterations { vus, .. } => *vus,
        }
    }

    /// Latest point, relative to the start of the run, at which a virtual user may begin an
    /// iteration.
    pub fn time_limit(&self) -> Duration {
        match self {
            ScenarioExecutor::ConstantVus { duration, .. } => *duration,
            ScenarioExecutor::SharedIterations { max_duration, .. }
            | ScenarioExecutor::PerVuIterations { max_duration, .. } => *max_duration,
        }
    }

    /// Total iterations this scenario will run, if it is iteration based.
    pub fn total_iterations(&self) -> Option<u64> {
        match self {
            ScenarioExecutor::ConstantVus { .. } => None,
            ScenarioExecutor::SharedIterations { iterations, .. } => Some(*iterations),
            ScenarioExecutor::PerVuIterations {
                vus, iterations, ..
            } => Some(iterations.saturating_mul(*vus as u64)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ScenarioExecutor::ConstantVus { vus, duration } => format!(
                "{vus} looping VUs for {}s ({})",
                duration.as_secs(),
                self.name()
            ),
            ScenarioExecutor::SharedIterations {
                vus,
                iterations,
                max_duration,
            } => format!(
                "{iterations} iterations shared among {vus} VUs (maxDuration: {}s, {})",
                max_duration.as_secs(),
                self.name()
            ),
            ScenarioExecutor::PerVuIterations {
                vus,
                iterations,
                max_duration,
            } => format!(
                "{iterations} iterations for each of {vus} VUs (maxDuration: {}s, {})",
                max_duration.as_secs(),
                self.name()
            ),
        }
    }

    /// Apply the command line overrides that target this scenario.
    pub(crate) fn with_overrides(mut self, name: &str, cli: &GustScenarioCli) -> Self {
        let vus_override = cli
            .scenario_vus
            .iter()
            .rev()
            .find(|(scenario, _)| scenario == name)
            .map(|(_, count)| *count)
            .or(cli.vus);

        match &mut self {
            ScenarioExecutor::ConstantVus { vus, duration } => {
                if let Some(v) = vus_override {
                    *vus = v;
                }
                if let Some(d) = cli.duration {
                    *duration = Duration::from_secs(d);
                }
            }
            ScenarioExecutor::SharedIterations {
                vus, iterations, ..
            }
            | ScenarioExecutor::PerVuIterations {
                vus, iterations, ..
            } => {
                if let Some(v) = vus_override {
                    *vus = v;
                }
                if let Some(i) = cli.iterations {
                    *iterations = i;
                }
            }
        }

        self
    }

    /// Create the iteration allowance for the virtual users of this scenario. Shared iterations use
    /// one counter across all of them.
    pub(crate) fn iteration_budget(&self) -> IterationBudget {
        match self {
            ScenarioExecutor::ConstantVus { .. } => IterationBudget::Unbounded,
            ScenarioExecutor::SharedIterations { iterations, .. } => IterationBudget::Shared {
                claimed: Arc::new(AtomicU64::new(0)),
                total: *iterations,
            },
            ScenarioExecutor::PerVuIterations { iterations, .. } => {
                IterationBudget::PerVu { remaining: *iterations }
            }
        }
    }
}

/// Decides whether a virtual user may start another iteration.
#[derive(Debug, Clone)]
pub(crate) enum IterationBudget {
    Unbounded,
    Shared { claimed: Arc<AtomicU64>, total: u64 },
    PerVu { remaining: u64 },
}

impl IterationBudget {
    pub(crate) fn try_claim(&mut self) -> bool {
        match self {
            IterationBudget::Unbounded => true,
            IterationBudget::Shared { claimed, total } => {
                claimed.fetch_add(1, Ordering::SeqCst) < *total
            }
            IterationBudget::PerVu { remaining } => {
                if *remaining == 0 {
                    false
                } else {
                    *remaining -= 1;
                    true
                }
            }
        }
    }
}
