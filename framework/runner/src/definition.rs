use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use gust_instruments::Threshold;
use gust_summary_model::SummaryData;

use crate::cli::GustScenarioCli;
use crate::context::{AgentContext, RunnerContext, UserValuesConstraint};
use crate::scenario::ScenarioExecutor;

pub type HookResult = anyhow::Result<()>;

pub type GlobalHookMut<RV> = fn(&mut RunnerContext<RV>) -> HookResult;
pub type GlobalHook<RV> = fn(Arc<RunnerContext<RV>>) -> HookResult;
pub type AgentHookMut<RV, V> = fn(&mut AgentContext<RV, V>) -> HookResult;

/// Artefact name to content. The names `stdout` and `stderr` are written to those streams, any
/// other name is a file path relative to the summary directory.
pub type SummaryOutputs = BTreeMap<String, String>;
pub type SummaryHook = fn(&SummaryData) -> anyhow::Result<SummaryOutputs>;

/// The builder for a scenario definition.
///
/// This must be used at the start of a test to define the scenarios that you want to run.
pub struct ScenarioDefinitionBuilder<RV: UserValuesConstraint, V: UserValuesConstraint> {
    /// The name of the test, which should be unique within the test suite.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    /// Command line configuration, which can override parts of the definition.
    cli: GustScenarioCli,
    /// Base URL to use when none is given on the command line.
    default_base_url: Option<String>,
    /// Global setup hook for this test. It will be run once, before any virtual users are started.
    setup_fn: Option<GlobalHookMut<RV>>,
    /// Setup hook for a virtual user, which will be run once for each virtual user as it starts.
    setup_agent_fn: Option<AgentHookMut<RV, V>>,
    /// Named scenarios. Each one has its own executor and entry point and all of them run at the
    /// same time.
    scenarios: BTreeMap<String, (ScenarioExecutor, AgentHookMut<RV, V>)>,
    /// Teardown hook for a virtual user, run once after it stops iterating.
    teardown_agent_fn: Option<AgentHookMut<RV, V>>,
    /// Global teardown hook, run once after every virtual user has stopped. Best effort, a failure
    /// is logged and does not fail the run.
    teardown_fn: Option<GlobalHook<RV>>,
    /// Metric name to threshold expressions, for example `http_req_duration` and `avg < 2000`.
    thresholds: Vec<(String, String)>,
    /// Turns the aggregated results into output artefacts. Called exactly once, after all
    /// scenarios have finished.
    summary_fn: Option<SummaryHook>,
}

/// A validated, immutable description of a run. Produced by [ScenarioDefinitionBuilder::build].
pub struct ScenarioDefinition<RV: UserValuesConstraint, V: UserValuesConstraint> {
    pub name: String,
    pub base_url: String,
    pub scenarios: Vec<ScenarioConfig<RV, V>>,
    pub thresholds: BTreeMap<String, Vec<Threshold>>,
    pub setup_fn: Option<GlobalHookMut<RV>>,
    pub setup_agent_fn: Option<AgentHookMut<RV, V>>,
    pub teardown_agent_fn: Option<AgentHookMut<RV, V>>,
    pub teardown_fn: Option<GlobalHook<RV>>,
    pub summary_fn: Option<SummaryHook>,
    pub summary_dir: PathBuf,
    pub run_id: Option<String>,
    pub no_progress: bool,
}

pub struct ScenarioConfig<RV: UserValuesConstraint, V: UserValuesConstraint> {
    pub name: String,
    pub executor: ScenarioExecutor,
    pub behaviour: AgentHookMut<RV, V>,
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> ScenarioDefinitionBuilder<RV, V> {
    /// Initialise a new scenario definition from the test name and command line arguments.
    /// See the [ScenarioDefinitionBuilder::name] for more information about the name.
    pub fn new(name: &str, cli: GustScenarioCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            default_base_url: None,
            setup_fn: None,
            setup_agent_fn: None,
            scenarios: BTreeMap::new(),
            teardown_agent_fn: None,
            teardown_fn: None,
            thresholds: Vec::new(),
            summary_fn: None,
        }
    }

    /// Parse the command line and initialise logging, then create the builder.
    pub fn new_with_init(name: &str) -> Self {
        Self::new(name, crate::init::init())
    }

    /// Base URL to target unless `--base-url` is given.
    pub fn with_default_base_url(mut self, base_url: &str) -> Self {
        self.default_base_url = Some(base_url.to_string());
        self
    }

    /// Set the global setup hook [ScenarioDefinitionBuilder::setup_fn] for this test.
    pub fn use_setup(mut self, setup_fn: GlobalHookMut<RV>) -> Self {
        self.setup_fn = Some(setup_fn);
        self
    }

    /// Set the virtual user setup hook [ScenarioDefinitionBuilder::setup_agent_fn].
    pub fn use_agent_setup(mut self, setup_agent_fn: AgentHookMut<RV, V>) -> Self {
        self.setup_agent_fn = Some(setup_agent_fn);
        self
    }

    /// Set the entry point of the `default` scenario.
    pub fn use_agent_behaviour(
        self,
        executor: ScenarioExecutor,
        behaviour: AgentHookMut<RV, V>,
    ) -> Self {
        self.use_named_agent_behaviour("default", executor, behaviour)
    }

    /// Add a named scenario with its own executor and entry point.
    pub fn use_named_agent_behaviour(
        mut self,
        name: &str,
        executor: ScenarioExecutor,
        behaviour: AgentHookMut<RV, V>,
    ) -> Self {
        let previous = self
            .scenarios
            .insert(name.to_string(), (executor, behaviour));

        if previous.is_some() {
            panic!("Scenario [{}] is already defined", name);
        }

        self
    }

    /// Set the virtual user teardown hook [ScenarioDefinitionBuilder::teardown_agent_fn].
    pub fn use_agent_teardown(mut self, teardown_agent_fn: AgentHookMut<RV, V>) -> Self {
        self.teardown_agent_fn = Some(teardown_agent_fn);
        self
    }

    /// Set the global teardown hook [ScenarioDefinitionBuilder::teardown_fn].
    pub fn use_teardown(mut self, teardown_fn: GlobalHook<RV>) -> Self {
        self.teardown_fn = Some(teardown_fn);
        self
    }

    /// Add a pass/fail condition on a metric, evaluated over the whole run.
    pub fn with_threshold(mut self, metric: &str, expression: &str) -> Self {
        self.thresholds
            .push((metric.to_string(), expression.to_string()));
        self
    }

    /// Set the summary hook [ScenarioDefinitionBuilder::summary_fn].
    pub fn use_summary(mut self, summary_fn: SummaryHook) -> Self {
        self.summary_fn = Some(summary_fn);
        self
    }

    pub(crate) fn build(self) -> anyhow::Result<ScenarioDefinition<RV, V>> {
        if self.scenarios.is_empty() {
            bail!("No scenarios defined for [{}]", self.name);
        }

        let base_url = self
            .cli
            .base_url
            .clone()
            .or(self.default_base_url)
            .context("No base URL configured, pass one with --base-url")?
            .trim_end_matches('/')
            .to_string();

        let selected = self.cli.scenarios.iter().collect::<HashSet<_>>();
        let referenced = self
            .cli
            .scenarios
            .iter()
            .chain(self.cli.scenario_vus.iter().map(|(name, _)| name));
        for name in referenced {
            if !self.scenarios.contains_key(name) {
                bail!(
                    "Unknown scenario [{}], expected one of: {}",
                    name,
                    self.scenarios.keys().cloned().collect::<Vec<_>>().join(", ")
                );
            }
        }

        let scenarios = self
            .scenarios
            .into_iter()
            .filter(|(name, _)| selected.is_empty() || selected.contains(name))
            .map(|(name, (executor, behaviour))| {
                let executor = executor.with_overrides(&name, &self.cli);
                if executor.vus() == 0 {
                    bail!("Scenario [{}] must have at least one virtual user", name);
                }
                Ok(ScenarioConfig {
                    name,
                    executor,
                    behaviour,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut thresholds = BTreeMap::<String, Vec<Threshold>>::new();
        if !self.cli.no_thresholds {
            for (metric, expression) in self.thresholds {
                let threshold = expression.parse::<Threshold>()?;
                threshold.validate_for(&metric)?;
                thresholds.entry(metric).or_default().push(threshold);
            }
        }

        Ok(ScenarioDefinition {
            name: self.name,
            base_url,
            scenarios,
            thresholds,
            setup_fn: self.setup_fn,
            setup_agent_fn: self.setup_agent_fn,
            teardown_agent_fn: self.teardown_agent_fn,
            teardown_fn: self.teardown_fn,
            summary_fn: self.summary_fn,
            summary_dir: self.cli.summary_dir.unwrap_or_else(|| PathBuf::from(".")),
            run_id: self.cli.run_id,
            no_progress: self.cli.no_progress,
        })
    }
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> ScenarioDefinition<RV, V> {
    /// Total virtual users across all scenarios.
    pub fn total_vus(&self) -> usize {
        self.scenarios.iter().map(|s| s.executor.vus()).sum()
    }
}
