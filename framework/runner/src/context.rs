use std::{fmt::Debug, sync::Arc, time::Duration, time::Instant};

use gust_core::prelude::{DelegatedShutdownListener, ShutdownHandle};
use gust_instruments::{GroupRecord, Reporter, Tags};

use crate::executor::Executor;
use crate::types::GustResult;

pub trait UserValuesConstraint: Default + Debug + Send + Sync + 'static {}

/// State shared by every virtual user in the run.
#[derive(Debug)]
pub struct RunnerContext<RV: UserValuesConstraint> {
    executor: Arc<Executor>,
    reporter: Arc<Reporter>,
    shutdown_handle: ShutdownHandle,
    base_url: String,
    value: RV,
}

impl<RV: UserValuesConstraint> RunnerContext<RV> {
    pub(crate) fn new(
        executor: Arc<Executor>,
        reporter: Arc<Reporter>,
        shutdown_handle: ShutdownHandle,
        base_url: String,
    ) -> Self {
        Self {
            executor,
            reporter,
            shutdown_handle,
            base_url,
            value: Default::default(),
        }
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    pub fn reporter(&self) -> Arc<Reporter> {
        self.reporter.clone()
    }

    /// Base URL of the service under test, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop every virtual user as soon as its current iteration finishes. In-flight async work
    /// running through [Executor::execute_in_place] is cancelled.
    pub fn force_stop_scenario(&self) {
        self.shutdown_handle.shutdown();
    }

    pub fn get_mut(&mut self) -> &mut RV {
        &mut self.value
    }

    pub fn get(&self) -> &RV {
        &self.value
    }
}

/// State owned by a single virtual user.
pub struct AgentContext<RV: UserValuesConstraint, V: UserValuesConstraint> {
    agent_id: String,
    scenario: String,
    runner_context: Arc<RunnerContext<RV>>,
    shutdown_listener: DelegatedShutdownListener,
    group_path: Vec<String>,
    iteration: u64,
    value: V,
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> AgentContext<RV, V> {
    pub(crate) fn new(
        agent_id: String,
        scenario: String,
        runner_context: Arc<RunnerContext<RV>>,
        shutdown_listener: DelegatedShutdownListener,
    ) -> Self {
        Self {
            agent_id,
            scenario,
            runner_context,
            shutdown_listener,
            group_path: Vec::new(),
            iteration: 0,
            value: Default::default(),
        }
    }

    /// A value which is unique within the run, for example `post-agent-3`.
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Name of the scenario this virtual user was assigned to.
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Number of iterations this virtual user has started, including the current one.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub(crate) fn next_iteration(&mut self) {
        self.iteration += 1;
        self.group_path.clear();
    }

    pub fn runner_context(&self) -> &Arc<RunnerContext<RV>> {
        &self.runner_context
    }

    pub fn shutdown_listener(&mut self) -> &mut DelegatedShutdownListener {
        &mut self.shutdown_listener
    }

    /// Tags to attach to anything this virtual user measures right now.
    pub fn tags(&self) -> Tags {
        Tags {
            scenario: self.scenario.clone(),
            group_path: self.group_path.clone(),
        }
    }

    /// Run `f` inside a named group. Checks and requests made inside are reported under the group,
    /// and the time spent is recorded as `group_duration`. Groups can be nested.
    pub fn group<T>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Self) -> GustResult<T>,
    ) -> GustResult<T> {
        self.group_path.push(name.to_string());
        let tags = self.tags();
        let started = Instant::now();

        let result = f(self);

        self.runner_context.reporter.add_group_duration(GroupRecord {
            tags,
            elapsed: started.elapsed(),
        });
        self.group_path.pop();

        result
    }

    /// Pause this virtual user. Ends early with an error if the run is stopped.
    pub fn sleep(&self, duration: Duration) -> GustResult<()> {
        self.runner_context.executor.sleep(duration)
    }

    pub fn get_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub fn get(&self) -> &V {
        &self.value
    }
}
