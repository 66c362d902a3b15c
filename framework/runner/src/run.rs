use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use gust_core::prelude::{AgentBailError, ShutdownSignalError};
use gust_instruments::{evaluate_thresholds, IterationRecord, Reporter, RunMeta};
use gust_summary_model::SummaryData;

use crate::monitor::start_monitor;
use crate::progress::{start_progress, ProgressPlan};
use crate::summary::{default_text_summary, write_summary_outputs};
use crate::{
    context::{AgentContext, RunnerContext, UserValuesConstraint},
    definition::{ScenarioDefinition, ScenarioDefinitionBuilder},
    executor::Executor,
    scenario::ScenarioExecutor,
    shutdown::start_shutdown_listener,
};

/// What a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// The aggregated results, after thresholds were evaluated.
    pub summary: SummaryData,
    /// False if any threshold was breached.
    pub thresholds_passed: bool,
    /// Number of virtual users that started and stopped without bailing.
    pub agents_completed: usize,
}

pub fn run<RV: UserValuesConstraint, V: UserValuesConstraint>(
    definition: ScenarioDefinitionBuilder<RV, V>,
) -> anyhow::Result<RunOutcome> {
    let definition = definition.build()?;

    log::info!("Running test: {}", definition.name);
    for scenario in &definition.scenarios {
        log::info!("Scenario {}: {}", scenario.name, scenario.executor.describe());
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = start_shutdown_listener(&runtime)?;
    let executor = Arc::new(Executor::new(runtime, shutdown_handle.clone()));
    let reporter = Arc::new(Reporter::new());
    let mut runner_context = RunnerContext::new(
        executor,
        reporter.clone(),
        shutdown_handle.clone(),
        definition.base_url.clone(),
    );

    if let Some(setup_fn) = &definition.setup_fn {
        setup_fn(&mut runner_context)?;
    }

    let runner_context = Arc::new(runner_context);
    let completed_iterations = Arc::new(AtomicU64::new(0));

    if !definition.no_progress {
        if let Some(plan) = progress_plan(&definition, completed_iterations.clone()) {
            if let Err(e) = start_progress(plan, shutdown_handle.new_listener()) {
                log::warn!("Failed to start progress thread: {e:?}");
            }
        }
    }

    // Ready to start spawning agents so start the resource monitor to report high usage by agents
    // which might lead to a misleading outcome.
    if let Err(e) = start_monitor(shutdown_handle.new_listener()) {
        log::warn!("Failed to start monitor thread: {e:?}");
    }

    reporter.set_vus_max(definition.total_vus());

    let started_at = chrono::Utc::now().timestamp();
    let run_started = Instant::now();

    let mut handles = Vec::new();
    for scenario in &definition.scenarios {
        let deadline = run_started + scenario.executor.time_limit();
        let budget = scenario.executor.iteration_budget();

        for agent_index in 0..scenario.executor.vus() {
            let runner_context = runner_context.clone();
            let setup_agent_fn = definition.setup_agent_fn;
            let behaviour = scenario.behaviour;
            let teardown_agent_fn = definition.teardown_agent_fn;
            let mut budget = budget.clone();
            let completed_iterations = completed_iterations.clone();
            let scenario_name = scenario.name.clone();

            // For us to check if the agent should shut down between iterations
            let cycle_shutdown_receiver = shutdown_handle.new_listener();
            // For the behaviour implementation to listen for shutdown and respond appropriately
            let delegated_shutdown_listener = shutdown_handle.new_listener();

            let agent_id = format!("{}-agent-{}", scenario.name, agent_index);

            let spawned = std::thread::Builder::new()
                .name(agent_id.clone())
                .spawn(move || {
                    let reporter = runner_context.reporter();
                    let mut context = AgentContext::new(
                        agent_id.clone(),
                        scenario_name.clone(),
                        runner_context,
                        delegated_shutdown_listener,
                    );
                    if let Some(setup_agent_fn) = setup_agent_fn {
                        if let Err(e) = setup_agent_fn(&mut context) {
                            log::error!("Agent setup failed for agent {}: {:?}", agent_id, e);
                            return false;
                        }
                    }

                    let mut bailed = false;
                    loop {
                        if cycle_shutdown_receiver.should_shutdown() {
                            log::debug!("Stopping agent {}", agent_id);
                            break;
                        }
                        if Instant::now() >= deadline {
                            log::debug!("Agent {} reached the end of its scenario", agent_id);
                            break;
                        }
                        if !budget.try_claim() {
                            log::debug!("Agent {} has no iterations left", agent_id);
                            break;
                        }

                        context.next_iteration();
                        let iteration_started = Instant::now();
                        let result = behaviour(&mut context);

                        reporter.add_iteration(IterationRecord {
                            scenario: scenario_name.clone(),
                            elapsed: iteration_started.elapsed(),
                            interrupted: result.is_err(),
                        });
                        completed_iterations.fetch_add(1, Ordering::Relaxed);

                        match result {
                            Ok(()) => {}
                            Err(e) if e.chain().any(|c| c.is::<AgentBailError>()) => {
                                log::error!("Agent {} bailed: {:?}", agent_id, e);
                                bailed = true;
                                break;
                            }
                            Err(e) if e.chain().any(|c| c.is::<ShutdownSignalError>()) => {
                                // Expected while the run is being stopped, the check at the top of
                                // the loop will catch this and break out.
                            }
                            Err(e) => {
                                log::error!("Agent behaviour failed for agent {}: {:?}", agent_id, e);
                            }
                        }
                    }

                    if let Some(teardown_agent_fn) = teardown_agent_fn {
                        if let Err(e) = teardown_agent_fn(&mut context) {
                            log::error!("Agent teardown failed for agent {}: {:?}", agent_id, e);
                        }
                    }

                    !bailed
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    shutdown_handle.shutdown();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(e).context("Failed to spawn thread for virtual user");
                }
            }
        }
    }

    let mut agents_completed = 0;
    for handle in handles {
        let completed = handle
            .join()
            .map_err(|e| anyhow::anyhow!("Error joining thread for virtual user: {:?}", e))?;
        if completed {
            agents_completed += 1;
        }
    }
    let run_duration = run_started.elapsed();

    // Every virtual user has stopped, release the progress and monitor threads.
    shutdown_handle.shutdown();

    if let Some(teardown_fn) = definition.teardown_fn {
        // Don't crash the runner if the teardown fails. We still want the reporting and runner
        // shutdown to happen cleanly. The hook is documented as 'best effort'
        if let Err(e) = teardown_fn(runner_context.clone()) {
            log::error!("Teardown failed: {:?}", e);
        }
    }

    let meta = RunMeta {
        run_id: definition
            .run_id
            .clone()
            .unwrap_or_else(|| nanoid::nanoid!()),
        test_name: definition.name.clone(),
        started_at,
        duration: run_duration,
        scenarios: definition
            .scenarios
            .iter()
            .map(|s| (s.name.clone(), (s.executor.describe(), s.executor.vus())))
            .collect::<BTreeMap<_, _>>(),
    };
    let mut summary = reporter.summarize(meta);
    let thresholds_passed = evaluate_thresholds(&mut summary, &definition.thresholds);

    let outputs = match definition.summary_fn {
        Some(summary_fn) => summary_fn(&summary).unwrap_or_else(|e| {
            log::error!("Summary hook failed, falling back to the text summary: {:?}", e);
            default_text_summary(&summary).unwrap_or_default()
        }),
        None => default_text_summary(&summary)?,
    };
    write_summary_outputs(&outputs, &definition.summary_dir)?;

    Ok(RunOutcome {
        summary,
        thresholds_passed,
        agents_completed,
    })
}

/// Pick what the progress bar should follow. Time bound scenarios win since they decide when the
/// run ends.
fn progress_plan<RV: UserValuesConstraint, V: UserValuesConstraint>(
    definition: &ScenarioDefinition<RV, V>,
    completed: Arc<AtomicU64>,
) -> Option<ProgressPlan> {
    let longest = definition
        .scenarios
        .iter()
        .filter(|s| matches!(s.executor, ScenarioExecutor::ConstantVus { .. }))
        .map(|s| s.executor.time_limit())
        .max();
    if let Some(duration) = longest {
        return Some(ProgressPlan::Duration(duration));
    }

    let total = definition
        .scenarios
        .iter()
        .filter_map(|s| s.executor.total_iterations())
        .sum::<u64>();
    (total > 0).then_some(ProgressPlan::Iterations { total, completed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::GustScenarioCli;

    #[derive(Default, Debug)]
    struct Values;

    impl UserValuesConstraint for Values {}

    fn noop(_ctx: &mut AgentContext<Values, Values>) -> crate::definition::HookResult {
        Ok(())
    }

    #[test]
    fn progress_follows_the_longest_constant_scenario() {
        let definition = ScenarioDefinitionBuilder::<Values, Values>::new(
            "progress_plan",
            GustScenarioCli::default(),
        )
        .with_default_base_url("http://localhost")
        .use_named_agent_behaviour(
            "short",
            ScenarioExecutor::constant_vus(1, Duration::from_secs(5)),
            noop,
        )
        .use_named_agent_behaviour(
            "long",
            ScenarioExecutor::constant_vus(1, Duration::from_secs(30)),
            noop,
        )
        .build()
        .unwrap();

        match progress_plan(&definition, Arc::new(AtomicU64::new(0))) {
            Some(ProgressPlan::Duration(d)) => assert_eq!(Duration::from_secs(30), d),
            other => panic!("Unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn progress_counts_iterations_when_not_time_bound() {
        let definition = ScenarioDefinitionBuilder::<Values, Values>::new(
            "progress_plan",
            GustScenarioCli::default(),
        )
        .with_default_base_url("http://localhost")
        .use_agent_behaviour(ScenarioExecutor::shared_iterations(10, 35), noop)
        .build()
        .unwrap();

        match progress_plan(&definition, Arc::new(AtomicU64::new(0))) {
            Some(ProgressPlan::Iterations { total, .. }) => assert_eq!(35, total),
            other => panic!("Unexpected plan: {other:?}"),
        }
    }
}
