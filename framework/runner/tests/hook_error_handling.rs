use std::sync::Arc;
use std::time::Duration;

use gust_runner::prelude::{
    run, AgentBailError, AgentContext, GustScenarioCli, HookResult, RunnerContext,
    ScenarioDefinitionBuilder, ScenarioExecutor, UserValuesConstraint,
};

#[derive(Default, Debug)]
struct RunnerContextValue {}

impl UserValuesConstraint for RunnerContextValue {}

#[derive(Default, Debug)]
struct AgentContextValue {
    value: i32,
}

impl UserValuesConstraint for AgentContextValue {}

fn sample_cli_cfg() -> GustScenarioCli {
    GustScenarioCli {
        base_url: Some("http://localhost:1".to_string()),
        no_progress: true,
        summary_dir: Some(std::env::temp_dir()),
        ..Default::default()
    }
}

fn noop(_ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>) -> HookResult {
    Ok(())
}

fn short_run() -> ScenarioExecutor {
    ScenarioExecutor::per_vu_iterations(1, 3)
}

#[test]
fn propagate_error_in_setup_hook() {
    fn setup(_tx: &mut RunnerContext<RunnerContextValue>) -> HookResult {
        Err(anyhow::anyhow!("Error in setup hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "propagate_error_in_setup_hook",
        sample_cli_cfg(),
    )
    .use_agent_behaviour(short_run(), noop)
    .use_setup(setup);

    let result = run(scenario);

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().to_string(), "Error in setup hook");
}

#[test]
fn capture_error_in_agent_setup() {
    fn agent_setup(_ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>) -> HookResult {
        Err(anyhow::anyhow!("Error in agent setup hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "capture_error_in_agent_setup",
        sample_cli_cfg(),
    )
    .use_agent_behaviour(short_run(), noop)
    .use_agent_setup(agent_setup);

    let result = run(scenario).unwrap();

    assert_eq!(0, result.agents_completed);
    assert_eq!(
        Some(0),
        result
            .summary
            .scenarios
            .get("default")
            .map(|s| s.iterations_completed)
    );
}

#[test]
fn capture_error_in_agent_behaviour_and_continue() {
    fn agent_behaviour(
        ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>,
    ) -> HookResult {
        if ctx.get().value < 5 {
            ctx.get_mut().value += 1;
        } else {
            // Save time running this test by shutting down once this has run a few times.
            ctx.runner_context().force_stop_scenario();
        }

        Err(anyhow::anyhow!("Error in agent behaviour hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "capture_error_in_agent_behaviour_and_continue",
        sample_cli_cfg(),
    )
    .use_agent_behaviour(
        ScenarioExecutor::constant_vus(1, Duration::from_secs(5)),
        agent_behaviour,
    );

    let result = run(scenario).unwrap();

    assert_eq!(1, result.agents_completed);
    let default = &result.summary.scenarios["default"];
    assert_eq!(6, default.iterations_interrupted);
    assert_eq!(0, default.iterations_completed);
}

#[test]
fn bail_error_stops_agent_behaviour() {
    fn agent_behaviour_1(
        _ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>,
    ) -> HookResult {
        Err(AgentBailError::default().into())
    }

    fn agent_behaviour_2(
        _ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>,
    ) -> HookResult {
        Ok(())
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "bail_error_stops_agent_behaviour",
        sample_cli_cfg(),
    )
    .use_named_agent_behaviour("bail", ScenarioExecutor::per_vu_iterations(1, 10), agent_behaviour_1)
    .use_named_agent_behaviour(
        "continue",
        ScenarioExecutor::per_vu_iterations(1, 10),
        agent_behaviour_2,
    );

    let result = run(scenario).unwrap();

    assert_eq!(1, result.agents_completed);
    assert_eq!(1, result.summary.scenarios["bail"].iterations_interrupted);
    assert_eq!(10, result.summary.scenarios["continue"].iterations_completed);
}

#[test]
fn shared_iterations_are_split_between_agents() {
    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "shared_iterations_are_split_between_agents",
        sample_cli_cfg(),
    )
    .use_agent_behaviour(ScenarioExecutor::shared_iterations(4, 35), noop);

    let result = run(scenario).unwrap();

    assert_eq!(4, result.agents_completed);
    assert_eq!(35, result.summary.scenarios["default"].iterations_completed);
}

#[test]
fn capture_error_in_agent_teardown() {
    fn agent_teardown(
        _ctx: &mut AgentContext<RunnerContextValue, AgentContextValue>,
    ) -> HookResult {
        Err(anyhow::anyhow!("Error in agent teardown hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "capture_error_in_agent_teardown",
        sample_cli_cfg(),
    )
    .use_agent_behaviour(short_run(), noop)
    .use_agent_teardown(agent_teardown);

    let result = run(scenario);

    assert!(result.is_ok());
}

#[test]
fn capture_error_in_teardown() {
    fn teardown(_ctx: Arc<RunnerContext<RunnerContextValue>>) -> HookResult {
        Err(anyhow::anyhow!("Error in teardown hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "capture_error_in_teardown",
        sample_cli_cfg(),
    )
    .use_agent_behaviour(short_run(), noop)
    .use_teardown(teardown);

    let result = run(scenario);

    assert!(result.is_ok());
}

#[test]
fn failing_summary_hook_falls_back() {
    fn summary(_data: &gust_runner::prelude::SummaryData) -> anyhow::Result<gust_runner::prelude::SummaryOutputs> {
        Err(anyhow::anyhow!("Error in summary hook"))
    }

    let scenario = ScenarioDefinitionBuilder::<RunnerContextValue, AgentContextValue>::new(
        "failing_summary_hook_falls_back",
        sample_cli_cfg(),
    )
    .use_agent_behaviour(short_run(), noop)
    .use_summary(summary);

    let result = run(scenario);

    assert!(result.is_ok());
}
