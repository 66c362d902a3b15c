use std::time::Duration;

use users_gust_runner::prelude::*;

const BASE_URL: &str = "https://reqres.in";
const UPDATED_USER_ID: u64 = 2;
const PAUSE_BETWEEN_REQUESTS: Duration = Duration::from_secs(2);

fn agent_behaviour(ctx: &mut AgentContext<UsersRunnerContext, UsersAgentContext>) -> HookResult {
    ctx.group("postScenario", |ctx| {
        let payload = UserPayload::new("morpheus", "leader");
        let response = create_user(ctx, &payload)?;
        verify_created_user_status_and_body(&*ctx, &response, &payload)
    })?;

    ctx.sleep(PAUSE_BETWEEN_REQUESTS)?;

    ctx.group("putScenario", |ctx| {
        let payload = UserPayload::new("morpheus", "zion resident");
        let response = update_user(ctx, UPDATED_USER_ID, &payload)?;
        verify_updated_user_status_and_body(&*ctx, &response, &payload)
    })
}

fn main() -> GustResult<()> {
    let builder = ScenarioDefinitionBuilder::<UsersRunnerContext, UsersAgentContext>::new_with_init(
        env!("CARGO_PKG_NAME"),
    )
    .with_default_base_url(BASE_URL)
    .use_setup(configure_client)
    .use_agent_behaviour(
        ScenarioExecutor::shared_iterations(1000, 3500),
        agent_behaviour,
    )
    // Responses should average under 2s
    .with_threshold("http_req_duration", "avg < 2000")
    // Under 1% of requests may fail
    .with_threshold("http_req_failed", "rate < 0.01")
    .use_summary(handle_summary);

    let outcome = run(builder)?;

    if !outcome.thresholds_passed {
        let breached = outcome
            .summary
            .breached_thresholds()
            .into_iter()
            .map(|(metric, expression)| format!("{metric}: {expression}"))
            .collect();
        return Err(ThresholdsBreachedError::new(breached).into());
    }

    Ok(())
}
