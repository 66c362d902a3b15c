use std::time::Duration;

use users_gust_runner::prelude::*;

const BASE_URL: &str = "https://reqres.in";
const UPDATED_USER_ID: u64 = 2;

fn post_scenario(ctx: &mut AgentContext<UsersRunnerContext, UsersAgentContext>) -> HookResult {
    let payload = UserPayload::new("morpheus", "leader");

    let response = create_user(ctx, &payload)?;
    verify_created_user(&*ctx, &response, &payload)?;

    Ok(())
}

fn put_scenario(ctx: &mut AgentContext<UsersRunnerContext, UsersAgentContext>) -> HookResult {
    let payload = UserPayload::new("morpheus", "zion resident");

    let response = update_user(ctx, UPDATED_USER_ID, &payload)?;
    verify_updated_user(&*ctx, &response, &payload)?;

    Ok(())
}

fn main() -> GustResult<()> {
    let builder = ScenarioDefinitionBuilder::<UsersRunnerContext, UsersAgentContext>::new_with_init(
        env!("CARGO_PKG_NAME"),
    )
    .with_default_base_url(BASE_URL)
    .use_setup(configure_client)
    .use_named_agent_behaviour(
        "post",
        ScenarioExecutor::constant_vus(10, Duration::from_secs(30)),
        post_scenario,
    )
    .use_named_agent_behaviour(
        "put",
        ScenarioExecutor::constant_vus(10, Duration::from_secs(30)),
        put_scenario,
    )
    .use_summary(handle_summary);

    run(builder)?;

    Ok(())
}
