use gust_runner::prelude::{AgentContext, GustResult, HookResult, RunnerContext};
use users_api_instrumented::prelude::{HttpResponse, UserPayload, UsersApiClient};

use crate::context::UsersAgentContext;
use crate::runner_context::UsersRunnerContext;

/// Create the API client that every virtual user shares. Use this as the scenario setup hook:
///
/// ```rust,no_run
/// use users_gust_runner::prelude::*;
///
/// let builder = ScenarioDefinitionBuilder::<UsersRunnerContext, UsersAgentContext>::new_with_init("my_test")
///     .use_setup(configure_client);
/// ```
pub fn configure_client(ctx: &mut RunnerContext<UsersRunnerContext>) -> HookResult {
    let client = UsersApiClient::new(ctx.base_url(), ctx.reporter())?;
    log::debug!("Configured users API client for {}", client.base_url());
    ctx.get_mut().set_client(client);
    Ok(())
}

/// Send `POST /api/users` and wait for the response.
///
/// The request is measured under the virtual user's current scenario and group. A transport
/// failure is returned as an error, which ends the iteration.
pub fn create_user(
    ctx: &mut AgentContext<UsersRunnerContext, UsersAgentContext>,
    payload: &UserPayload,
) -> GustResult<HttpResponse> {
    let tags = ctx.tags();
    let client = ctx.runner_context().get().client()?;
    ctx.runner_context()
        .executor()
        .execute_in_place(async move { Ok(client.create_user(payload, tags).await?) })
}

/// Send `PUT /api/users/{id}` and wait for the response.
pub fn update_user(
    ctx: &mut AgentContext<UsersRunnerContext, UsersAgentContext>,
    id: u64,
    payload: &UserPayload,
) -> GustResult<HttpResponse> {
    let tags = ctx.tags();
    let client = ctx.runner_context().get().client()?;
    ctx.runner_context()
        .executor()
        .execute_in_place(async move { Ok(client.update_user(id, payload, tags).await?) })
}
