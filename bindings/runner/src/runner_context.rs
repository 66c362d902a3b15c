use anyhow::Context;
use gust_runner::prelude::{GustResult, UserValuesConstraint};
use users_api_instrumented::prelude::UsersApiClient;

#[derive(Default, Debug)]
pub struct UsersRunnerContext {
    client: Option<UsersApiClient>,
}

impl UserValuesConstraint for UsersRunnerContext {}

impl UsersRunnerContext {
    /// The shared API client. Call [crate::prelude::configure_client] in the scenario setup
    /// before using this.
    pub fn client(&self) -> GustResult<&UsersApiClient> {
        self.client
            .as_ref()
            .context("Users API client is not configured, call 'configure_client' in the setup")
    }

    pub(crate) fn set_client(&mut self, client: UsersApiClient) {
        self.client = Some(client);
    }
}
