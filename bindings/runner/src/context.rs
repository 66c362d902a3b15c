use gust_runner::prelude::UserValuesConstraint;

#[derive(Default, Debug)]
pub struct UsersAgentContext {}

impl UserValuesConstraint for UsersAgentContext {}
