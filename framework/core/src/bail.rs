/// Return this error from a virtual user's behaviour to stop that virtual user.
///
/// The rest of the scenario keeps running. Use it when a virtual user can no longer make progress,
/// for example because the target host rejected its session, but other virtual users may still be
/// able to.
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct AgentBailError {
    msg: String,
}

impl AgentBailError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

impl Default for AgentBailError {
    fn default() -> Self {
        Self::new("Virtual user is bailing")
    }
}
