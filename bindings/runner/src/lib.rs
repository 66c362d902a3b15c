mod assertions;
mod common;
mod context;
mod runner_context;
mod summary;

pub mod prelude {
    /// Common operations for users API scenarios.
    ///
    /// This is a good place to start if you are getting started writing scenarios.
    pub use crate::common::*;

    /// Checks to run against users API responses.
    pub use crate::assertions::*;

    pub use crate::context::UsersAgentContext;
    pub use crate::runner_context::UsersRunnerContext;
    pub use crate::summary::handle_summary;

    /// Re-export of the `gust_runner` prelude.
    ///
    /// This is for convenience so that you can depend on a single crate for the runner in your scenarios.
    pub use gust_runner::prelude::*;

    /// Re-export of the instrumented client for convenience.
    pub use users_api_instrumented::prelude::*;
}
