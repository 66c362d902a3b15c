mod check;
mod cli;
mod context;
mod definition;
mod executor;
mod init;
mod monitor;
mod progress;
mod run;
mod scenario;
mod shutdown;
mod summary;
mod types;

pub mod prelude {
    pub use crate::check::CheckRecorder;
    pub use crate::cli::GustScenarioCli;
    pub use crate::context::{AgentContext, RunnerContext, UserValuesConstraint};
    pub use crate::definition::{
        AgentHookMut, GlobalHook, GlobalHookMut, HookResult, ScenarioConfig, ScenarioDefinition,
        ScenarioDefinitionBuilder, SummaryHook, SummaryOutputs,
    };
    pub use crate::executor::Executor;
    pub use crate::init::init;
    pub use crate::run::{run, RunOutcome};
    pub use crate::scenario::ScenarioExecutor;
    pub use crate::summary::{default_text_summary, write_summary_outputs};
    pub use crate::types::{GustResult, ThresholdsBreachedError};

    /// Re-export of the summary model so that summary hooks only need this crate.
    pub use gust_summary_model::SummaryData;
    pub use gust_instruments::Reporter;
    pub use gust_core::prelude::{AgentBailError, ShutdownSignalError};
}
