use crate::cli::GustScenarioCli;
use clap::Parser;

/// Initialise the CLI and logging for the Gust runner.
pub fn init() -> GustScenarioCli {
    env_logger::init();

    GustScenarioCli::parse()
}
