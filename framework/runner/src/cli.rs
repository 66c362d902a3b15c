use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(about, long_about = None)]
pub struct GustScenarioCli {
    /// Base URL of the service under test, for example `https://reqres.in`.
    ///
    /// Defaults to the base URL that the test definition was written against.
    #[clap(short, long)]
    pub base_url: Option<String>,

    /// Override the number of virtual users for every scenario.
    #[clap(long)]
    pub vus: Option<usize>,

    /// Override the number of virtual users for a single scenario. Specify the scenario and number
    /// of virtual users in the format `scenario:count`. For example `--scenario-vus=post:5`.
    ///
    /// Specifying the count is optional and will default to 1.
    ///
    /// You can specify multiple scenarios by using the flag multiple times. For example
    /// `--scenario-vus=post:5 --scenario-vus=put:2`. Takes precedence over `--vus`.
    #[clap(long, value_parser = parse_scenario_vus)]
    pub scenario_vus: Vec<(String, usize)>,

    /// Override the number of seconds that constant virtual user scenarios run for.
    #[clap(long)]
    pub duration: Option<u64>,

    /// Override the number of iterations for iteration based scenarios.
    #[clap(long)]
    pub iterations: Option<u64>,

    /// Only run the named scenario. Can be given multiple times, defaults to all scenarios.
    #[clap(long = "scenario")]
    pub scenarios: Vec<String>,

    /// Directory that files produced by the summary hook are written to.
    #[clap(long)]
    pub summary_dir: Option<PathBuf>,

    /// Do not evaluate thresholds at the end of the run.
    #[clap(long, default_value = "false")]
    pub no_thresholds: bool,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// Use a fixed run id instead of a generated one.
    #[clap(long)]
    pub run_id: Option<String>,
}

fn parse_scenario_vus(s: &str) -> anyhow::Result<(String, usize)> {
    let mut parts = s.split(':');
    let name = parts
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or(anyhow::anyhow!("No name specified for scenario"))?;

    let count = match parts.next() {
        Some(count) => count
            .parse::<usize>()
            .map_err(|e| anyhow::anyhow!("Invalid virtual user count '{count}': {e}"))?,
        None => 1,
    };

    Ok((name, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_vus_with_count() {
        assert_eq!(
            ("post".to_string(), 5),
            parse_scenario_vus("post:5").unwrap()
        );
    }

    #[test]
    fn scenario_vus_defaults_to_one() {
        assert_eq!(("put".to_string(), 1), parse_scenario_vus("put").unwrap());
    }

    #[test]
    fn scenario_vus_rejects_bad_input() {
        assert!(parse_scenario_vus(":5").is_err());
        assert!(parse_scenario_vus("post:many").is_err());
    }

    #[test]
    fn parse_full_command_line() {
        let cli = GustScenarioCli::try_parse_from([
            "users_create_update",
            "--base-url",
            "http://localhost:8080",
            "--duration",
            "5",
            "--scenario",
            "post",
            "--scenario-vus",
            "post:3",
            "--no-progress",
        ])
        .unwrap();

        assert_eq!(Some("http://localhost:8080".to_string()), cli.base_url);
        assert_eq!(Some(5), cli.duration);
        assert_eq!(vec!["post".to_string()], cli.scenarios);
        assert_eq!(vec![("post".to_string(), 3)], cli.scenario_vus);
        assert!(cli.no_progress);
        assert!(!cli.no_thresholds);
    }
}
