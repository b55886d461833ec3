use crate::client::{SvApiClient, WrapTokenClient};
use crate::config::Config;
use crate::constants::{DATE_HELP_TEXT, DEFAULT_CONFIG_PATH};
use crate::logging;
use crate::orchestrator::Orchestrator;
use clap::{Arg, ArgAction, Command};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::{error, info};

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Parsed command-line arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub config: PathBuf,
    pub output_dir: Option<PathBuf>,
}

fn build_command() -> Command<'static> {
    Command::new("sv-isir-corrections")
        .version(APP_VERSION)
        .about(APP_ABOUT)
        .after_help(
            "Both dates are inclusive and the start date must not be after the end date.\nExample:\n  sv-isir-corrections 2015-09-21 2015-09-22 --output-dir /var/isirs",
        )
        .arg(
            Arg::new("start_date")
                .value_name("START_DATE")
                .help(DATE_HELP_TEXT)
                .index(1)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("end_date")
                .value_name("END_DATE")
                .help(DATE_HELP_TEXT)
                .index(2)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to the TOML config file")
                .default_value(DEFAULT_CONFIG_PATH)
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-dir")
                .help("Existing directory for the correction files (overrides targetDir)")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
}

/// Parses command-line arguments.
///
/// The dates are optional at this level so a missing date is reported by the
/// date validation (exit code 1) rather than by clap.
pub fn parse_args<I, T>(args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;

    Ok(CliArgs {
        start_date: matches.get_one::<String>("start_date").cloned(),
        end_date: matches.get_one::<String>("end_date").cloned(),
        config: matches
            .get_one::<PathBuf>("config")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
        output_dir: matches.get_one::<PathBuf>("output_dir").cloned(),
    })
}

/// Loads configuration, sets up logging, wires the HTTP clients and runs the
/// retrieval. Returns the process exit code.
///
/// Errors raised before logging is initialized (unreadable or invalid
/// configuration, log directory creation) go to stderr.
pub async fn run(args: CliArgs) -> u8 {
    let config = match Config::from_toml_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    let log = match logging::init(&config.logging) {
        Ok(log) => log,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    let target_dir = match config.resolve_target_dir(args.output_dir.as_deref()) {
        Ok(dir) => dir,
        Err(e) => {
            error!(error = %e, "Cannot determine output directory");
            if let Err(flush_err) = log.flush() {
                eprintln!("{flush_err}");
            }
            return 1;
        }
    };

    info!(
        start_date = args.start_date.as_deref().unwrap_or("<missing>"),
        end_date = args.end_date.as_deref().unwrap_or("<missing>"),
        target_dir = %target_dir.display(),
        "Retrieving ISIR corrections"
    );

    let client = reqwest::Client::new();
    let orchestrator = Orchestrator::new(
        config.oauth_wrap_request.clone(),
        config.sv_api.root_url.clone(),
        WrapTokenClient::new(client.clone()),
        SvApiClient::new(client),
        log,
    );

    orchestrator
        .run(
            args.start_date.as_deref(),
            args.end_date.as_deref(),
            &target_dir,
        )
        .await
        .exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positional_dates_with_defaults() {
        let args = parse_args(["sv-isir-corrections", "2015-09-21", "2015-09-22"]).unwrap();
        assert_eq!(args.start_date.as_deref(), Some("2015-09-21"));
        assert_eq!(args.end_date.as_deref(), Some("2015-09-22"));
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(args.output_dir.is_none());
    }

    #[test]
    fn parses_config_and_output_dir() {
        let args = parse_args([
            "sv-isir-corrections",
            "2015-09-21",
            "2015-09-22",
            "--config",
            "custom.toml",
            "-o",
            "/tmp/isirs",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("custom.toml"));
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/isirs")));
    }

    #[test]
    fn missing_dates_are_left_to_validation() {
        let args = parse_args(["sv-isir-corrections"]).unwrap();
        assert!(args.start_date.is_none());
        assert!(args.end_date.is_none());
    }

    #[test]
    fn extra_positional_is_rejected() {
        let result = parse_args(["sv-isir-corrections", "2015-09-21", "2015-09-22", "extra"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_config_file_exits_with_failure() {
        let args = CliArgs {
            start_date: Some("2015-09-21".to_string()),
            end_date: Some("2015-09-22".to_string()),
            config: PathBuf::from("definitely/not/here.toml"),
            output_dir: None,
        };
        assert_eq!(run(args).await, 1);
    }
}
