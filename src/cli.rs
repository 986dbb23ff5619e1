//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Fetch catalogued images in parallel and publish a JSON/CSV directory.
///
/// Run parameters (source, counts, concurrency, checkpoint interval, timeouts)
/// come from the config file; the command line only selects the file and the
/// log verbosity.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/image-harvester/config.toml when present)
    #[arg(short = 'C', long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Default tracing filter for the verbosity flags.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["harvester"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.config.is_none());
        assert_eq!(args.default_log_level(), "info");
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["harvester", "-v"]).unwrap();
        assert_eq!(args.default_log_level(), "debug");

        let args = Args::try_parse_from(["harvester", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.default_log_level(), "trace");
    }

    #[test]
    fn test_cli_quiet_wins_over_verbose() {
        let args = Args::try_parse_from(["harvester", "-q", "-v"]).unwrap();
        assert_eq!(args.default_log_level(), "error");
    }

    #[test]
    fn test_cli_config_flag() {
        let args = Args::try_parse_from(["harvester", "--config", "run.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("run.toml")));

        let args = Args::try_parse_from(["harvester", "-C", "other.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("other.toml")));
    }

    #[test]
    fn test_cli_run_parameters_are_not_flags() {
        let result = Args::try_parse_from(["harvester", "--concurrency", "5"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["harvester", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
