/// CLI argument parsing

use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::parse_interval;

// Build timestamp injected at compile time
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

const EXAMPLES: &str = "\
Examples:
  stackwatch           Ultra-fast (300ms refresh)
  stackwatch 0.1       Blazing fast (100ms refresh)
  stackwatch 1         Standard (1s refresh)
  stackwatch 500ms     Humantime intervals work too
  stackwatch -h        Show this help";

#[derive(Parser, Debug, Default)]
#[command(name = "stackwatch")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None, after_help = EXAMPLES)]
pub struct Cli {
    /// Refresh interval in seconds, fractional allowed (default 0.3)
    #[arg(value_name = "INTERVAL", allow_hyphen_values = true)]
    pub interval: Option<String>,

    /// Config file with the tracked services (default ~/.config/stackwatch/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log file path (defaults to stackwatch.log in the temp directory)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse the process arguments; see [`Cli::parse_lenient_from`]
    pub fn parse_lenient() -> Self {
        Self::parse_lenient_from(std::env::args_os()).unwrap_or_else(|err| err.exit())
    }

    /// Parse arguments, treating anything clap rejects as "no interval given".
    ///
    /// Only help and version requests come back as errors, so the caller can
    /// print them and exit 0; a stray flag or extra argument never aborts.
    pub fn parse_lenient_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(cli) => Ok(cli),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::DisplayHelp
                        | ErrorKind::DisplayVersion
                        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) =>
            {
                Err(err)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Interval given on the command line; unparsable values are ignored
    pub fn interval(&self) -> Option<Duration> {
        self.interval.as_deref().and_then(parse_interval)
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("stackwatch.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::DEFAULT_INTERVAL;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_interval_argument() {
        let cli = Cli::parse_from(["stackwatch"]);
        assert_eq!(cli.interval(), None);

        let cli = Cli::parse_from(["stackwatch", "0.1"]);
        assert_eq!(cli.interval(), Some(Duration::from_millis(100)));

        let cli = Cli::parse_from(["stackwatch", "quickly"]);
        assert_eq!(cli.interval(), None);

        let cli = Cli::parse_from(["stackwatch", "-2"]);
        assert_eq!(cli.interval(), None);
    }

    #[test]
    fn test_help_is_not_an_interval() {
        let err = Cli::try_parse_from(["stackwatch", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(err.to_string().contains("stackwatch 0.1"));
    }

    #[test]
    fn test_unexpected_arguments_fall_back_to_default() {
        for args in [
            vec!["stackwatch", "-x"],
            vec!["stackwatch", "--fast"],
            vec!["stackwatch", "1", "2"],
        ] {
            let cli = Cli::parse_lenient_from(args.clone()).unwrap();
            assert_eq!(cli.interval(), None, "args {:?}", args);
            assert_eq!(cli.interval().unwrap_or(DEFAULT_INTERVAL), Duration::from_millis(300));
        }
    }

    #[test]
    fn test_lenient_parse_keeps_help_and_version() {
        let err = Cli::parse_lenient_from(["stackwatch", "-h"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);

        let err = Cli::parse_lenient_from(["stackwatch", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_lenient_parse_accepts_valid_arguments() {
        let cli = Cli::parse_lenient_from(["stackwatch", "-v", "0.5"]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.interval(), Some(Duration::from_millis(500)));

        let cli = Cli::parse_lenient_from(["stackwatch", "-2"]).unwrap();
        assert_eq!(cli.interval(), None);
    }

    #[test]
    fn test_options() {
        let cli = Cli::parse_from(["stackwatch", "-vv", "--config", "stack.toml", "2"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("stack.toml")));
        assert_eq!(cli.interval(), Some(Duration::from_secs(2)));
    }
}
