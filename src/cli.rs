//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download files from GitHub release, archive, blob and raw links.
///
/// Each URL is downloaded in turn with a progress bar, verified against the
/// allowed content types and size limit, and saved into the output directory.
#[derive(Parser, Debug)]
#[command(name = "ghfetch")]
#[command(author, version, about)]
pub struct Args {
    /// GitHub file links to download
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Directory to save downloads into [default: .]
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Retries after an attempt times out (0-10) [default: 3]
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: Option<u8>,

    /// Per-attempt timeout in seconds, covering headers and body (1-3600) [default: 120]
    #[arg(short = 't', long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: Option<u64>,

    /// Maximum file size in bytes [default: 1073741824]
    #[arg(long, value_name = "BYTES", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_size: Option<u64>,

    /// Path of the state database holding the download count
    #[arg(long, value_name = "PATH")]
    pub state_db: Option<PathBuf>,

    /// Print the total number of completed downloads and exit
    #[arg(long)]
    pub count: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Hide the progress bar and log errors only
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Default log filter for the verbosity flags; `RUST_LOG` takes precedence.
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
        let args = Args::try_parse_from(["ghfetch"]).unwrap();
        assert!(args.urls.is_empty());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.count);
        assert_eq!(args.max_retries, None);
        assert_eq!(args.timeout_secs, None);
        assert_eq!(args.output_dir, None);
    }

    #[test]
    fn test_cli_positional_urls() {
        let args = Args::try_parse_from([
            "ghfetch",
            "https://github.com/a/b/raw/main/x.txt",
            "https://github.com/a/b/raw/main/y.txt",
        ])
        .unwrap();
        assert_eq!(args.urls.len(), 2);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["ghfetch", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);
        assert_eq!(args.default_log_level(), "debug");

        let args = Args::try_parse_from(["ghfetch", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.default_log_level(), "trace");
    }

    #[test]
    fn test_cli_quiet_flag_wins_over_verbose() {
        let args = Args::try_parse_from(["ghfetch", "-q", "-v"]).unwrap();
        assert_eq!(args.default_log_level(), "error");
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["ghfetch", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["ghfetch", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["ghfetch", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    // ==================== Max Retries Tests ====================

    #[test]
    fn test_cli_max_retries_short_and_long_flag() {
        let args = Args::try_parse_from(["ghfetch", "-r", "5"]).unwrap();
        assert_eq!(args.max_retries, Some(5));
        let args = Args::try_parse_from(["ghfetch", "--max-retries", "0"]).unwrap();
        assert_eq!(args.max_retries, Some(0));
    }

    #[test]
    fn test_cli_max_retries_over_max_rejected() {
        let err = Args::try_parse_from(["ghfetch", "-r", "11"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    // ==================== Timeout And Size Tests ====================

    #[test]
    fn test_cli_timeout_bounds() {
        let args = Args::try_parse_from(["ghfetch", "-t", "3600"]).unwrap();
        assert_eq!(args.timeout_secs, Some(3600));

        let err = Args::try_parse_from(["ghfetch", "-t", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        let err = Args::try_parse_from(["ghfetch", "--timeout-secs", "3601"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_max_size_rejects_zero() {
        let args = Args::try_parse_from(["ghfetch", "--max-size", "1024"]).unwrap();
        assert_eq!(args.max_size, Some(1024));

        let err = Args::try_parse_from(["ghfetch", "--max-size", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_paths_and_count() {
        let args = Args::try_parse_from([
            "ghfetch",
            "-o",
            "out",
            "--state-db",
            "/tmp/state.db",
            "--count",
        ])
        .unwrap();
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.state_db, Some(PathBuf::from("/tmp/state.db")));
        assert!(args.count);
    }
}
