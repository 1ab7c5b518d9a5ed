//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// eppo-sync - push dbt semantic models and metrics to Eppo
///
/// Reads a dbt project's semantic-layer definitions and compiled manifest,
/// maps them to Eppo fact sources and metrics, and submits them to the
/// Eppo metrics-sync API.
#[derive(Parser, Debug)]
#[command(
    name = "eppo-sync",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "EPPO_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map a dbt project to Eppo definitions and submit them
    Sync(SyncArgs),

    /// Validate a saved sync payload against the Eppo schema
    Validate(ValidateArgs),
}

/// Arguments for the sync command
#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Root of the dbt project
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Compiled manifest (defaults to <project-dir>/target/manifest.json)
    #[arg(long, value_name = "FILE")]
    pub manifest_path: Option<PathBuf>,

    /// Eppo API key
    #[arg(long, env = "EPPO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Eppo API base URL
    #[arg(long, env = "EPPO_BASE_URL")]
    pub base_url: Option<String>,

    /// Tag identifying this sync (defaults to dbt-sync-<timestamp>)
    #[arg(long)]
    pub sync_tag: Option<String>,

    /// Render and validate the payload without sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// JSON schema to validate against instead of the bundled one
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Base URL used to build reference links to definition files
    #[arg(long, value_name = "URL")]
    pub reference_url_base: Option<String>,

    /// Write the rendered payload to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the payload file (JSON or YAML)
    #[arg(value_name = "PAYLOAD")]
    pub payload: PathBuf,

    /// JSON schema to validate against instead of the bundled one
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_arguments() {
        let cli = Cli::parse_from([
            "eppo-sync",
            "sync",
            "--project-dir",
            "shop",
            "--api-key",
            "secret",
            "--sync-tag",
            "nightly",
            "--dry-run",
            "--timeout",
            "45",
            "--save-to",
            "payload.json",
        ]);

        match cli.command {
            Commands::Sync(args) => {
                assert_eq!(args.project_dir, PathBuf::from("shop"));
                assert_eq!(args.api_key.as_deref(), Some("secret"));
                assert_eq!(args.sync_tag.as_deref(), Some("nightly"));
                assert!(args.dry_run);
                assert_eq!(args.timeout, Some(45));
                assert_eq!(args.save_to, Some(PathBuf::from("payload.json")));
                assert_eq!(args.manifest_path, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_project_dir_defaults_to_current_directory() {
        let cli = Cli::parse_from(["eppo-sync", "sync", "--api-key", "k"]);
        match cli.command {
            Commands::Sync(args) => assert_eq!(args.project_dir, PathBuf::from(".")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["eppo-sync", "validate", "payload.json", "-vv", "-o", "json-pretty"]);
        assert_eq!(cli.verbosity_level(), 2);
        assert_eq!(cli.output, OutputFormat::JsonPretty);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["eppo-sync", "-q", "-v", "validate", "payload.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli {
            verbose: 2,
            quiet: false,
            config: None,
            output: OutputFormat::Human,
            no_color: false,
            command: Commands::Validate(ValidateArgs {
                payload: PathBuf::from("payload.json"),
                schema: None,
            }),
        };
        assert_eq!(cli.verbosity_level(), 2);

        let quiet_cli = Cli {
            verbose: 2,
            quiet: true,
            ..cli
        };
        assert_eq!(quiet_cli.verbosity_level(), 0);
    }

    #[test]
    fn test_no_color_disables_color() {
        let cli = Cli::parse_from(["eppo-sync", "--no-color", "validate", "payload.json"]);
        assert!(!cli.use_color());
    }
}
