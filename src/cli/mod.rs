//! CLI module for the DevBook API
//!
//! Command-line parsing for the `devbook-api` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// DevBook API - users, posts, likes and a follow graph over REST
#[derive(Parser, Debug)]
#[command(
    name = "devbook-api",
    version,
    about = "DevBook API - social network REST server",
    long_about = "REST API for user accounts, posts, likes and a follow graph,\n\
                  secured with HS256 bearer tokens.\n\n\
                  Run without arguments to start the server.",
    after_help = "EXAMPLES:\n    \
                  devbook-api                        # Start the server (devbook.toml, or defaults)\n    \
                  devbook-api --config my.toml       # Use a custom config file\n    \
                  devbook-api config --validate      # Check the configuration and exit"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "devbook.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Show the effective configuration
    Config {
        /// Validate the configuration and exit non-zero on failure
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand to run; no subcommand means serve.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["devbook-api"]).unwrap();
        assert_eq!(cli.command(), Commands::Serve);
        assert_eq!(cli.config, PathBuf::from("devbook.toml"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_config_validate() {
        let cli =
            Cli::try_parse_from(["devbook-api", "config", "--validate", "-c", "x.toml", "-v"])
                .unwrap();
        assert_eq!(cli.command(), Commands::Config { validate: true });
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["devbook-api", "init"]).is_err());
    }
}
