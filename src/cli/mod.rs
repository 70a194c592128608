//! Command-line interface for Patbin.

use clap::{Parser, Subcommand};

/// Patbin - a small pastebin server
#[derive(Parser)]
#[command(name = "patbin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

impl Cli {
    #[must_use]
    pub fn command_or_default(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_serves() {
        let cli = Cli::try_parse_from(["patbin"]).unwrap();
        assert_eq!(cli.command_or_default(), &Commands::Serve);
    }

    #[test]
    fn test_init_subcommand() {
        let cli = Cli::try_parse_from(["patbin", "init"]).unwrap();
        assert_eq!(cli.command_or_default(), &Commands::Init);
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["patbin", "frobnicate"]).is_err());
    }
}
