//! CLI argument parsing using clap.
//!
//! Defines the command-line interface for wallet-coordinator-cli.

use clap::Parser;
use std::path::PathBuf;

/// Wallet coordinator CLI - drive a wallet session from the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "wallet-coordinator-cli")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Settings file (default: ~/.wallet-coordinator/settings.toml)
    #[arg(long, env = "WALLET_COORDINATOR_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Wallet name (overrides `wallet.name` from settings)
    #[arg(short = 'w', long)]
    pub wallet: Option<String>,

    /// Execute commands from a file (one per line) and exit
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Answer every dialog automatically (for scripting)
    #[arg(long)]
    pub auto_confirm: bool,

    /// Output events as JSON lines (for scripting/parsing)
    #[arg(long)]
    pub json: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Args {
    /// Settings file to use.
    pub fn settings_path(&self) -> PathBuf {
        self.settings
            .clone()
            .unwrap_or_else(crate::settings::settings_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_values() {
        let args = Args::parse_from(["wallet-coordinator-cli"]);
        assert!(args.wallet.is_none());
        assert!(args.file.is_none());
        assert!(!args.auto_confirm);
        assert!(!args.json);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_settings_override() {
        let args = Args::parse_from(["wallet-coordinator-cli", "--settings", "/tmp/w.toml"]);
        assert_eq!(args.settings_path(), PathBuf::from("/tmp/w.toml"));
    }

    #[test]
    fn test_args_batch_file_and_wallet() {
        let args = Args::parse_from(["wallet-coordinator-cli", "-f", "script.txt", "-w", "Alice"]);
        assert_eq!(args.file, Some(PathBuf::from("script.txt")));
        assert_eq!(args.wallet, Some("Alice".to_string()));
    }

    #[test]
    fn test_args_output_modes() {
        let args = Args::parse_from(["wallet-coordinator-cli", "--json", "--auto-confirm", "-v"]);
        assert!(args.json);
        assert!(args.auto_confirm);
        assert!(args.verbose);
    }
}
