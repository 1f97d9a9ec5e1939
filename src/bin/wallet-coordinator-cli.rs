//! Wallet coordinator CLI - drive a wallet session from the terminal
//!
//! # Usage
//!
//! ```bash
//! # Build the CLI binary
//! cargo build --features cli --bin wallet-coordinator-cli
//!
//! # Interactive REPL
//! ./target/debug/wallet-coordinator-cli --wallet Alice
//!
//! # Run a command script, answering dialogs automatically
//! ./target/debug/wallet-coordinator-cli -f session.txt --auto-confirm
//!
//! # JSON output for scripting
//! ./target/debug/wallet-coordinator-cli -f session.txt --auto-confirm --json | jq .
//! ```

use anyhow::Result;
use clap::Parser;

use wallet_coordinator::cli::{execute_batch, initialize, run_repl, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut ctx = initialize(&args).await?;

    let result = if let Some(ref file) = args.file {
        execute_batch(&mut ctx, file).await
    } else {
        run_repl(&mut ctx).await
    };

    // Graceful shutdown
    ctx.shutdown().await?;

    result
}
