//! CLI module for driving a wallet session headlessly.
//!
//! # Architecture
//!
//! The CLI wires the library coordinators to a [`CliHost`](crate::host::CliHost).
//! Instead of rendering pages, the host sends events through a channel that
//! is consumed by the output handler.
//!
//! ```text
//! +--------------------+     +-----------+     +---------------+
//! | SessionCoordinator | --> | CliHost   | --> | output.rs     |
//! | CommitPipelines    |     | (emit())  |     | (print/JSON)  |
//! +--------------------+     +-----------+     +---------------+
//! ```
//!
//! # REPL Mode
//!
//! When no command file is provided via `-f`, the CLI enters
//! interactive REPL mode. See `repl.rs` for details.

mod args;
mod bootstrap;
mod output;
mod repl;
mod runner;

pub use args::Args;
pub use bootstrap::{initialize, CliContext};
pub use output::run_event_loop;
pub use repl::{run_repl, ReplCommand};
pub use runner::{execute_batch, execute_command, StatusReport};
