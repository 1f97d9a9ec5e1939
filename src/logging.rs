//! Tracing subscriber setup.

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Crate-level log directive for the given verbosity.
pub fn crate_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("wallet_coordinator={}", level)
}

/// Install a `fmt` subscriber filtered by `RUST_LOG` plus the crate directive.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(verbose: bool) {
    let mut filter = EnvFilter::from_default_env();
    match crate_directive(verbose).parse::<Directive>() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Invalid log directive: {}", e),
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
