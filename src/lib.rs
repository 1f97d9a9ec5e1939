//! Reactive session and settings coordinators for a desktop wallet.
//!
//! - [`signal`]: observable values with ordered emissions
//! - [`pipeline`]: debounced commit of edited settings into a durable store
//! - [`session`]: login/loading/ready lifecycle per wallet
//! - [`discovery`]: keyed search-entry registrations
//! - [`coinjoin`], [`settings_page`]: settings view coordinators
//!
//! Every collaborator (page host, loader, dialogs, settings store, search
//! index) is injected; see [`host`].

pub mod amount;
pub mod coinjoin;
pub mod discovery;
pub mod error;
pub mod host;
pub mod interaction;
pub mod logging;
pub mod pipeline;
pub mod session;
pub mod settings;
pub mod settings_page;
pub mod signal;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(test)]
mod test_support;

pub use error::{CoordinatorError, Result};
