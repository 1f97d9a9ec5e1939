//! CLI bootstrap - wire one wallet's coordinators to the terminal host.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::coinjoin::CoinJoinSettingsCoordinator;
use crate::discovery::RegistrationSet;
use crate::host::{CliHost, HostEvent};
use crate::logging::init_tracing;
use crate::pipeline::PipelineHandle;
use crate::session::{SessionCoordinator, SessionHandle, SessionHosts, SessionSignals};
use crate::settings::SettingsManager;
use crate::settings_page::SettingsPageCoordinator;
use crate::signal::Signal;

use super::args::Args;
use super::output::run_event_loop;

/// Everything a CLI session drives.
pub struct CliContext {
    pub settings_manager: Arc<SettingsManager>,

    /// Terminal host (pages, loads, dialogs)
    pub host: Arc<CliHost>,

    /// Upstream signals of the wallet session
    pub signals: SessionSignals,

    pub session: SessionHandle,

    pub coinjoin: CoinJoinSettingsCoordinator,

    pub settings_page: SettingsPageCoordinator,

    /// Discovery entries registered by the session
    pub registrations: Arc<RegistrationSet>,

    /// Command-line arguments
    pub args: Args,

    output: JoinHandle<Result<()>>,
    forwarders: Vec<JoinHandle<()>>,
}

impl CliContext {
    pub fn coordinator(&self) -> &Arc<SessionCoordinator> {
        self.session.coordinator()
    }

    /// Graceful shutdown: stop coordinators, then let the output loop drain.
    pub async fn shutdown(self) -> Result<()> {
        self.coinjoin.dispose();
        self.session.shutdown().await;
        for forwarder in self.forwarders {
            forwarder.abort();
        }

        self.host.close();
        match self.output.await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Output handler panicked: {}", e);
                Ok(())
            }
        }
    }
}

/// Report every settled edit of `pipeline` as a host event.
fn forward_outcomes(pipeline: &PipelineHandle, host: Arc<CliHost>) -> JoinHandle<()> {
    let setting = pipeline.name().to_string();
    let mut outcomes = pipeline.outcomes();
    tokio::spawn(async move {
        while let Some(emission) = outcomes.next().await {
            host.emit(HostEvent::SettingSettled {
                setting: setting.clone(),
                outcome: emission.value,
            });
        }
    })
}

/// Load settings and start the session and settings coordinators.
pub async fn initialize(args: &Args) -> Result<CliContext> {
    init_tracing(args.verbose);

    let path = args.settings_path();
    let settings_manager = Arc::new(
        SettingsManager::load(&path)
            .await
            .context("Failed to initialize settings manager")?,
    );

    // Ensure settings file exists (creates template on first run)
    if let Err(e) = settings_manager.ensure_settings_file().await {
        tracing::warn!("Failed to create settings template: {}", e);
    }

    let settings = settings_manager.get();
    let wallet = args
        .wallet
        .clone()
        .filter(|w| !w.trim().is_empty())
        .unwrap_or_else(|| settings.wallet.name.clone());

    if args.verbose {
        eprintln!("[cli] Settings loaded from {}", settings_manager.path().display());
        eprintln!("[cli] Wallet: {}", wallet);
    }

    let (event_tx, event_rx) = mpsc::unbounded_channel::<HostEvent>();
    let json_mode = args.json;
    let output = tokio::spawn(async move { run_event_loop(event_rx, json_mode).await });

    let host = Arc::new(CliHost::new(
        event_tx,
        settings.coordinator.load_delay(),
        args.auto_confirm,
    ));
    let registrations = Arc::new(RegistrationSet::new());

    let coordinator = SessionCoordinator::new(
        wallet,
        SessionHosts {
            pages: host.clone(),
            loader: host.clone(),
            registrations: registrations.clone(),
        },
    );
    let signals = SessionSignals {
        authenticated: Signal::new(false),
        focused: Signal::new(true),
        load_completed: host.load_completed().clone(),
    };
    let session = coordinator.attach(&signals);

    let coinjoin = CoinJoinSettingsCoordinator::new(settings_manager.clone(), host.clone());
    let forwarders = vec![
        forward_outcomes(coinjoin.anon_pipeline(), host.clone()),
        forward_outcomes(coinjoin.pleb_pipeline(), host.clone()),
    ];
    let settings_page = SettingsPageCoordinator::new(host.clone());

    Ok(CliContext {
        settings_manager,
        host,
        signals,
        session,
        coinjoin,
        settings_page,
        registrations,
        args: args.clone(),
        output,
        forwarders,
    })
}
