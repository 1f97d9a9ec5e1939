//! CLI execution runner.
//!
//! Applies [`ReplCommand`]s to the wallet coordinators, interactively or from
//! a command file.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::session::{SessionEvent, SessionPage};

use super::bootstrap::CliContext;
use super::repl::{ReplCommand, HELP};

/// Snapshot printed by the `status` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub wallet: String,
    pub page: Option<SessionPage>,
    pub is_loading: bool,
    pub authenticated: bool,
    pub focused: bool,
    pub discovery_registered: bool,
    pub auto_coinjoin: bool,
    pub anon_score_target: u32,
    pub pleb_stop_threshold: String,
    pub coinjoin_profile: String,
}

impl StatusReport {
    pub fn collect(ctx: &CliContext) -> Self {
        let coordinator = ctx.coordinator();
        let state = coordinator.state();
        let stored = ctx.settings_manager.get().coinjoin;
        Self {
            wallet: coordinator.wallet().to_string(),
            page: state.page,
            is_loading: state.is_loading(),
            authenticated: state.is_authenticated(),
            focused: state.focused,
            discovery_registered: ctx.registrations.contains(coordinator.discovery_key()),
            auto_coinjoin: stored.auto_coinjoin,
            anon_score_target: stored.anon_score_target,
            pleb_stop_threshold: stored.pleb_stop_threshold.to_string(),
            coinjoin_profile: ctx
                .coinjoin
                .selected_profile_name()
                .get()
                .unwrap_or_else(|| "None".to_string()),
        }
    }

    fn render(&self) -> String {
        let page = self
            .page
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "wallet:        {}\n\
             page:          {}{}\n\
             authenticated: {}\n\
             focused:       {}\n\
             discovery:     {}\n\
             auto-coinjoin: {}\n\
             anon target:   {}\n\
             pleb stop:     {}\n\
             profile:       {}",
            self.wallet,
            page,
            if self.is_loading { " (loading)" } else { "" },
            self.authenticated,
            self.focused,
            if self.discovery_registered { "registered" } else { "-" },
            self.auto_coinjoin,
            self.anon_score_target,
            self.pleb_stop_threshold,
            self.coinjoin_profile,
        )
    }
}

/// Let the session pump and pipelines observe what was just emitted.
async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

/// Execute one command.
pub async fn execute_command(ctx: &mut CliContext, command: ReplCommand) -> Result<()> {
    match command {
        ReplCommand::Login => {
            ctx.signals.authenticated.set(true);
        }
        ReplCommand::Logout => {
            ctx.signals.authenticated.set(false);
        }
        ReplCommand::Focus => {
            ctx.signals.focused.set(true);
        }
        ReplCommand::Blur => {
            ctx.signals.focused.set(false);
        }
        ReplCommand::Loaded => {
            let generation = ctx.coordinator().load_generation();
            ctx.signals.load_completed.fire(generation);
        }
        ReplCommand::Anon(n) => ctx.coinjoin.set_anon_score_target(n),
        ReplCommand::Pleb(text) => ctx.coinjoin.set_pleb_stop_threshold(text),
        ReplCommand::AutoCoinJoin => {
            let enabled = ctx.coinjoin.toggle_auto_coinjoin().await?;
            println!("auto-coinjoin: {}", if enabled { "on" } else { "off" });
        }
        ReplCommand::Profile => match ctx.coinjoin.select_profile().await? {
            Some(profile) => println!("profile: {}", profile),
            None => println!("profile unchanged"),
        },
        ReplCommand::Confirm(prompt) => {
            let confirmed = ctx.settings_page.confirm_setting(prompt).await?;
            println!("confirmed: {}", confirmed);
        }
        ReplCommand::Wait(ms) => {
            let quiet_window = ctx.settings_manager.read(|s| s.coordinator.quiet_window());
            let duration = ms.map(Duration::from_millis).unwrap_or(quiet_window * 2);
            tokio::time::sleep(duration).await;
        }
        ReplCommand::Status => {
            let report = StatusReport::collect(ctx);
            if ctx.args.json {
                println!("{}", serde_json::to_string(&report)?);
            } else {
                println!("{}", report.render());
            }
        }
        ReplCommand::Help => eprintln!("{}", HELP),
        ReplCommand::Usage(usage) => anyhow::bail!("usage: {}", usage),
        ReplCommand::Unknown(cmd) => anyhow::bail!("Unknown command: {}", cmd),
        ReplCommand::Quit | ReplCommand::Empty => {}
    }

    settle().await;
    Ok(())
}

/// Execute commands from a file, one per line.
///
/// Blank lines and lines starting with `#` are skipped. Execution stops at
/// the first failing command or at `/quit`.
pub async fn execute_batch(ctx: &mut CliContext, file_path: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(file_path)
        .await
        .with_context(|| format!("Failed to read command file: {}", file_path.display()))?;

    let commands: Vec<(usize, ReplCommand)> = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, ReplCommand::parse(line)))
        .filter(|(_, command)| *command != ReplCommand::Empty)
        .collect();

    if commands.is_empty() {
        anyhow::bail!("No commands found in file: {}", file_path.display());
    }

    if ctx.args.verbose {
        eprintln!(
            "[batch] Executing {} command(s) from {}",
            commands.len(),
            file_path.display()
        );
    }

    for (line, command) in commands {
        if command == ReplCommand::Quit {
            break;
        }
        execute_command(ctx, command)
            .await
            .with_context(|| format!("{}:{}", file_path.display(), line))?;
    }

    Ok(())
}
