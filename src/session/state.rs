//! Pure session lifecycle state machine.
//!
//! `transition(&state, event)` computes the next [`SessionState`] and the
//! ordered list of [`SideEffect`]s the driver must apply. Nothing here touches
//! a host, a clock or a lock, so every rule is unit-testable directly.
//!
//! Rules:
//! - `Authenticated(false)` always enters `LoggedOut`, even when already there.
//! - `Authenticated(true)` enters `LoadingSession` only on a `false -> true`
//!   edge (or as the first authentication value). Each entry starts a new
//!   [`LoadGeneration`].
//! - `LoadCompleted(g)` enters `SessionReady` only while `LoadingSession` with
//!   generation `g`; anything else is stale and ignored.
//! - `show_discovery = authenticated && focused`, re-evaluated on every
//!   authentication or focus event; only edges produce effects.
//! - While focused, every page entry is also brought to the front, and gaining
//!   focus brings the current page to the front.

use serde::{Deserialize, Serialize};

/// Page displayed for a wallet session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPage {
    LoggedOut,
    LoadingSession,
    SessionReady,
}

impl SessionPage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPage::LoggedOut => "logged_out",
            SessionPage::LoadingSession => "loading_session",
            SessionPage::SessionReady => "session_ready",
        }
    }
}

impl std::fmt::Display for SessionPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token identifying one load cycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct LoadGeneration(pub u64);

impl LoadGeneration {
    pub fn next(self) -> Self {
        LoadGeneration(self.0 + 1)
    }
}

impl std::fmt::Display for LoadGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SessionEvent {
    Authenticated(bool),
    Focused(bool),
    LoadCompleted(LoadGeneration),
}

/// Work the driver performs after a transition, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SideEffect {
    /// Entry action of a page
    ShowPage(SessionPage),
    /// Ask the loader to start loading this generation
    BeginLoad(LoadGeneration),
    /// Bring a page to the front of the host
    Navigate(SessionPage),
    RegisterDiscovery,
    UnregisterDiscovery,
}

/// Derived session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionState {
    /// `None` until the first authentication value arrives
    pub page: Option<SessionPage>,
    /// Last authentication value seen
    pub authenticated: Option<bool>,
    pub focused: bool,
    pub show_discovery: bool,
    /// Generation of the most recent load cycle
    pub generation: LoadGeneration,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        self.page == Some(SessionPage::LoadingSession)
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated == Some(true)
    }
}

/// Compute the state following `event` and the effects to apply.
pub fn transition(state: &SessionState, event: SessionEvent) -> (SessionState, Vec<SideEffect>) {
    let mut next = *state;
    let mut effects = Vec::new();

    match event {
        SessionEvent::Authenticated(false) => {
            next.authenticated = Some(false);
            enter(&mut next, &mut effects, SessionPage::LoggedOut);
        }
        SessionEvent::Authenticated(true) => {
            let was_authenticated = state.is_authenticated();
            next.authenticated = Some(true);
            if !was_authenticated {
                next.generation = state.generation.next();
                enter(&mut next, &mut effects, SessionPage::LoadingSession);
                effects.push(SideEffect::BeginLoad(next.generation));
            }
        }
        SessionEvent::Focused(focused) => {
            next.focused = focused;
            if focused && !state.focused {
                if let Some(page) = next.page {
                    effects.push(SideEffect::Navigate(page));
                }
            }
        }
        SessionEvent::LoadCompleted(generation) => {
            if state.is_loading() && generation == state.generation {
                enter(&mut next, &mut effects, SessionPage::SessionReady);
            }
            // Completions never change authentication or focus.
            return (next, effects);
        }
    }

    next.show_discovery = next.is_authenticated() && next.focused;
    match (state.show_discovery, next.show_discovery) {
        (false, true) => effects.push(SideEffect::RegisterDiscovery),
        (true, false) => effects.push(SideEffect::UnregisterDiscovery),
        _ => {}
    }

    (next, effects)
}

fn enter(next: &mut SessionState, effects: &mut Vec<SideEffect>, page: SessionPage) {
    next.page = Some(page);
    effects.push(SideEffect::ShowPage(page));
    if next.focused {
        effects.push(SideEffect::Navigate(page));
    }
}
