//! Session coordinator: drives the pure state machine against real hosts.
//!
//! Events enter through [`SessionCoordinator::dispatch`] (directly, or from
//! the signal pump started by [`SessionCoordinator::attach`]). A single
//! dispatcher at a time drains a FIFO queue: it computes one transition,
//! publishes the new state, applies that transition's side effects, and only
//! then takes the next event. Side effects that emit further events (a loader
//! completing synchronously, a host flipping focus) just enqueue; the
//! initiating `dispatch` call returns once the queue is empty.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::discovery::{ComposedKey, RegistrationSet, SearchEntry};
use crate::host::{PageHost, SessionLoader};
use crate::signal::Signal;

use super::state::{transition, LoadGeneration, SessionEvent, SessionPage, SessionState, SideEffect};

/// Collaborators a session coordinator acts on.
#[derive(Clone)]
pub struct SessionHosts {
    pub pages: Arc<dyn PageHost>,
    pub loader: Arc<dyn SessionLoader>,
    pub registrations: Arc<RegistrationSet>,
}

/// Upstream signals a coordinator listens to.
#[derive(Clone)]
pub struct SessionSignals {
    pub authenticated: Signal<bool>,
    pub focused: Signal<bool>,
    pub load_completed: Signal<LoadGeneration>,
}

impl SessionSignals {
    /// Signals with the given initial authentication/focus values and a
    /// fresh completion trigger.
    pub fn new(authenticated: bool, focused: bool) -> Self {
        Self {
            authenticated: Signal::new(authenticated),
            focused: Signal::new(focused),
            load_completed: Signal::trigger(),
        }
    }
}

struct Driver {
    state: SessionState,
    queue: VecDeque<SessionEvent>,
    dispatching: bool,
    disposed: bool,
}

/// Per-wallet session coordinator.
pub struct SessionCoordinator {
    id: Uuid,
    wallet: String,
    hosts: SessionHosts,
    driver: Mutex<Driver>,
    page: Signal<SessionPage>,
    show_discovery: Signal<bool>,
    discovery_key: ComposedKey,
    discovery_entry: SearchEntry,
}

impl SessionCoordinator {
    pub fn new(wallet: impl Into<String>, hosts: SessionHosts) -> Arc<Self> {
        let wallet = wallet.into();
        Arc::new(Self {
            id: Uuid::new_v4(),
            discovery_key: ComposedKey::new(["Wallet Info", wallet.as_str()]),
            discovery_entry: SearchEntry::new("Wallet Info", "Display wallet info", "Wallet"),
            wallet,
            hosts,
            driver: Mutex::new(Driver {
                state: SessionState::default(),
                queue: VecDeque::new(),
                dispatching: false,
                disposed: false,
            }),
            page: Signal::empty(),
            show_discovery: Signal::new(false),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn wallet(&self) -> &str {
        &self.wallet
    }

    /// Snapshot of the derived state.
    pub fn state(&self) -> SessionState {
        self.driver.lock().state
    }

    pub fn current_page(&self) -> Option<SessionPage> {
        self.state().page
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    pub fn load_generation(&self) -> LoadGeneration {
        self.state().generation
    }

    /// Page entries, in transition order.
    pub fn page(&self) -> &Signal<SessionPage> {
        &self.page
    }

    /// Whether the discovery entry should be shown.
    pub fn show_discovery(&self) -> &Signal<bool> {
        &self.show_discovery
    }

    pub fn discovery_key(&self) -> &ComposedKey {
        &self.discovery_key
    }

    /// Feed one event and process the queue to a fixed point.
    ///
    /// If a dispatch is already running (re-entrant call from a side effect,
    /// or a concurrent caller) the event is queued and handled by that
    /// dispatcher before it returns.
    pub fn dispatch(&self, event: SessionEvent) {
        {
            let mut driver = self.driver.lock();
            if driver.disposed {
                tracing::debug!(
                    wallet = %self.wallet,
                    ?event,
                    "Dropping event for disposed session"
                );
                return;
            }
            driver.queue.push_back(event);
            if driver.dispatching {
                return;
            }
            driver.dispatching = true;
        }

        loop {
            let effects = {
                let mut driver = self.driver.lock();
                let Some(event) = driver.queue.pop_front() else {
                    driver.dispatching = false;
                    break;
                };
                if driver.disposed {
                    driver.queue.clear();
                    driver.dispatching = false;
                    break;
                }
                let (next, effects) = transition(&driver.state, event);
                if effects.is_empty() && next == driver.state {
                    tracing::trace!(wallet = %self.wallet, ?event, "Event caused no transition");
                }
                driver.state = next;
                effects
            };

            // Lock released: effects may re-enter `dispatch` or `dispose`.
            for effect in effects {
                if self.stop_if_disposed() {
                    return;
                }
                self.apply(effect);
            }
        }
    }

    /// Ends the running dispatch once the coordinator has been disposed.
    fn stop_if_disposed(&self) -> bool {
        let mut driver = self.driver.lock();
        if !driver.disposed {
            return false;
        }
        driver.queue.clear();
        driver.dispatching = false;
        tracing::debug!(
            wallet = %self.wallet,
            "Session disposed mid-dispatch, dropping remaining effects"
        );
        true
    }

    fn apply(&self, effect: SideEffect) {
        match effect {
            SideEffect::ShowPage(page) => {
                tracing::info!(wallet = %self.wallet, page = %page, "Entering session page");
                self.page.set(page);
                self.hosts.pages.show(&self.wallet, page);
            }
            SideEffect::BeginLoad(generation) => {
                tracing::debug!(wallet = %self.wallet, %generation, "Starting wallet load");
                self.hosts.loader.begin_load(&self.wallet, generation);
            }
            SideEffect::Navigate(page) => {
                self.hosts.pages.navigate(&self.wallet, page);
            }
            SideEffect::RegisterDiscovery => {
                self.show_discovery.set(true);
                self.hosts
                    .registrations
                    .add(self.discovery_key.clone(), self.discovery_entry.clone());
                // A concurrent `dispose` may have run its removal before the add.
                if self.is_disposed() && self.hosts.registrations.remove(&self.discovery_key) {
                    self.show_discovery.set(false);
                }
            }
            SideEffect::UnregisterDiscovery => {
                self.show_discovery.set(false);
                self.hosts.registrations.remove(&self.discovery_key);
            }
        }
    }

    /// Pump `signals` into this coordinator on a background task.
    ///
    /// Replayed focus is processed before replayed authentication so the
    /// very first transition already sees the current focus. Must be called
    /// within a tokio runtime.
    pub fn attach(self: &Arc<Self>, signals: &SessionSignals) -> SessionHandle {
        let mut focused = signals.focused.subscribe();
        let mut authenticated = signals.authenticated.subscribe();
        let mut completed = signals.load_completed.subscribe();
        let cancel = CancellationToken::new();

        let task = {
            let coordinator = Arc::clone(self);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tracing::debug!(
                    wallet = %coordinator.wallet,
                    id = %coordinator.id,
                    "Session pump started"
                );
                loop {
                    let event = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        Some(e) = focused.next() => SessionEvent::Focused(e.value),
                        Some(e) = authenticated.next() => SessionEvent::Authenticated(e.value),
                        Some(e) = completed.next() => SessionEvent::LoadCompleted(e.value),
                        else => break,
                    };
                    coordinator.dispatch(event);
                }
                tracing::debug!(wallet = %coordinator.wallet, "Session pump stopped");
            })
        };

        SessionHandle {
            coordinator: Arc::clone(self),
            cancel,
            task: Some(task),
        }
    }

    /// Stop processing events and withdraw the discovery entry.
    pub fn dispose(&self) {
        {
            let mut driver = self.driver.lock();
            if driver.disposed {
                return;
            }
            driver.disposed = true;
            driver.queue.clear();
        }
        if self.hosts.registrations.remove(&self.discovery_key) {
            self.show_discovery.set(false);
        }
        tracing::debug!(wallet = %self.wallet, "Session coordinator disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.driver.lock().disposed
    }
}

/// Owner of an attached coordinator. Dropping it disposes the coordinator.
pub struct SessionHandle {
    coordinator: Arc<SessionCoordinator>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn coordinator(&self) -> &Arc<SessionCoordinator> {
        &self.coordinator
    }

    pub fn dispose(&self) {
        self.cancel.cancel();
        self.coordinator.dispose();
    }

    /// Dispose and wait for the pump task to exit.
    pub async fn shutdown(mut self) {
        self.dispose();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Session pump task failed: {}", e);
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{PageCall, RecordingDiscovery, RecordingLoader, RecordingPages};

    struct Fixture {
        pages: Arc<RecordingPages>,
        discovery: Arc<RecordingDiscovery>,
        loader: Arc<RecordingLoader>,
        registrations: Arc<RegistrationSet>,
        completed: Signal<LoadGeneration>,
        coordinator: Arc<SessionCoordinator>,
    }

    fn fixture_with(loader: impl FnOnce(Signal<LoadGeneration>) -> RecordingLoader) -> Fixture {
        let completed = Signal::trigger();
        let pages = Arc::new(RecordingPages::default());
        let discovery = Arc::new(RecordingDiscovery::default());
        let loader = Arc::new(loader(completed.clone()));
        let registrations = Arc::new(RegistrationSet::with_index(discovery.clone()));
        let coordinator = SessionCoordinator::new(
            "Alice",
            SessionHosts {
                pages: pages.clone(),
                loader: loader.clone(),
                registrations: registrations.clone(),
            },
        );
        Fixture {
            pages,
            discovery,
            loader,
            registrations,
            completed,
            coordinator,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingLoader::new)
    }

    // =========================================================================
    // Direct dispatch
    // =========================================================================

    mod dispatch_tests {
        use super::*;

        #[test]
        fn login_shows_loading_and_starts_load() {
            let f = fixture();
            f.coordinator.dispatch(SessionEvent::Authenticated(true));

            assert_eq!(f.pages.shown(), vec![SessionPage::LoadingSession]);
            assert_eq!(f.loader.started(), vec![LoadGeneration(1)]);
            assert!(f.coordinator.is_loading());
        }

        #[test]
        fn completion_for_current_generation_shows_ready() {
            let f = fixture();
            f.coordinator.dispatch(SessionEvent::Authenticated(true));
            f.coordinator
                .dispatch(SessionEvent::LoadCompleted(f.coordinator.load_generation()));

            assert_eq!(
                f.pages.shown(),
                vec![SessionPage::LoadingSession, SessionPage::SessionReady]
            );
            assert!(!f.coordinator.is_loading());
        }

        #[test]
        fn page_signal_records_every_entry() {
            let f = fixture();
            let mut pages = f.coordinator.page().subscribe();

            f.coordinator.dispatch(SessionEvent::Authenticated(false));
            f.coordinator.dispatch(SessionEvent::Authenticated(false));
            f.coordinator.dispatch(SessionEvent::Authenticated(true));

            let seen: Vec<_> = pages.drain().into_iter().map(|e| e.value).collect();
            assert_eq!(
                seen,
                vec![
                    SessionPage::LoggedOut,
                    SessionPage::LoggedOut,
                    SessionPage::LoadingSession
                ]
            );
        }

        #[test]
        fn reentrant_completion_reaches_fixed_point_before_return() {
            let f = fixture_with(RecordingLoader::immediate);

            // The loader fires the completion signal from inside begin_load,
            // so route it straight back into dispatch.
            let mut completions = f.completed.subscribe();
            f.coordinator.dispatch(SessionEvent::Authenticated(true));
            while let Some(e) = completions.try_next() {
                f.coordinator.dispatch(SessionEvent::LoadCompleted(e.value));
            }

            assert_eq!(f.coordinator.current_page(), Some(SessionPage::SessionReady));
        }

        #[test]
        fn focus_navigation_follows_page_changes() {
            let f = fixture();
            f.coordinator.dispatch(SessionEvent::Focused(true));
            f.coordinator.dispatch(SessionEvent::Authenticated(true));

            assert_eq!(
                f.pages.calls(),
                vec![
                    PageCall::Show(SessionPage::LoadingSession),
                    PageCall::Navigate(SessionPage::LoadingSession),
                ]
            );
            assert!(f.pages.wallets().iter().all(|w| w == "Alice"));
        }

        #[test]
        fn discovery_entry_follows_login_and_focus() {
            let f = fixture();
            let key = f.coordinator.discovery_key().clone();

            f.coordinator.dispatch(SessionEvent::Focused(true));
            assert!(!f.registrations.contains(&key));

            f.coordinator.dispatch(SessionEvent::Authenticated(true));
            assert!(f.registrations.contains(&key));
            assert_eq!(f.coordinator.show_discovery().get(), Some(true));

            f.coordinator.dispatch(SessionEvent::Authenticated(false));
            assert!(!f.registrations.contains(&key));
            assert!(!f.discovery.contains(&key));
        }

        #[test]
        fn dispose_withdraws_entry_and_ignores_events() {
            let f = fixture();
            f.coordinator.dispatch(SessionEvent::Focused(true));
            f.coordinator.dispatch(SessionEvent::Authenticated(true));
            assert_eq!(f.discovery.len(), 1);

            f.coordinator.dispose();
            assert!(f.coordinator.is_disposed());
            assert_eq!(f.discovery.len(), 0);

            f.coordinator.dispatch(SessionEvent::Authenticated(false));
            assert_eq!(f.pages.shown(), vec![SessionPage::LoadingSession]);
        }
    }

    // =========================================================================
    // Re-entrancy through a host
    // =========================================================================

    mod reentrancy_tests {
        use super::*;
        use std::sync::Weak;

        /// Page host that logs the wallet out whenever it is asked to show the
        /// ready page, re-entering the coordinator from inside an effect.
        struct LogoutOnReady {
            coordinator: Mutex<Weak<SessionCoordinator>>,
            shown: Mutex<Vec<SessionPage>>,
        }

        impl PageHost for LogoutOnReady {
            fn show(&self, _wallet: &str, page: SessionPage) {
                self.shown.lock().push(page);
                if page == SessionPage::SessionReady {
                    if let Some(c) = self.coordinator.lock().upgrade() {
                        c.dispatch(SessionEvent::Authenticated(false));
                    }
                }
            }

            fn navigate(&self, _wallet: &str, _page: SessionPage) {}
        }

        #[test]
        fn effect_driven_events_do_not_deadlock() {
            let host = Arc::new(LogoutOnReady {
                coordinator: Mutex::new(Weak::new()),
                shown: Mutex::new(Vec::new()),
            });
            let coordinator = SessionCoordinator::new(
                "Bob",
                SessionHosts {
                    pages: host.clone(),
                    loader: Arc::new(RecordingLoader::new(Signal::trigger())),
                    registrations: Arc::new(RegistrationSet::new()),
                },
            );
            *host.coordinator.lock() = Arc::downgrade(&coordinator);

            coordinator.dispatch(SessionEvent::Authenticated(true));
            coordinator.dispatch(SessionEvent::LoadCompleted(LoadGeneration(1)));

            assert_eq!(
                *host.shown.lock(),
                vec![
                    SessionPage::LoadingSession,
                    SessionPage::SessionReady,
                    SessionPage::LoggedOut
                ]
            );
            assert_eq!(coordinator.current_page(), Some(SessionPage::LoggedOut));
        }

        /// Page host that tears the coordinator down on the first page it shows.
        struct DisposeOnShow {
            coordinator: Mutex<Weak<SessionCoordinator>>,
        }

        impl PageHost for DisposeOnShow {
            fn show(&self, _wallet: &str, _page: SessionPage) {
                if let Some(c) = self.coordinator.lock().upgrade() {
                    c.dispose();
                }
            }

            fn navigate(&self, _wallet: &str, _page: SessionPage) {}
        }

        #[test]
        fn dispose_from_an_effect_cancels_the_remaining_effects() {
            let host = Arc::new(DisposeOnShow {
                coordinator: Mutex::new(Weak::new()),
            });
            let discovery = Arc::new(RecordingDiscovery::default());
            let loader = Arc::new(RecordingLoader::new(Signal::trigger()));
            let registrations = Arc::new(RegistrationSet::with_index(discovery.clone()));
            let coordinator = SessionCoordinator::new(
                "Carol",
                SessionHosts {
                    pages: host.clone(),
                    loader: loader.clone(),
                    registrations: registrations.clone(),
                },
            );
            *host.coordinator.lock() = Arc::downgrade(&coordinator);

            coordinator.dispatch(SessionEvent::Focused(true));
            coordinator.dispatch(SessionEvent::Authenticated(true));

            assert!(coordinator.is_disposed());
            assert!(loader.started().is_empty());
            assert!(!registrations.contains(coordinator.discovery_key()));
            assert_eq!(discovery.len(), 0);
            assert_eq!(discovery.add_count(), 0);
            assert_ne!(coordinator.show_discovery().get(), Some(true));

            // Later events are dropped without touching the hosts again
            coordinator.dispatch(SessionEvent::Authenticated(false));
            assert!(loader.started().is_empty());
        }
    }

    // =========================================================================
    // Attached signals
    // =========================================================================

    mod attach_tests {
        use super::*;

        #[tokio::test]
        async fn attached_signals_drive_transitions() {
            let f = fixture();
            let signals = SessionSignals {
                authenticated: Signal::new(false),
                focused: Signal::new(true),
                load_completed: f.completed.clone(),
            };
            let mut pages = f.coordinator.page().subscribe();
            let handle = f.coordinator.attach(&signals);

            assert_eq!(pages.next().await.unwrap().value, SessionPage::LoggedOut);

            signals.authenticated.set(true);
            assert_eq!(pages.next().await.unwrap().value, SessionPage::LoadingSession);

            f.loader.complete_latest();
            assert_eq!(pages.next().await.unwrap().value, SessionPage::SessionReady);

            handle.shutdown().await;
        }

        #[tokio::test]
        async fn shutdown_stops_the_pump() {
            let f = fixture();
            let signals = SessionSignals::new(true, false);
            let handle = f.coordinator.attach(&signals);
            let mut pages = f.coordinator.page().subscribe();
            assert_eq!(pages.next().await.unwrap().value, SessionPage::LoadingSession);

            handle.shutdown().await;
            signals.authenticated.set(false);
            tokio::task::yield_now().await;

            assert_eq!(f.pages.shown(), vec![SessionPage::LoadingSession]);
            assert_eq!(signals.authenticated.subscriber_count(), 0);
        }
    }
}
