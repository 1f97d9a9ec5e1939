//! Recording doubles for the external collaborators, shared by the unit and
//! integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::discovery::{ComposedKey, DiscoveryIndex, SearchEntry};
use crate::error::{CoordinatorError, Result};
use crate::host::{DialogHost, DialogRequest, DialogResponse, HostError, PageHost, SessionLoader};
use crate::session::{LoadGeneration, SessionPage};
use crate::settings::SettingStore;
use crate::signal::Signal;

/// In-memory setting that records every write.
pub struct RecordingStore<V> {
    current: Mutex<V>,
    writes: Mutex<Vec<V>>,
    fail: Mutex<bool>,
}

impl<V: Clone> RecordingStore<V> {
    pub fn new(initial: V) -> Self {
        Self {
            current: Mutex::new(initial),
            writes: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        }
    }

    pub fn writes(&self) -> Vec<V> {
        self.writes.lock().clone()
    }

    pub fn current(&self) -> V {
        self.current.lock().clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.fail.lock() = fail;
    }
}

impl<V: Clone + Send + Sync + 'static> SettingStore<V> for RecordingStore<V> {
    fn read(&self) -> V {
        self.current.lock().clone()
    }

    fn write(&self, value: V) -> Result<()> {
        if *self.fail.lock() {
            return Err(CoordinatorError::Persistence("disk unavailable".to_string()));
        }
        self.writes.lock().push(value.clone());
        *self.current.lock() = value;
        Ok(())
    }
}

/// Call made on a [`RecordingPages`] host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCall {
    Show(SessionPage),
    Navigate(SessionPage),
}

#[derive(Default)]
pub struct RecordingPages {
    calls: Mutex<Vec<(String, PageCall)>>,
}

impl RecordingPages {
    pub fn calls(&self) -> Vec<PageCall> {
        self.calls.lock().iter().map(|(_, c)| *c).collect()
    }

    pub fn shown(&self) -> Vec<SessionPage> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PageCall::Show(p) => Some(p),
                PageCall::Navigate(_) => None,
            })
            .collect()
    }

    pub fn wallets(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(w, _)| w.clone()).collect()
    }
}

impl PageHost for RecordingPages {
    fn show(&self, wallet: &str, page: SessionPage) {
        self.calls.lock().push((wallet.to_string(), PageCall::Show(page)));
    }

    fn navigate(&self, wallet: &str, page: SessionPage) {
        self.calls
            .lock()
            .push((wallet.to_string(), PageCall::Navigate(page)));
    }
}

#[derive(Default)]
pub struct RecordingDiscovery {
    entries: Mutex<HashMap<ComposedKey, SearchEntry>>,
    adds: Mutex<usize>,
    removes: Mutex<usize>,
}

impl RecordingDiscovery {
    pub fn add_count(&self) -> usize {
        *self.adds.lock()
    }

    pub fn remove_count(&self) -> usize {
        *self.removes.lock()
    }

    pub fn contains(&self, key: &ComposedKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

impl DiscoveryIndex for RecordingDiscovery {
    fn add(&self, key: &ComposedKey, entry: &SearchEntry) {
        *self.adds.lock() += 1;
        self.entries.lock().insert(key.clone(), entry.clone());
    }

    fn remove(&self, key: &ComposedKey) {
        *self.removes.lock() += 1;
        self.entries.lock().remove(key);
    }
}

/// Loader that records requested generations and can report completion.
pub struct RecordingLoader {
    started: Mutex<Vec<LoadGeneration>>,
    completed: Signal<LoadGeneration>,
    /// Complete each load synchronously from inside `begin_load`
    complete_immediately: bool,
}

impl RecordingLoader {
    pub fn new(completed: Signal<LoadGeneration>) -> Self {
        Self {
            started: Mutex::new(Vec::new()),
            completed,
            complete_immediately: false,
        }
    }

    pub fn immediate(completed: Signal<LoadGeneration>) -> Self {
        Self {
            complete_immediately: true,
            ..Self::new(completed)
        }
    }

    pub fn started(&self) -> Vec<LoadGeneration> {
        self.started.lock().clone()
    }

    /// Report completion of the most recent load.
    pub fn complete_latest(&self) {
        if let Some(generation) = self.started.lock().last().copied() {
            self.completed.fire(generation);
        }
    }
}

impl SessionLoader for RecordingLoader {
    fn begin_load(&self, _wallet: &str, generation: LoadGeneration) {
        self.started.lock().push(generation);
        if self.complete_immediately {
            self.completed.fire(generation);
        }
    }
}

/// Dialog host answering from a script of canned responses.
#[derive(Default)]
pub struct ScriptedDialogs {
    responses: Mutex<VecDeque<DialogResponse>>,
    requests: Mutex<Vec<DialogRequest>>,
}

impl ScriptedDialogs {
    pub fn with_responses(responses: impl IntoIterator<Item = DialogResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<DialogRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl DialogHost for ScriptedDialogs {
    async fn ask(
        &self,
        _request_id: String,
        request: DialogRequest,
    ) -> std::result::Result<DialogResponse, HostError> {
        self.requests.lock().push(request);
        Ok(self
            .responses
            .lock()
            .pop_front()
            .unwrap_or(DialogResponse::Dismissed))
    }

    fn is_interactive(&self) -> bool {
        true
    }
}
