//! Observable values with ordered emissions.
//!
//! A [`Signal`] holds the latest value of some piece of state and pushes every
//! assignment to its subscribers through unbounded channels. Emissions carry a
//! sequence number that increases by one per `set`, so subscribers observe
//! changes in exactly the order they were made.
//!
//! Three flavours exist:
//! - [`Signal::new`]: starts with a value and replays the latest value to new
//!   subscribers (a "behaviour", e.g. `is_authenticated`).
//! - [`Signal::empty`]: replays once a first value has been set.
//! - [`Signal::trigger`]: never replays; subscribers only see emissions made
//!   after they subscribed (e.g. `load_completed`).
//!
//! `set` always emits, even when the value is unchanged. Deciding whether a
//! repeated value matters is the subscriber's job.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// One value delivered to a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission<T> {
    /// Position of this emission in the signal's history (0 = initial value)
    pub sequence: u64,
    /// Wall-clock time of the emission
    pub at: DateTime<Utc>,
    pub value: T,
}

struct SignalState<T> {
    current: Option<Emission<T>>,
    sequence: u64,
    subscribers: Vec<mpsc::UnboundedSender<Emission<T>>>,
}

struct SignalInner<T> {
    replay: bool,
    state: Mutex<SignalState<T>>,
}

/// A shared, sequence-ordered observable value.
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Signal")
            .field("value", &state.current.as_ref().map(|e| &e.value))
            .field("sequence", &state.sequence)
            .field("replay", &self.inner.replay)
            .finish()
    }
}

impl<T: Clone + Send + 'static> Signal<T> {
    /// A replaying signal seeded with `initial`.
    pub fn new(initial: T) -> Self {
        Self::build(
            true,
            Some(Emission {
                sequence: 0,
                at: Utc::now(),
                value: initial,
            }),
        )
    }

    /// A replaying signal with no value yet.
    pub fn empty() -> Self {
        Self::build(true, None)
    }

    /// A non-replaying signal for one-shot notifications.
    pub fn trigger() -> Self {
        Self::build(false, None)
    }

    fn build(replay: bool, current: Option<Emission<T>>) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                replay,
                state: Mutex::new(SignalState {
                    current,
                    sequence: 0,
                    subscribers: Vec::new(),
                }),
            }),
        }
    }

    /// Assign a new value and push it to every live subscriber.
    ///
    /// Returns the sequence number of the emission. Closed subscribers are
    /// pruned here.
    pub fn set(&self, value: T) -> u64 {
        let mut state = self.inner.state.lock();
        state.sequence += 1;
        let emission = Emission {
            sequence: state.sequence,
            at: Utc::now(),
            value,
        };
        // Sending under the lock keeps concurrent setters totally ordered.
        state
            .subscribers
            .retain(|tx| tx.send(emission.clone()).is_ok());
        state.current = Some(emission);
        state.sequence
    }

    /// Alias of [`Signal::set`] that reads better on triggers.
    pub fn fire(&self, value: T) -> u64 {
        self.set(value)
    }

    /// Latest value, if any has been set.
    pub fn get(&self) -> Option<T> {
        self.inner
            .state
            .lock()
            .current
            .as_ref()
            .map(|e| e.value.clone())
    }

    /// Sequence number of the latest emission.
    pub fn sequence(&self) -> u64 {
        self.inner.state.lock().sequence
    }

    pub fn replays(&self) -> bool {
        self.inner.replay
    }

    /// Start receiving emissions. Replaying signals deliver the latest value
    /// first.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.inner.state.lock();
        let mut replayed = false;
        if self.inner.replay {
            if let Some(current) = &state.current {
                // Receiver is alive, this cannot fail.
                replayed = tx.send(current.clone()).is_ok();
            }
        }
        state.subscribers.push(tx);
        Subscription { rx, replayed }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.inner.state.lock();
        state.subscribers.retain(|tx| !tx.is_closed());
        state.subscribers.len()
    }
}

/// Receiving end of a [`Signal`]. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<Emission<T>>,
    replayed: bool,
}

impl<T> Subscription<T> {
    /// Whether the first queued emission is the value the signal held at
    /// subscribe time rather than a later `set`.
    pub fn replayed(&self) -> bool {
        self.replayed
    }

    /// Wait for the next emission. `None` once every handle to the signal has
    /// been dropped and the backlog is drained.
    pub async fn next(&mut self) -> Option<Emission<T>> {
        self.rx.recv().await
    }

    /// Take the next emission without waiting.
    pub fn try_next(&mut self) -> Option<Emission<T>> {
        self.rx.try_recv().ok()
    }

    /// Drain everything currently queued.
    pub fn drain(&mut self) -> Vec<Emission<T>> {
        let mut out = Vec::new();
        while let Ok(emission) = self.rx.try_recv() {
            out.push(emission);
        }
        out
    }
}
