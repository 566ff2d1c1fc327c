//! Screen controllers: intents in, a replayable state cell and a one-shot
//! effect channel out.
//!
//! Each controller owns a [`ControllerCore`]. State lives in a `watch` channel
//! whose sender is the single writer; every replacement goes through it, so a
//! reduction always sees one consistent prior snapshot. Effects go through a
//! `broadcast` channel and are never replayed to late subscribers.
//!
//! Async intents are gated per logical intent: starting a call bumps that
//! intent's generation and only the latest generation may reduce into state.
//! Spawned tasks hold a `Weak` reference to the core, so a call that finishes
//! after its screen was dropped is a no-op.

use std::{
    collections::{HashMap, HashSet},
    fmt::Debug,
    future::Future,
    hash::Hash,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, PoisonError, Weak},
};

use futures::{future::try_join_all, FutureExt};
use tokio::{
    sync::{broadcast, watch},
    task::{JoinError, JoinHandle},
};
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tracing::{debug, warn};

pub mod events;
pub mod password_change;
pub mod user_edit;
pub mod user_list;

use events::Effect;

const EFFECT_CHANNEL_CAPACITY: usize = 64;

pub trait ScreenState: Clone + Send + Sync + 'static {
    fn set_loading(&mut self, loading: bool);
}

pub trait Intent: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Intent for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket<K> {
    intent: K,
    generation: u64,
}

struct GateState<K> {
    next_generation: u64,
    current: HashMap<K, u64>,
    in_flight: HashSet<K>,
}

/// Latest-wins bookkeeping: the current generation per intent and which
/// intents still have their current call outstanding.
pub struct IntentGate<K> {
    inner: Mutex<GateState<K>>,
}

impl<K: Intent> IntentGate<K> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(GateState {
                next_generation: 0,
                current: HashMap::new(),
                in_flight: HashSet::new(),
            }),
        }
    }

    pub fn begin(&self, intent: K) -> Ticket<K> {
        let mut gate = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        gate.next_generation += 1;
        let generation = gate.next_generation;
        gate.current.insert(intent, generation);
        gate.in_flight.insert(intent);
        Ticket { intent, generation }
    }

    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        let gate = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        gate.current.get(&ticket.intent) == Some(&ticket.generation)
    }

    /// Marks the ticket's call as finished. Returns `false` for superseded
    /// tickets, which leave the gate untouched.
    pub fn finish(&self, ticket: &Ticket<K>) -> bool {
        let mut gate = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if gate.current.get(&ticket.intent) != Some(&ticket.generation) {
            return false;
        }
        gate.in_flight.remove(&ticket.intent)
    }

    pub fn any_in_flight(&self) -> bool {
        let gate = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        !gate.in_flight.is_empty()
    }
}

impl<K: Intent> Default for IntentGate<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Tasks started by one intent call.
#[derive(Debug, Default)]
pub struct IntentTasks(Vec<JoinHandle<()>>);

impl IntentTasks {
    pub fn none() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Waits for every task, including ones whose results were discarded.
    pub async fn join(self) -> Result<(), JoinError> {
        try_join_all(self.0).await.map(|_| ())
    }
}

impl From<JoinHandle<()>> for IntentTasks {
    fn from(handle: JoinHandle<()>) -> Self {
        Self(vec![handle])
    }
}

impl FromIterator<JoinHandle<()>> for IntentTasks {
    fn from_iter<I: IntoIterator<Item = JoinHandle<()>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub struct ControllerCore<S, K> {
    state: watch::Sender<S>,
    effects: broadcast::Sender<Effect>,
    gate: IntentGate<K>,
}

impl<S: ScreenState, K: Intent> ControllerCore<S, K> {
    pub fn new(initial: S) -> Arc<Self> {
        let (state, _) = watch::channel(initial);
        let (effects, _) = broadcast::channel(EFFECT_CHANNEL_CAPACITY);
        Arc::new(Self {
            state,
            effects,
            gate: IntentGate::new(),
        })
    }

    pub fn snapshot(&self) -> S {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    pub fn state_stream(&self) -> WatchStream<S> {
        WatchStream::new(self.state.subscribe())
    }

    pub fn subscribe_effects(&self) -> broadcast::Receiver<Effect> {
        self.effects.subscribe()
    }

    pub fn effect_stream(&self) -> BroadcastStream<Effect> {
        BroadcastStream::new(self.effects.subscribe())
    }

    /// Synchronous transition under the single-writer slot.
    pub fn update(&self, modify: impl FnOnce(&mut S)) {
        self.state.send_modify(modify);
    }

    pub fn emit(&self, effect: Effect) {
        if let Err(broadcast::error::SendError(effect)) = self.effects.send(effect) {
            debug!(?effect, "no effect subscribers; effect dropped");
        }
    }

    /// Applies the outcome of the call identified by `ticket`, unless a newer
    /// call of the same intent has started since. Returns whether it applied.
    ///
    /// `hold_loading` keeps the loading flag up after this call finishes, for
    /// outcomes that are followed by leaving the screen.
    pub fn settle(&self, ticket: &Ticket<K>, hold_loading: bool, apply: impl FnOnce(&mut S)) -> bool {
        self.state.send_if_modified(|state| {
            if !self.gate.finish(ticket) {
                return false;
            }
            apply(state);
            state.set_loading(hold_loading || self.gate.any_in_flight());
            true
        })
    }

    /// Starts `call` as a new latest-wins call of `intent`. The loading flag is
    /// raised before this returns; `reduce` runs once when the call completes,
    /// provided the screen still exists and the call was not superseded. A
    /// call that panics finishes its intent without reducing.
    pub fn launch<T, Fut, R>(self: &Arc<Self>, intent: K, call: Fut, reduce: R) -> JoinHandle<()>
    where
        T: Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        R: FnOnce(&Self, &Ticket<K>, T) + Send + 'static,
    {
        let ticket = self.gate.begin(intent);
        self.update(|state| state.set_loading(true));

        let core: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(call).catch_unwind().await;
            let Some(core) = core.upgrade() else {
                debug!(?intent, "screen torn down before completion; result dropped");
                return;
            };
            let Ok(outcome) = outcome else {
                // a panicking call still ends its intent, or loading would stick
                warn!(?intent, generation = ticket.generation, "intent call panicked");
                core.settle(&ticket, false, |_| {});
                return;
            };
            if !core.gate.is_current(&ticket) {
                debug!(?intent, generation = ticket.generation, "superseded result discarded");
                return;
            }
            reduce(&core, &ticket, outcome);
        })
    }
}

#[cfg(test)]
#[path = "../tests/controller_core_tests.rs"]
mod tests;
