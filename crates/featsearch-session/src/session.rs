//! Search session driver.
//!
//! [`SearchSession`] wires a [`SearchMachine`] to the outside world. It
//! translates [`SearchEvent`]s into machine transitions, carries out the
//! resulting [`Effect`]s (timers, backend calls, store notifications) and
//! feeds their completions back in, tagged so the machine can discard stale
//! ones.
//!
//! Two ways to drive it:
//!
//! - Step by step: [`SearchSession::handle`], then
//!   [`SearchSession::next_completion`] or [`SearchSession::settle`].
//!   Used by tests and the headless CLI.
//! - As a task: [`SearchSession::spawn`] returns a [`SessionHandle`] that
//!   accepts events over a channel and publishes every new
//!   [`SearchState`] on a `watch` channel.

use crate::debounce::Debouncer;
use crate::event::SearchEvent;
use crate::machine::{Effect, Phase, SearchMachine, SearchState};
use crate::resolver::{Resolution, SelectionResolver};
use featsearch_backend::{DatasetContext, FeatureBackend, FeatureQuery, FeatureReply, FeatureStore};
use featsearch_core::config::SearchConfig;
use featsearch_core::{ActiveFeature, Clustering, FieldId, TypeFilter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};

/// Capacity of the event channel used by [`SessionHandle`].
const EVENT_CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub debounce: Duration,
    pub bucket_limit: usize,
    pub commit_delay: Duration,
    pub clear_delay: Duration,
}

impl From<&SearchConfig> for SessionSettings {
    fn from(cfg: &SearchConfig) -> Self {
        Self {
            debounce: cfg.debounce(),
            bucket_limit: cfg.bucket_limit,
            commit_delay: cfg.commit_delay(),
            clear_delay: cfg.clear_delay(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

/// The slot a search widget is bound to and its initial text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    pub field: FieldId,
    pub search_type: TypeFilter,
    pub value: String,
}

impl Binding {
    pub fn new(field: FieldId, search_type: TypeFilter, value: impl Into<String>) -> Self {
        Self { field, search_type, value: value.into() }
    }
}

// ---------------------------------------------------------------------------
// Completions
// ---------------------------------------------------------------------------

/// Result of asynchronous work, tagged with the seq it was started for.
#[derive(Debug)]
enum Completion {
    DebounceElapsed { seq: u64 },
    Search { seq: u64, reply: Option<FeatureReply> },
    Resolved { commit: u64, feature: ActiveFeature },
    ClearDue { field: FieldId, search_type: TypeFilter },
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct SearchSession<B, D, S> {
    machine: SearchMachine,
    backend: Arc<B>,
    dataset: Arc<D>,
    store: Arc<S>,
    resolver: SelectionResolver<B>,
    debouncer: Debouncer,
    clear_delay: Duration,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl<B, D, S> SearchSession<B, D, S>
where
    B: FeatureBackend,
    D: DatasetContext,
    S: FeatureStore,
{
    pub fn new(
        binding: Binding,
        backend: Arc<B>,
        dataset: Arc<D>,
        store: Arc<S>,
        settings: SessionSettings,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            machine: SearchMachine::new(binding.field, binding.search_type, binding.value)
                .with_bucket_limit(settings.bucket_limit),
            resolver: SelectionResolver::new(Arc::clone(&backend), settings.commit_delay),
            backend,
            dataset,
            store,
            debouncer: Debouncer::new(settings.debounce),
            clear_delay: settings.clear_delay,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &SearchState {
        self.machine.state()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn is_busy(&self) -> bool {
        self.machine.is_busy()
    }

    /// Apply one UI event.
    pub fn handle(&mut self, event: SearchEvent) {
        let effects = match event {
            SearchEvent::TextChanged(text) => self.machine.text_changed(text),
            SearchEvent::TypeChanged(filter) => {
                let clusterings = self.clusterings();
                self.machine.type_changed(filter, &clusterings)
            }
            SearchEvent::Highlight(selection) => self.machine.highlight(selection),
            SearchEvent::Pick(selection) => self.machine.pick(selection),
            SearchEvent::Blur => self.machine.blur(),
            SearchEvent::Rebind { field, search_type, value } => {
                self.machine.rebind(field, search_type, value)
            }
        };
        self.execute(effects);
    }

    /// Wait for the next piece of asynchronous work to finish and apply it.
    pub async fn next_completion(&mut self) {
        // The session holds a sender, so `recv` only returns `None` if the
        // channel was closed explicitly, which never happens.
        if let Some(completion) = self.rx.recv().await {
            self.complete(completion);
        }
    }

    /// Process completions until no timer, query, resolution or clear is
    /// outstanding.
    pub async fn settle(&mut self) {
        while self.machine.is_busy() {
            self.next_completion().await;
        }
    }

    /// Event loop: apply events and completions as they arrive, publishing
    /// state after each. When the event channel closes, pending work is
    /// settled and the final state returned.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<SearchEvent>,
        state: watch::Sender<SearchState>,
    ) -> SearchState {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
                Some(completion) = self.rx.recv() => self.complete(completion),
            }
            state.send_if_modified(|current| {
                if current == self.machine.state() {
                    return false;
                }
                *current = self.machine.state().clone();
                true
            });
        }

        tracing::debug!("session: event channel closed, settling");
        self.settle().await;
        let last = self.machine.state().clone();
        state.send_replace(last.clone());
        last
    }

    /// Run the session on its own task.
    pub fn spawn(self) -> SessionHandle
    where
        Self: Send + 'static,
    {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(self.machine.state().clone());
        let task = tokio::spawn(self.run(events_rx, state_tx));
        SessionHandle { events: events_tx, state: state_rx, task }
    }

    // -- internals ----------------------------------------------------------

    fn complete(&mut self, completion: Completion) {
        let effects = match completion {
            Completion::DebounceElapsed { seq } => self.machine.debounce_elapsed(seq),
            Completion::Search { seq, reply } => {
                let matches = reply.map(FeatureReply::into_matches).unwrap_or_default();
                let clusterings = self.clusterings();
                self.machine.search_completed(seq, matches, &clusterings)
            }
            Completion::Resolved { commit, feature } => self.machine.resolved(commit, feature),
            Completion::ClearDue { field, search_type } => self.machine.clear_due(field, search_type),
        };
        self.execute(effects);
    }

    /// Clusterings of the dataset active right now.
    fn clusterings(&self) -> Vec<Clustering> {
        self.dataset
            .active_metadata()
            .map(|m| m.clusterings)
            .unwrap_or_default()
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ScheduleDebounce { seq } => {
                    self.debouncer.schedule(&self.tx, Completion::DebounceElapsed { seq });
                }
                Effect::CancelDebounce => self.debouncer.cancel(),
                Effect::Search { seq, query } => {
                    let query = FeatureQuery {
                        loom_file_path: self.dataset.active_dataset(),
                        query,
                    };
                    tracing::debug!(seq, dataset = %query.loom_file_path, query = %query.query, "session: search");
                    let backend = Arc::clone(&self.backend);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let reply = backend.search(query).await;
                        let _ = tx.send(Completion::Search { seq, reply });
                    });
                }
                Effect::ScheduleClear { field, search_type } => {
                    let delay = self.clear_delay;
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(Completion::ClearDue { field, search_type });
                    });
                }
                Effect::Resolve { commit, field, search_type, selection } => {
                    let resolution = Resolution {
                        field,
                        search_type,
                        dataset: self.dataset.active_dataset(),
                        clusterings: self.clusterings(),
                        selection,
                    };
                    let resolver = self.resolver.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let feature = resolver.resolve(resolution).await;
                        let _ = tx.send(Completion::Resolved { commit, feature });
                    });
                }
                Effect::CommitActiveFeature(feature) => {
                    tracing::debug!(field = feature.field, name = %feature.name, "session: commit");
                    self.store.commit_active_feature(feature);
                }
                Effect::ClearActiveFeature { field, search_type } => {
                    tracing::debug!(field, %search_type, "session: clear");
                    self.store.clear_active_feature(field, search_type);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a session running on its own task.
#[derive(Debug)]
pub struct SessionHandle {
    events: mpsc::Sender<SearchEvent>,
    state: watch::Receiver<SearchState>,
    task: JoinHandle<SearchState>,
}

impl SessionHandle {
    /// Send an event. Returns `false` if the session has stopped.
    pub async fn send(&self, event: SearchEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// Snapshot of the most recently published state.
    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }

    /// Close the event channel, wait for pending work and return the final
    /// state.
    pub async fn shutdown(self) -> Result<SearchState, JoinError> {
        drop(self.events);
        self.task.await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
