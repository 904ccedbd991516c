//! Search state machine.
//!
//! [`SearchMachine`] owns the observable [`SearchState`] and decides what
//! happens next, but performs no I/O itself: every transition returns a list
//! of [`Effect`]s for the driver to carry out. Asynchronous work comes back
//! as a tagged completion and is checked against the current tag before it
//! may touch state.
//!
//! # Phases
//!
//! ```text
//!            keystroke                reply (current seq)
//!   Idle ───────────────► Loading ─────────────────────► Displaying
//!    ▲  ◄── empty text ──────┘                               │
//!    │                                         pick / blur   │
//!    └──────────── resolved (current commit) ◄── Committing ◄┘
//! ```
//!
//! # Ordering
//!
//! - Every keystroke bumps `query_seq`. A debounce tick or search reply
//!   carrying an older seq is dropped.
//! - Every commit bumps `commit_seq`. A resolution carrying an older seq is
//!   dropped, so the last commit wins.
//! - [`SearchMachine::rebind`] bumps both, discarding everything in flight.

use featsearch_core::{
    aggregate_with_limit, ActiveFeature, Clustering, FieldId, RawMatch, ResultBucket, TypeFilter,
    BUCKET_LIMIT,
};
use serde::Serialize;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// No query running and nothing being committed.
    Idle,
    /// A debounced query is waiting for its timer or reply.
    Loading,
    /// Buckets are populated and awaiting a selection.
    Displaying,
    /// A selection is being resolved.
    Committing,
}

/// Everything the UI renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchState {
    pub query_text: String,
    pub is_loading: bool,
    pub buckets: Vec<ResultBucket>,
    pub pending_selection: Option<RawMatch>,
    pub type_filter: TypeFilter,
}

/// Work the driver must carry out after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// (Re)start the debounce timer; the tick must carry `seq`.
    ScheduleDebounce { seq: u64 },
    /// Cancel any running debounce timer.
    CancelDebounce,
    /// Query the backend; the reply must carry `seq`.
    Search { seq: u64, query: String },
    /// After the clear delay, report back with a clear tick.
    ScheduleClear { field: FieldId, search_type: TypeFilter },
    /// Resolve `selection`; the result must carry `commit`.
    Resolve {
        commit: u64,
        field: FieldId,
        search_type: TypeFilter,
        selection: RawMatch,
    },
    /// Notify the store of the resolved feature.
    CommitActiveFeature(ActiveFeature),
    /// Notify the store that the field has no active feature.
    ClearActiveFeature { field: FieldId, search_type: TypeFilter },
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SearchMachine {
    field: FieldId,
    state: SearchState,
    phase: Phase,
    bucket_limit: usize,
    /// Hits of the last accepted reply, kept for type-filter recomputation.
    last_matches: Vec<RawMatch>,
    query_seq: u64,
    debounce_armed: bool,
    awaiting_search: Option<u64>,
    commit_seq: u64,
    resolving: Option<u64>,
    pending_clears: usize,
}

impl SearchMachine {
    pub fn new(field: FieldId, search_type: TypeFilter, value: impl Into<String>) -> Self {
        Self {
            field,
            state: SearchState {
                query_text: value.into(),
                type_filter: search_type,
                ..SearchState::default()
            },
            phase: Phase::Idle,
            bucket_limit: BUCKET_LIMIT,
            last_matches: Vec::new(),
            query_seq: 0,
            debounce_armed: false,
            awaiting_search: None,
            commit_seq: 0,
            resolving: None,
            pending_clears: 0,
        }
    }

    pub fn with_bucket_limit(mut self, limit: usize) -> Self {
        self.bucket_limit = limit;
        self
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn field(&self) -> FieldId {
        self.field
    }

    /// Seq of the most recent keystroke cycle.
    pub fn current_seq(&self) -> u64 {
        self.query_seq
    }

    /// True while any timer, query, resolution or clear is outstanding.
    pub fn is_busy(&self) -> bool {
        self.debounce_armed
            || self.awaiting_search.is_some()
            || self.resolving.is_some()
            || self.pending_clears > 0
    }

    // -- external events ----------------------------------------------------

    /// Record the new text as authoritative and restart the debounce timer.
    pub fn text_changed(&mut self, text: String) -> Vec<Effect> {
        self.query_seq += 1;
        self.state.query_text = text;
        self.state.is_loading = true;
        self.debounce_armed = true;
        self.phase = Phase::Loading;
        tracing::debug!(seq = self.query_seq, query = %self.state.query_text, "machine: text changed");
        vec![Effect::ScheduleDebounce { seq: self.query_seq }]
    }

    /// Change the type filter and recompute buckets from the last reply.
    pub fn type_changed(&mut self, filter: TypeFilter, clusterings: &[Clustering]) -> Vec<Effect> {
        self.state.type_filter = filter;
        self.state.buckets =
            aggregate_with_limit(&self.last_matches, clusterings, filter, self.bucket_limit);
        tracing::debug!(%filter, buckets = self.state.buckets.len(), "machine: type changed");
        Vec::new()
    }

    pub fn highlight(&mut self, selection: RawMatch) -> Vec<Effect> {
        self.state.pending_selection = Some(selection);
        Vec::new()
    }

    pub fn pick(&mut self, selection: RawMatch) -> Vec<Effect> {
        self.begin_commit(selection)
    }

    /// Commit the highlighted result, if there is one.
    pub fn blur(&mut self) -> Vec<Effect> {
        match self.state.pending_selection.take() {
            Some(selection) => self.begin_commit(selection),
            None => Vec::new(),
        }
    }

    /// Hard reset to `Idle` for a new binding. Work already in flight can no
    /// longer affect this machine.
    pub fn rebind(&mut self, field: FieldId, search_type: TypeFilter, value: String) -> Vec<Effect> {
        tracing::debug!(from = self.field, to = field, "machine: rebind");
        self.field = field;
        self.state = SearchState {
            query_text: value,
            type_filter: search_type,
            ..SearchState::default()
        };
        self.phase = Phase::Idle;
        self.last_matches.clear();
        self.query_seq += 1;
        self.commit_seq += 1;
        self.debounce_armed = false;
        self.awaiting_search = None;
        self.resolving = None;
        vec![Effect::CancelDebounce]
    }

    // -- completions --------------------------------------------------------

    /// The debounce timer for `seq` fired.
    pub fn debounce_elapsed(&mut self, seq: u64) -> Vec<Effect> {
        if seq != self.query_seq {
            tracing::debug!(seq, current = self.query_seq, "machine: stale debounce tick dropped");
            return Vec::new();
        }
        self.debounce_armed = false;

        if self.state.query_text.is_empty() {
            tracing::debug!(seq, "machine: empty query, resetting");
            self.state.is_loading = false;
            self.state.buckets.clear();
            self.state.pending_selection = None;
            self.last_matches.clear();
            self.phase = Phase::Idle;
            self.pending_clears += 1;
            return vec![Effect::ScheduleClear {
                field: self.field,
                search_type: self.state.type_filter,
            }];
        }

        self.awaiting_search = Some(seq);
        vec![Effect::Search {
            seq,
            query: self.state.query_text.clone(),
        }]
    }

    /// The backend answered the query issued for `seq`.
    pub fn search_completed(
        &mut self,
        seq: u64,
        matches: Vec<RawMatch>,
        clusterings: &[Clustering],
    ) -> Vec<Effect> {
        if self.awaiting_search == Some(seq) {
            self.awaiting_search = None;
        }
        if seq != self.query_seq {
            tracing::debug!(seq, current = self.query_seq, "machine: stale reply dropped");
            return Vec::new();
        }

        self.last_matches = matches;
        self.state.buckets = aggregate_with_limit(
            &self.last_matches,
            clusterings,
            self.state.type_filter,
            self.bucket_limit,
        );
        self.state.is_loading = false;
        if self.phase == Phase::Loading {
            self.phase = Phase::Displaying;
        }
        tracing::debug!(
            seq,
            hits = self.last_matches.len(),
            buckets = self.state.buckets.len(),
            "machine: reply applied"
        );
        Vec::new()
    }

    /// The resolution started for `commit` finished.
    pub fn resolved(&mut self, commit: u64, feature: ActiveFeature) -> Vec<Effect> {
        if self.resolving != Some(commit) {
            tracing::debug!(commit, current = self.commit_seq, "machine: superseded resolution dropped");
            return Vec::new();
        }
        self.resolving = None;
        if self.phase == Phase::Committing {
            self.phase = Phase::Idle;
        }
        vec![Effect::CommitActiveFeature(feature)]
    }

    /// The clear delay scheduled by an empty-query reset elapsed.
    pub fn clear_due(&mut self, field: FieldId, search_type: TypeFilter) -> Vec<Effect> {
        self.pending_clears = self.pending_clears.saturating_sub(1);
        vec![Effect::ClearActiveFeature { field, search_type }]
    }

    // -- helpers ------------------------------------------------------------

    fn begin_commit(&mut self, selection: RawMatch) -> Vec<Effect> {
        self.commit_seq += 1;
        self.state.query_text = selection.title.clone();
        self.state.pending_selection = None;
        self.phase = Phase::Committing;
        self.resolving = Some(self.commit_seq);
        tracing::debug!(
            commit = self.commit_seq,
            title = %selection.title,
            feature_type = %selection.feature_type,
            "machine: committing selection"
        );
        vec![Effect::Resolve {
            commit: self.commit_seq,
            field: self.field,
            search_type: self.state.type_filter,
            selection,
        }]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
