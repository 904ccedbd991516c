//! featsearch-session: the live half of the search pipeline.
//!
//! A [`SearchSession`] is bound to one slot of the application (a
//! [`FieldId`](featsearch_core::FieldId) plus a search type). It debounces
//! keystrokes, queries the backend, keeps only the reply for the latest
//! keystroke, and resolves the picked result into the active feature the
//! store receives.
//!
//! ```text
//! SearchEvent ──► SearchSession ──► SearchMachine (pure transitions)
//!                      ▲    │
//!           Completion │    │ Effect
//!                      │    ▼
//!          Debouncer / FeatureBackend / SelectionResolver / FeatureStore
//! ```

pub mod debounce;
pub mod event;
pub mod machine;
pub mod resolver;
pub mod session;

pub use debounce::Debouncer;
pub use event::SearchEvent;
pub use machine::{Effect, Phase, SearchMachine, SearchState};
pub use resolver::{Resolution, SelectionResolver};
pub use session::{Binding, SearchSession, SessionHandle, SessionSettings};
