//! Semantic search events: what the surrounding UI tells the session.
//!
//! The UI maps its own widget callbacks onto this vocabulary so the session
//! never depends on any toolkit.
//!
//! | UI callback                         | Event            |
//! |-------------------------------------|------------------|
//! | text input changed                  | `TextChanged`    |
//! | type selector changed               | `TypeChanged`    |
//! | result hovered / keyboard-selected  | `Highlight`      |
//! | result clicked                      | `Pick`           |
//! | input lost focus                    | `Blur`           |
//! | widget re-bound to another slot     | `Rebind`         |

use featsearch_core::{FieldId, RawMatch, TypeFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// The query text now reads exactly this.
    TextChanged(String),
    /// The type filter changed. Buckets are recomputed without a new query.
    TypeChanged(TypeFilter),
    /// A result is highlighted but not yet committed.
    Highlight(RawMatch),
    /// A result was explicitly picked.
    Pick(RawMatch),
    /// The input lost focus; commits the highlighted result, if any.
    Blur,
    /// The caller re-bound the widget. Hard reset of all local state.
    Rebind {
        field: FieldId,
        search_type: TypeFilter,
        value: String,
    },
}

impl SearchEvent {
    pub fn text(text: impl Into<String>) -> Self {
        SearchEvent::TextChanged(text.into())
    }
}
