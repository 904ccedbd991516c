//! featsearch: incremental, categorized feature search.
//!
//! Search-as-you-type over a dataset's features (genes, regulons, clusters
//! and clusterings), with results grouped into capped per-category buckets
//! and the picked result resolved into an "active feature" for the host
//! application. This crate re-exports the three layers so that integration
//! tests and benches can import them from one place.
//!
//! # Architecture
//!
//! ```text
//! featsearch-core     types, classifier, aggregator, config
//!        ▲
//! featsearch-backend  FeatureBackend / DatasetContext / FeatureStore
//!        ▲            (HTTP + in-memory implementations)
//! featsearch-session  debouncer, state machine, resolver, session driver
//!        ▲
//! featsearch (bin)    headless `query` command
//! ```

pub mod headless;

pub use featsearch_backend;
pub use featsearch_core;
pub use featsearch_session;
