//! featsearch-core: categorized feature search core library.
//!
//! This crate holds the pure half of the search pipeline plus the shared types
//! used by every other layer.
//!
//! # Architecture
//!
//! ```text
//! keystroke ──► Debouncer ──► Backend ──► Classifier ──► Aggregator ──► state
//!                                                                        │
//!                               Store ◄── Resolver ◄── commit ◄──────────┘
//! ```
//!
//! The classifier and aggregator live here. Dataset metadata is always passed
//! in explicitly; nothing in this crate holds global state.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod types;

pub use aggregate::{aggregate, aggregate_with_limit, BUCKET_LIMIT};
pub use classify::classify;
pub use types::{
    ActiveFeature, Category, Cluster, Clustering, DatasetMetadata, FieldId, Metadata, RawMatch,
    ResultBucket, TypeFilter,
};
