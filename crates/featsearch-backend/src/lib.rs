//! featsearch-backend: collaborators of the search session.
//!
//! The session talks to three opaque services:
//!
//! - [`FeatureBackend`]: feature search and the per-category metadata lookups.
//! - [`DatasetContext`]: the active dataset id and its clustering metadata,
//!   owned by whatever loads datasets. Read fresh on every use.
//! - [`FeatureStore`]: the application store receiving the resolved feature.
//!
//! A lookup failure is never an error at this layer: every method reports
//! "no reply" as `None` and the session degrades accordingly.
//!
//! [`HttpBackend`] speaks JSON over HTTP; [`memory`] holds in-process
//! implementations used by tests, benches and the `--fixture` CLI mode.

use featsearch_core::{ActiveFeature, DatasetMetadata, FieldId, Metadata, TypeFilter};
use std::future::Future;

pub mod error;
pub mod http;
pub mod memory;
pub mod protocol;

pub use error::BackendError;
pub use http::HttpBackend;
pub use memory::{BackendCall, Fixture, MemoryBackend, RecordingStore, StaticDataset, StoreEvent};
pub use protocol::{
    AutoThreshold, DatasetEntry, DatasetListReply, FeatureQuery, FeatureReply, MarkerQuery,
    RegulonMetadata, RegulonQuery,
};

/// Query and metadata-lookup endpoints of the feature backend.
pub trait FeatureBackend: Send + Sync + 'static {
    /// Search the dataset's feature namespace. `None` means zero results.
    fn search(&self, query: FeatureQuery) -> impl Future<Output = Option<FeatureReply>> + Send;

    /// Thresholds and related metadata for one regulon.
    fn regulon_metadata(
        &self,
        query: RegulonQuery,
    ) -> impl Future<Output = Option<RegulonMetadata>> + Send;

    /// Marker genes of one cluster, as an opaque metadata object.
    fn marker_genes(&self, query: MarkerQuery) -> impl Future<Output = Option<Metadata>> + Send;
}

/// Read-only view of the dataset currently loaded by the application.
pub trait DatasetContext: Send + Sync + 'static {
    fn active_dataset(&self) -> String;

    /// Clustering metadata of the active dataset; `None` while not loaded.
    fn active_metadata(&self) -> Option<DatasetMetadata>;
}

/// Fire-and-forget notifications to the application store.
pub trait FeatureStore: Send + Sync + 'static {
    fn commit_active_feature(&self, feature: ActiveFeature);

    fn clear_active_feature(&self, field: FieldId, search_type: TypeFilter);
}
