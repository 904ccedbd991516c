//! In-process collaborators.
//!
//! [`MemoryBackend`] answers searches by case-insensitive substring match on
//! feature names and serves lookups from fixed tables. Per-query delays make
//! it possible to reorder replies in tests. [`StaticDataset`] and
//! [`RecordingStore`] stand in for the dataset loader and application store.

use crate::protocol::{FeatureQuery, FeatureReply, MarkerQuery, RegulonMetadata, RegulonQuery};
use crate::{DatasetContext, FeatureBackend, FeatureStore};
use featsearch_core::{ActiveFeature, DatasetMetadata, FieldId, Metadata, RawMatch, TypeFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Fixture file
// ---------------------------------------------------------------------------

/// JSON description of a dataset and the backend answers for it.
///
/// ```json
/// {
///   "dataset": "pbmc.loom",
///   "metadata": { "clusterings": [{ "id": 0, "name": "Leiden", "clusters": [] }] },
///   "features": [{ "title": "ACTB", "type": "gene", "description": "actin" }],
///   "regulons": { "TF1": { "autoThresholds": [], "defaultThreshold": "" } },
///   "markers": [{ "clustering_id": 0, "cluster_id": 1, "genes": ["CD3E"] }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub dataset: String,
    #[serde(default)]
    pub metadata: DatasetMetadata,
    #[serde(default)]
    pub features: Vec<RawMatch>,
    #[serde(default)]
    pub regulons: HashMap<String, RegulonMetadata>,
    #[serde(default)]
    pub markers: Vec<MarkerFixture>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerFixture {
    pub clustering_id: i64,
    pub cluster_id: i64,
    #[serde(default)]
    pub genes: Vec<String>,
}

impl Fixture {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// A call observed by [`MemoryBackend`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Search(FeatureQuery),
    Regulon(RegulonQuery),
    Markers(MarkerQuery),
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    features: Vec<RawMatch>,
    regulons: HashMap<String, RegulonMetadata>,
    markers: HashMap<(i64, i64), Metadata>,
    search_delays: HashMap<String, Duration>,
    lookup_delay: Duration,
    unavailable: bool,
    calls: Mutex<Vec<BackendCall>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: &Fixture) -> Self {
        let mut backend = Self::new().with_features(fixture.features.iter().cloned());
        for (name, meta) in &fixture.regulons {
            backend = backend.with_regulon(name.clone(), meta.clone());
        }
        for m in &fixture.markers {
            let mut genes = Metadata::new();
            genes.insert("genes".into(), serde_json::json!(m.genes));
            backend = backend.with_markers(m.clustering_id, m.cluster_id, genes);
        }
        backend
    }

    pub fn with_features(mut self, features: impl IntoIterator<Item = RawMatch>) -> Self {
        self.features.extend(features);
        self
    }

    pub fn with_regulon(mut self, name: impl Into<String>, meta: RegulonMetadata) -> Self {
        self.regulons.insert(name.into(), meta);
        self
    }

    pub fn with_markers(mut self, clustering_id: i64, cluster_id: i64, genes: Metadata) -> Self {
        self.markers.insert((clustering_id, cluster_id), genes);
        self
    }

    /// Delay the reply to one exact query text.
    pub fn with_search_delay(mut self, query: impl Into<String>, delay: Duration) -> Self {
        self.search_delays.insert(query.into(), delay);
        self
    }

    /// Delay every regulon and marker lookup.
    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = delay;
        self
    }

    /// Answer every call with "no reply".
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.calls).clone()
    }

    /// Query texts of every search received so far.
    pub fn search_queries(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                BackendCall::Search(q) => Some(q.query.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: BackendCall) {
        lock(&self.calls).push(call);
    }
}

impl FeatureBackend for MemoryBackend {
    async fn search(&self, query: FeatureQuery) -> Option<FeatureReply> {
        let delay = self.search_delays.get(&query.query).copied().unwrap_or_default();
        let needle = query.query.to_lowercase();
        self.record(BackendCall::Search(query));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable {
            return None;
        }
        Some(
            self.features
                .iter()
                .filter(|f| f.title.to_lowercase().contains(&needle))
                .cloned()
                .collect(),
        )
    }

    async fn regulon_metadata(&self, query: RegulonQuery) -> Option<RegulonMetadata> {
        let found = self.regulons.get(&query.regulon).cloned();
        self.record(BackendCall::Regulon(query));
        if !self.lookup_delay.is_zero() {
            tokio::time::sleep(self.lookup_delay).await;
        }
        found.filter(|_| !self.unavailable)
    }

    async fn marker_genes(&self, query: MarkerQuery) -> Option<Metadata> {
        let found = self.markers.get(&(query.clustering_id, query.cluster_id)).cloned();
        self.record(BackendCall::Markers(query));
        if !self.lookup_delay.is_zero() {
            tokio::time::sleep(self.lookup_delay).await;
        }
        found.filter(|_| !self.unavailable)
    }
}

// ---------------------------------------------------------------------------
// StaticDataset
// ---------------------------------------------------------------------------

/// A dataset context whose active dataset can be switched at runtime.
#[derive(Debug, Default)]
pub struct StaticDataset {
    active: RwLock<(String, Option<DatasetMetadata>)>,
}

impl StaticDataset {
    pub fn new(id: impl Into<String>, metadata: Option<DatasetMetadata>) -> Self {
        Self {
            active: RwLock::new((id.into(), metadata)),
        }
    }

    pub fn from_fixture(fixture: &Fixture) -> Self {
        Self::new(fixture.dataset.clone(), Some(fixture.metadata.clone()))
    }

    /// Replace the active dataset, as a dataset loader would.
    pub fn switch(&self, id: impl Into<String>, metadata: Option<DatasetMetadata>) {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        *active = (id.into(), metadata);
    }
}

impl DatasetContext for StaticDataset {
    fn active_dataset(&self) -> String {
        self.active.read().unwrap_or_else(PoisonError::into_inner).0.clone()
    }

    fn active_metadata(&self) -> Option<DatasetMetadata> {
        self.active.read().unwrap_or_else(PoisonError::into_inner).1.clone()
    }
}

// ---------------------------------------------------------------------------
// RecordingStore
// ---------------------------------------------------------------------------

/// A notification received by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Commit(ActiveFeature),
    Clear { field: FieldId, search_type: TypeFilter },
}

/// Application store that records every notification in arrival order.
#[derive(Debug, Default)]
pub struct RecordingStore {
    events: Mutex<Vec<StoreEvent>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        lock(&self.events).clone()
    }

    pub fn commits(&self) -> Vec<ActiveFeature> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                StoreEvent::Commit(f) => Some(f.clone()),
                StoreEvent::Clear { .. } => None,
            })
            .collect()
    }

    pub fn last_commit(&self) -> Option<ActiveFeature> {
        self.commits().pop()
    }
}

impl FeatureStore for RecordingStore {
    fn commit_active_feature(&self, feature: ActiveFeature) {
        lock(&self.events).push(StoreEvent::Commit(feature));
    }

    fn clear_active_feature(&self, field: FieldId, search_type: TypeFilter) {
        lock(&self.events).push(StoreEvent::Clear { field, search_type });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::AutoThreshold;
    use pretty_assertions::assert_eq;

    fn query(text: &str) -> FeatureQuery {
        FeatureQuery { loom_file_path: "pbmc.loom".into(), query: text.into() }
    }

    #[tokio::test]
    async fn search_matches_substrings_case_insensitively() {
        let backend = MemoryBackend::new().with_features([
            RawMatch::new("ACTB", "gene", "actin beta"),
            RawMatch::new("GAPDH", "gene", ""),
            RawMatch::new("Actg1", "gene", ""),
        ]);
        let matches = backend.search(query("act")).await.unwrap().into_matches();
        let titles: Vec<_> = matches.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["ACTB", "Actg1"]);
        assert_eq!(backend.search_queries(), vec!["act"]);
    }

    #[tokio::test]
    async fn unavailable_backend_returns_none() {
        let backend = MemoryBackend::new()
            .with_regulon("TF1", RegulonMetadata::default())
            .unavailable();
        assert_eq!(backend.search(query("x")).await, None);
        let regulon = RegulonQuery { loom_file_path: "pbmc.loom".into(), regulon: "TF1".into() };
        assert_eq!(backend.regulon_metadata(regulon).await, None);
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn search_delay_applies_to_exact_query() {
        let backend = MemoryBackend::new().with_search_delay("slow", Duration::from_millis(300));
        let start = tokio::time::Instant::now();
        backend.search(query("fast")).await;
        assert!(start.elapsed() < Duration::from_millis(1));
        backend.search(query("slow")).await;
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn fixture_populates_lookups() {
        let fixture = Fixture::from_json(
            r#"{
                "dataset": "pbmc.loom",
                "metadata": {"clusterings": [{"id": 0, "name": "Leiden", "clusters": [{"id": 1, "description": "T cells"}]}]},
                "features": [{"title": "TF1", "type": "regulon", "description": "d"}],
                "regulons": {"TF1": {"autoThresholds": [{"name": "a", "threshold": 0.5}], "defaultThreshold": "a"}},
                "markers": [{"clustering_id": 0, "cluster_id": 1, "genes": ["CD3E"]}]
            }"#,
        )
        .unwrap();
        let backend = MemoryBackend::from_fixture(&fixture);

        let meta = backend
            .regulon_metadata(RegulonQuery { loom_file_path: "pbmc.loom".into(), regulon: "TF1".into() })
            .await
            .unwrap();
        assert_eq!(meta.auto_thresholds, vec![AutoThreshold { name: "a".into(), threshold: 0.5 }]);

        let markers = backend
            .marker_genes(MarkerQuery { loom_file_path: "pbmc.loom".into(), cluster_id: 1, clustering_id: 0 })
            .await
            .unwrap();
        assert_eq!(markers["genes"], serde_json::json!(["CD3E"]));

        let dataset = StaticDataset::from_fixture(&fixture);
        assert_eq!(dataset.active_dataset(), "pbmc.loom");
        assert_eq!(dataset.active_metadata().unwrap().clusterings.len(), 1);
    }

    #[test]
    fn dataset_switch_replaces_metadata() {
        let dataset = StaticDataset::new("a.loom", Some(DatasetMetadata::default()));
        dataset.switch("b.loom", None);
        assert_eq!(dataset.active_dataset(), "b.loom");
        assert_eq!(dataset.active_metadata(), None);
    }

    #[test]
    fn recording_store_keeps_arrival_order() {
        let store = RecordingStore::new();
        store.clear_active_feature(1, TypeFilter::Gene);
        let feature = ActiveFeature {
            field: 1,
            search_type: TypeFilter::Gene,
            category: featsearch_core::Category::Gene,
            name: "ACTB".into(),
            threshold: 0.0,
            metadata: None,
        };
        store.commit_active_feature(feature.clone());
        assert_eq!(
            store.events(),
            vec![
                StoreEvent::Clear { field: 1, search_type: TypeFilter::Gene },
                StoreEvent::Commit(feature.clone()),
            ]
        );
        assert_eq!(store.last_commit(), Some(feature));
    }
}
