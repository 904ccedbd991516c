//! Test builders: ergonomic constructors for hits, datasets and sessions.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use featsearch_backend::{MemoryBackend, RecordingStore, StaticDataset};
use featsearch_core::{Cluster, Clustering, DatasetMetadata, FieldId, RawMatch, TypeFilter};
use featsearch_session::{Binding, SearchSession, SessionSettings};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Hits
// ---------------------------------------------------------------------------

pub fn gene(title: &str) -> RawMatch {
    RawMatch::new(title, "gene", "")
}

pub fn regulon(title: &str) -> RawMatch {
    RawMatch::new(title, "regulon", "")
}

/// A hit whose type is `Clustering: <clustering>`, titled by cluster description.
pub fn clustering_hit(clustering: &str, cluster_description: &str) -> RawMatch {
    RawMatch::new(cluster_description, format!("Clustering: {clustering}"), "")
}

// ---------------------------------------------------------------------------
// DatasetBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`DatasetMetadata`].
///
/// ```rust
/// let meta = DatasetBuilder::new()
///     .clustering(3, "Leiden", &[(0, "B cells"), (1, "T cells")])
///     .build();
/// ```
#[derive(Default)]
pub struct DatasetBuilder {
    clusterings: Vec<Clustering>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clustering(mut self, id: i64, name: &str, clusters: &[(i64, &str)]) -> Self {
        self.clusterings.push(Clustering {
            id,
            name: name.to_string(),
            clusters: clusters
                .iter()
                .map(|(id, description)| Cluster { id: *id, description: description.to_string() })
                .collect(),
        });
        self
    }

    pub fn build(self) -> DatasetMetadata {
        DatasetMetadata { clusterings: self.clusterings }
    }
}

// ---------------------------------------------------------------------------
// SessionRig
// ---------------------------------------------------------------------------

pub type MemorySession = SearchSession<MemoryBackend, StaticDataset, RecordingStore>;

/// A session wired to in-memory collaborators, with handles kept for
/// inspection.
pub struct SessionRig {
    pub session: MemorySession,
    pub backend: Arc<MemoryBackend>,
    pub dataset: Arc<StaticDataset>,
    pub store: Arc<RecordingStore>,
}

/// Fluent builder for [`SessionRig`]. Defaults: field 0, type `all`, empty
/// initial value, dataset `pbmc.loom` without clusterings, default timings.
pub struct SessionRigBuilder {
    backend: MemoryBackend,
    dataset: String,
    metadata: Option<DatasetMetadata>,
    binding: Binding,
    settings: SessionSettings,
}

impl SessionRigBuilder {
    pub fn new(backend: MemoryBackend) -> Self {
        Self {
            backend,
            dataset: "pbmc.loom".to_string(),
            metadata: None,
            binding: Binding::default(),
            settings: SessionSettings::default(),
        }
    }

    pub fn dataset(mut self, id: &str, metadata: DatasetMetadata) -> Self {
        self.dataset = id.to_string();
        self.metadata = Some(metadata);
        self
    }

    pub fn field(mut self, field: FieldId) -> Self {
        self.binding.field = field;
        self
    }

    pub fn search_type(mut self, search_type: TypeFilter) -> Self {
        self.binding.search_type = search_type;
        self
    }

    pub fn debounce(mut self, delay: Duration) -> Self {
        self.settings.debounce = delay;
        self
    }

    pub fn bucket_limit(mut self, limit: usize) -> Self {
        self.settings.bucket_limit = limit;
        self
    }

    pub fn build(self) -> SessionRig {
        let backend = Arc::new(self.backend);
        let dataset = Arc::new(StaticDataset::new(self.dataset, self.metadata));
        let store = Arc::new(RecordingStore::new());
        let session = SearchSession::new(
            self.binding,
            Arc::clone(&backend),
            Arc::clone(&dataset),
            Arc::clone(&store),
            self.settings,
        );
        SessionRig { session, backend, dataset, store }
    }
}
