//! Selection resolver.
//!
//! Turns a chosen search hit into an [`ActiveFeature`]. Regulons look up
//! their default threshold, clustering hits look up marker genes, and every
//! other category commits after a short fixed delay. A missing lookup reply
//! degrades to threshold `0` and metadata holding only the description.

use featsearch_backend::{FeatureBackend, MarkerQuery, RegulonQuery};
use featsearch_core::classify::{classify, resolve_cluster_ids};
use featsearch_core::{ActiveFeature, Category, Clustering, FieldId, Metadata, RawMatch, TypeFilter};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Everything needed to resolve one selection, captured when it was made.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub field: FieldId,
    pub search_type: TypeFilter,
    pub dataset: String,
    pub clusterings: Vec<Clustering>,
    pub selection: RawMatch,
}

pub struct SelectionResolver<B> {
    backend: Arc<B>,
    commit_delay: Duration,
}

impl<B> Clone for SelectionResolver<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            commit_delay: self.commit_delay,
        }
    }
}

impl<B: FeatureBackend> SelectionResolver<B> {
    pub fn new(backend: Arc<B>, commit_delay: Duration) -> Self {
        Self { backend, commit_delay }
    }

    pub async fn resolve(&self, r: Resolution) -> ActiveFeature {
        let category = classify(&r.selection.feature_type, &r.clusterings);
        let name = r.selection.title.clone();

        let (threshold, mut metadata) = match &category {
            Category::Regulon => {
                let query = RegulonQuery {
                    loom_file_path: r.dataset.clone(),
                    regulon: name.clone(),
                };
                match self.backend.regulon_metadata(query).await {
                    Some(meta) => (meta.default_threshold_value(), meta.into_metadata()),
                    None => {
                        tracing::debug!(regulon = %name, "resolver: no regulon metadata");
                        (0.0, Metadata::new())
                    }
                }
            }
            Category::Clustering { .. } => {
                let ids = resolve_cluster_ids(&r.selection.feature_type, &name, &r.clusterings);
                let markers = match ids {
                    Some((clustering_id, cluster_id)) => {
                        let query = MarkerQuery {
                            loom_file_path: r.dataset.clone(),
                            cluster_id,
                            clustering_id,
                        };
                        let reply = self.backend.marker_genes(query).await;
                        if reply.is_none() {
                            tracing::debug!(
                                clustering_id,
                                cluster_id,
                                "resolver: no marker genes"
                            );
                        }
                        reply
                    }
                    None => {
                        tracing::debug!(
                            feature_type = %r.selection.feature_type,
                            title = %name,
                            "resolver: cluster ids unresolved, skipping marker lookup"
                        );
                        None
                    }
                };
                (0.0, markers.unwrap_or_default())
            }
            Category::Gene | Category::Cluster { .. } | Category::Unclassified { .. } => {
                tokio::time::sleep(self.commit_delay).await;
                (0.0, Metadata::new())
            }
        };

        metadata.insert(
            "description".into(),
            Value::String(r.selection.description.clone()),
        );
        tracing::debug!(%category, %name, threshold, "resolver: selection resolved");

        ActiveFeature {
            field: r.field,
            search_type: r.search_type,
            category,
            name,
            threshold,
            metadata: Some(metadata),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
