//! Category classifier: maps a raw backend feature type onto a [`Category`].
//!
//! Rules are checked in order: exact `"gene"`, exact `"regulon"`, prefix
//! `"Clustering:"`, prefix `"cluster#"`. Everything else is
//! [`Category::Unclassified`]. Classification never fails: a `cluster#<id>`
//! whose id has no clustering in the dataset gets an empty display name.

use crate::types::{Category, Clustering};

pub const GENE: &str = "gene";
pub const REGULON: &str = "regulon";
pub const CLUSTERING_PREFIX: &str = "Clustering:";
pub const CLUSTER_PREFIX: &str = "cluster#";

/// Classify a raw feature type against the active dataset's clusterings.
pub fn classify(feature_type: &str, clusterings: &[Clustering]) -> Category {
    if feature_type == GENE {
        Category::Gene
    } else if feature_type == REGULON {
        Category::Regulon
    } else if feature_type.starts_with(CLUSTERING_PREFIX) {
        Category::Clustering {
            key: feature_type.to_string(),
        }
    } else if feature_type.starts_with(CLUSTER_PREFIX) {
        let id = feature_type.split('#').nth(1).unwrap_or_default();
        Category::Cluster {
            id: id.to_string(),
            name: clustering_name(id, clusterings),
        }
    } else {
        Category::Unclassified {
            feature_type: feature_type.to_string(),
        }
    }
}

/// Display name of the clustering with the given id, or `""` when there is
/// none (or the id is not numeric).
pub fn clustering_name(id: &str, clusterings: &[Clustering]) -> String {
    let Ok(id) = id.trim().parse::<i64>() else {
        return String::new();
    };
    clusterings
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.clone())
        .unwrap_or_default()
}

/// Resolve `(clustering_id, cluster_id)` for a `"Clustering:"` selection.
///
/// The clustering is the last one whose name occurs in `feature_type`; the
/// cluster is the last one in it whose description equals `title`. Returns
/// `None` when either cannot be found.
pub fn resolve_cluster_ids(
    feature_type: &str,
    title: &str,
    clusterings: &[Clustering],
) -> Option<(i64, i64)> {
    let clustering = clusterings
        .iter()
        .rev()
        .find(|c| !c.name.is_empty() && feature_type.contains(c.name.as_str()))?;
    let cluster = clustering
        .clusters
        .iter()
        .rev()
        .find(|c| c.description == title)?;
    Some((clustering.id, cluster.id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
