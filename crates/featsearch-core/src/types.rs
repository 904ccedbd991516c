//! Core types for featsearch-core.
//!
//! This module defines the data structures shared across all layers: the
//! backend hit [`RawMatch`], its semantic [`Category`], the [`ResultBucket`]
//! groups shown to the user, the [`TypeFilter`] selector, the dataset's
//! clustering metadata, and the resolved [`ActiveFeature`] handed to the
//! application store.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Index of the feature slot a search widget is bound to.
pub type FieldId = usize;

/// Metadata object attached to a resolved feature.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Backend hits
// ---------------------------------------------------------------------------

/// One backend hit, zipped from the parallel arrays of a search reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMatch {
    /// Feature name (gene symbol, regulon name, cluster description, …).
    pub title: String,
    /// Raw feature type string as sent by the backend.
    #[serde(rename = "type")]
    pub feature_type: String,
    pub description: String,
}

impl RawMatch {
    pub fn new(
        title: impl Into<String>,
        feature_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            feature_type: feature_type.into(),
            description: description.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Semantic category of a feature, derived from its raw type string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Category {
    Gene,
    Regulon,
    /// `"Clustering:<name>"`: keyed by the full type string.
    Clustering { key: String },
    /// `"cluster#<id>"`: keyed by the id suffix. `name` is the clustering's
    /// display name, empty when the dataset has no clustering with that id.
    Cluster { id: String, name: String },
    /// Any other type string. Never bucketed, but still selectable.
    Unclassified { feature_type: String },
}

impl Category {
    /// The raw feature type string this category was derived from.
    pub fn feature_type(&self) -> Cow<'_, str> {
        match self {
            Category::Gene => Cow::Borrowed("gene"),
            Category::Regulon => Cow::Borrowed("regulon"),
            Category::Clustering { key } => Cow::Borrowed(key),
            Category::Cluster { id, .. } => Cow::Owned(format!("cluster#{id}")),
            Category::Unclassified { feature_type } => Cow::Borrowed(feature_type),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.feature_type())
    }
}

// ---------------------------------------------------------------------------
// Type filter
// ---------------------------------------------------------------------------

/// Which categories the user wants to see. Doubles as the search type passed
/// to the application store when a feature is committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Gene,
    Regulon,
    Cluster,
}

impl TypeFilter {
    pub fn admits_genes(self) -> bool {
        matches!(self, TypeFilter::All | TypeFilter::Gene)
    }

    pub fn admits_regulons(self) -> bool {
        matches!(self, TypeFilter::All | TypeFilter::Regulon)
    }

    pub fn admits_clusters(self) -> bool {
        matches!(self, TypeFilter::All | TypeFilter::Cluster)
    }
}

impl std::fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeFilter::All => write!(f, "all"),
            TypeFilter::Gene => write!(f, "gene"),
            TypeFilter::Regulon => write!(f, "regulon"),
            TypeFilter::Cluster => write!(f, "cluster"),
        }
    }
}

/// Returned when a type filter string is not one of `all|gene|regulon|cluster`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type filter `{0}` (expected all, gene, regulon or cluster)")]
pub struct ParseTypeFilterError(pub String);

impl std::str::FromStr for TypeFilter {
    type Err = ParseTypeFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TypeFilter::All),
            "gene" => Ok(TypeFilter::Gene),
            "regulon" => Ok(TypeFilter::Regulon),
            "cluster" => Ok(TypeFilter::Cluster),
            _ => Err(ParseTypeFilterError(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// A named group of hits shown together in the result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBucket {
    pub name: String,
    /// Human-readable clustering name for `cluster#<id>` buckets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub results: Vec<RawMatch>,
}

impl ResultBucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            results: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset metadata
// ---------------------------------------------------------------------------

/// Cell metadata of the active dataset, as far as search cares about it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(default)]
    pub clusterings: Vec<Clustering>,
}

/// A partition of the dataset's cells into clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clustering {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: i64,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Resolved output
// ---------------------------------------------------------------------------

/// A committed, fully resolved selection handed to the application store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveFeature {
    pub field: FieldId,
    pub search_type: TypeFilter,
    pub category: Category,
    pub name: String,
    pub threshold: f64,
    pub metadata: Option<Metadata>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
