//! Request and reply shapes exchanged with the feature backend.
//!
//! Field names follow the backend's JSON spelling (`loomFilePath`,
//! `featureType`, `clusterID`, …). Every reply type tolerates missing fields.

use featsearch_core::{DatasetMetadata, Metadata, RawMatch};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Feature search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureQuery {
    pub loom_file_path: String,
    pub query: String,
}

/// Parallel-array search reply. The arrays are zipped by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureReply {
    #[serde(default, alias = "features")]
    pub feature: Vec<String>,
    #[serde(default, rename = "featureType", alias = "featureTypes")]
    pub feature_type: Vec<String>,
    #[serde(default, rename = "featureDescription", alias = "featureDescriptions")]
    pub feature_description: Vec<String>,
}

impl FeatureReply {
    /// Zip the parallel arrays into hits, in reply order.
    ///
    /// Names and types must line up; a shorter list truncates the result. A
    /// missing description is treated as empty.
    pub fn into_matches(self) -> Vec<RawMatch> {
        if self.feature.len() != self.feature_type.len() {
            tracing::warn!(
                features = self.feature.len(),
                feature_types = self.feature_type.len(),
                "feature reply arrays differ in length; truncating"
            );
        }
        let mut descriptions = self.feature_description.into_iter();
        self.feature
            .into_iter()
            .zip(self.feature_type)
            .map(|(title, feature_type)| RawMatch {
                title,
                feature_type,
                description: descriptions.next().unwrap_or_default(),
            })
            .collect()
    }
}

impl FromIterator<RawMatch> for FeatureReply {
    fn from_iter<I: IntoIterator<Item = RawMatch>>(iter: I) -> Self {
        let mut reply = FeatureReply::default();
        for m in iter {
            reply.feature.push(m.title);
            reply.feature_type.push(m.feature_type);
            reply.feature_description.push(m.description);
        }
        reply
    }
}

// ---------------------------------------------------------------------------
// Regulon metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulonQuery {
    pub loom_file_path: String,
    pub regulon: String,
}

/// A named automatically derived activity threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoThreshold {
    pub name: String,
    pub threshold: f64,
}

/// Regulon metadata reply. Fields other than the thresholds (target genes,
/// motif, …) are kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulonMetadata {
    #[serde(default)]
    pub auto_thresholds: Vec<AutoThreshold>,
    #[serde(default)]
    pub default_threshold: String,
    #[serde(flatten)]
    pub extra: Metadata,
}

impl RegulonMetadata {
    /// Value of the threshold named by `default_threshold`, or `0.0`.
    pub fn default_threshold_value(&self) -> f64 {
        self.auto_thresholds
            .iter()
            .rev()
            .find(|t| t.name == self.default_threshold)
            .map(|t| t.threshold)
            .unwrap_or(0.0)
    }

    /// Flatten into the metadata object attached to an active feature.
    pub fn into_metadata(self) -> Metadata {
        let mut map = self.extra;
        let thresholds = self
            .auto_thresholds
            .into_iter()
            .map(|t| serde_json::json!({ "name": t.name, "threshold": t.threshold }))
            .collect();
        map.insert("autoThresholds".into(), serde_json::Value::Array(thresholds));
        map.insert(
            "defaultThreshold".into(),
            serde_json::Value::String(self.default_threshold),
        );
        map
    }
}

/// Envelope used by the HTTP backend: `{"regulonMeta": {...}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegulonMetadataReply {
    #[serde(default, rename = "regulonMeta", alias = "regulon")]
    pub regulon_meta: Option<RegulonMetadata>,
}

// ---------------------------------------------------------------------------
// Marker genes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerQuery {
    #[serde(rename = "loomFilePath")]
    pub loom_file_path: String,
    #[serde(rename = "clusterID")]
    pub cluster_id: i64,
    #[serde(rename = "clusteringID")]
    pub clustering_id: i64,
}

// ---------------------------------------------------------------------------
// Dataset listing
// ---------------------------------------------------------------------------

/// One dataset known to the backend, with its cell metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    #[serde(rename = "loomFilePath")]
    pub loom_file_path: String,
    #[serde(default, rename = "cellMetaData")]
    pub cell_metadata: DatasetMetadata,
}

/// Reply listing every dataset: `{"myLooms": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetListReply {
    #[serde(default, rename = "myLooms")]
    pub datasets: Vec<DatasetEntry>,
}

impl DatasetListReply {
    /// Cell metadata of the dataset stored at `loom_file_path`.
    pub fn metadata_for(self, loom_file_path: &str) -> Option<DatasetMetadata> {
        self.datasets
            .into_iter()
            .find(|d| d.loom_file_path == loom_file_path)
            .map(|d| d.cell_metadata)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
