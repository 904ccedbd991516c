//! Static dataset fixtures used across harnesses.
//!
//! `PBMC_FIXTURE` is a small but complete fixture in the format read by
//! `featsearch query --fixture`: genes, regulons, one clustering and its
//! cluster-level hits, plus the answers to regulon and marker lookups.

use featsearch_backend::Fixture;

pub const PBMC_DATASET: &str = "pbmc.loom";

pub const PBMC_FIXTURE: &str = r#"{
  "dataset": "pbmc.loom",
  "metadata": {
    "clusterings": [
      {
        "id": 3,
        "name": "Leiden",
        "clusters": [
          { "id": 0, "description": "B cells" },
          { "id": 1, "description": "T cells" },
          { "id": 2, "description": "NK cells" }
        ]
      }
    ]
  },
  "features": [
    { "title": "CD3E", "type": "gene", "description": "T-cell surface glycoprotein" },
    { "title": "CD3D", "type": "gene", "description": "" },
    { "title": "CD79A", "type": "gene", "description": "" },
    { "title": "CD3_TF(+)", "type": "regulon", "description": "motif CD3" },
    { "title": "T cells", "type": "Clustering: Leiden", "description": "" },
    { "title": "CD3 high", "type": "cluster#3", "description": "" },
    { "title": "CD3 annotation", "type": "annotation", "description": "" }
  ],
  "regulons": {
    "CD3_TF(+)": {
      "autoThresholds": [
        { "name": "min", "threshold": 0.02 },
        { "name": "default", "threshold": 7.0 }
      ],
      "defaultThreshold": "default",
      "genes": ["CD3E", "CD3D"]
    }
  },
  "markers": [
    { "clustering_id": 3, "cluster_id": 1, "genes": ["CD3E", "IL7R"] }
  ]
}"#;

pub fn pbmc_fixture() -> Fixture {
    Fixture::from_json(PBMC_FIXTURE).expect("PBMC_FIXTURE must parse")
}

/// `count` gene hits named `G0000`, `G0001`, … for volume tests.
pub fn many_genes(count: usize) -> Vec<featsearch_core::RawMatch> {
    (0..count)
        .map(|i| featsearch_core::RawMatch::new(format!("G{i:04}"), "gene", ""))
        .collect()
}
