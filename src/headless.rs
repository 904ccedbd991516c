//! Headless mode: one search cycle from the command line.
//!
//! [`run_query`] drives a [`SearchSession`] exactly like a UI would: set the
//! type filter, type the query, wait for the debounced reply and optionally
//! pick one result and wait for it to resolve. The outcome is a [`Report`]
//! that can be printed as plain text or JSON.

use anyhow::{anyhow, Context};
use featsearch_backend::{DatasetContext, FeatureBackend, RecordingStore};
use featsearch_core::{ActiveFeature, FieldId, ResultBucket, TypeFilter};
use featsearch_session::{Binding, SearchEvent, SearchSession, SessionSettings};
use serde::Serialize;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// `<bucket>:<index>`, e.g. `gene:0` or `Clustering: Leiden:2`.
///
/// The index follows the last colon, so bucket names may contain colons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickSpec {
    pub bucket: String,
    pub index: usize,
}

impl FromStr for PickSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (bucket, index) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("expected <bucket>:<index>, got {s:?}"))?;
        let index = index
            .trim()
            .parse()
            .map_err(|_| format!("invalid result index {index:?}"))?;
        if bucket.is_empty() {
            return Err(format!("missing bucket name in {s:?}"));
        }
        Ok(Self { bucket: bucket.to_string(), index })
    }
}

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub field: FieldId,
    pub text: String,
    pub type_filter: TypeFilter,
    pub pick: Option<PickSpec>,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub query: String,
    pub type_filter: TypeFilter,
    pub buckets: Vec<ResultBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed: Option<ActiveFeature>,
}

impl Report {
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("serializing report")
    }

    /// One header line per bucket followed by its indented hits.
    pub fn to_plain(&self) -> anyhow::Result<String> {
        let mut out = String::new();
        if self.buckets.is_empty() {
            writeln!(out, "no results for {:?}", self.query)?;
        }
        for bucket in &self.buckets {
            match &bucket.label {
                Some(label) if !label.is_empty() => writeln!(out, "[{}] {}", bucket.name, label)?,
                _ => writeln!(out, "[{}]", bucket.name)?,
            }
            for (i, hit) in bucket.results.iter().enumerate() {
                if hit.description.is_empty() {
                    writeln!(out, "  {i:>2}  {}", hit.title)?;
                } else {
                    writeln!(out, "  {i:>2}  {}  {}", hit.title, hit.description)?;
                }
            }
        }
        if let Some(feature) = &self.committed {
            writeln!(out, "committed: {}", serde_json::to_string(feature)?)?;
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub async fn run_query<B, D>(
    backend: Arc<B>,
    dataset: Arc<D>,
    settings: SessionSettings,
    request: QueryRequest,
) -> anyhow::Result<Report>
where
    B: FeatureBackend,
    D: DatasetContext,
{
    let store = Arc::new(RecordingStore::new());
    let mut session = SearchSession::new(
        Binding::new(request.field, request.type_filter, ""),
        backend,
        dataset,
        Arc::clone(&store),
        settings,
    );

    session.handle(SearchEvent::TextChanged(request.text.clone()));
    session.settle().await;
    let buckets = session.state().buckets.clone();
    tracing::info!(query = %request.text, buckets = buckets.len(), "headless: search settled");

    if let Some(pick) = &request.pick {
        let selection = buckets
            .iter()
            .find(|b| b.name == pick.bucket)
            .ok_or_else(|| anyhow!("no bucket named {:?}", pick.bucket))?
            .results
            .get(pick.index)
            .cloned()
            .ok_or_else(|| anyhow!("bucket {:?} has no result {}", pick.bucket, pick.index))?;
        session.handle(SearchEvent::Pick(selection));
        session.settle().await;
    }

    Ok(Report {
        query: request.text,
        type_filter: request.type_filter,
        buckets,
        committed: store.last_commit(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
