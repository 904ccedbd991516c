//! Result aggregator: groups classified hits into named buckets.
//!
//! # Emission order
//!
//! 1. `"gene"` bucket, if non-empty and the filter admits genes.
//! 2. `"regulon"` bucket, if non-empty and the filter admits regulons.
//! 3. One bucket per distinct `Clustering:`/`cluster#` type, in order of first
//!    appearance in the backend reply, if the filter admits clusters.
//!
//! Every bucket is truncated to the first `limit` hits in reply order and
//! empty buckets are never emitted.

use crate::classify::{classify, GENE, REGULON};
use crate::types::{Category, Clustering, RawMatch, ResultBucket, TypeFilter};
use std::collections::HashMap;

/// Maximum number of hits kept per bucket.
pub const BUCKET_LIMIT: usize = 10;

/// Aggregate with the default per-bucket limit of [`BUCKET_LIMIT`].
pub fn aggregate(
    matches: &[RawMatch],
    clusterings: &[Clustering],
    filter: TypeFilter,
) -> Vec<ResultBucket> {
    aggregate_with_limit(matches, clusterings, filter, BUCKET_LIMIT)
}

/// Partition `matches` by category and emit the buckets admitted by `filter`.
pub fn aggregate_with_limit(
    matches: &[RawMatch],
    clusterings: &[Clustering],
    filter: TypeFilter,
    limit: usize,
) -> Vec<ResultBucket> {
    let mut genes = ResultBucket::new(GENE);
    let mut regulons = ResultBucket::new(REGULON);
    let mut groups: Vec<ResultBucket> = Vec::new();
    let mut group_index: HashMap<&str, usize> = HashMap::new();
    let mut dropped = 0usize;

    for m in matches {
        let bucket = match classify(&m.feature_type, clusterings) {
            Category::Gene => &mut genes,
            Category::Regulon => &mut regulons,
            Category::Clustering { .. } => group_bucket(&mut groups, &mut group_index, m, None),
            Category::Cluster { name, .. } => {
                group_bucket(&mut groups, &mut group_index, m, Some(name))
            }
            Category::Unclassified { .. } => {
                dropped += 1;
                continue;
            }
        };
        if bucket.results.len() < limit {
            bucket.results.push(m.clone());
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, "aggregate: unclassified feature types dropped");
    }

    let mut out = Vec::with_capacity(groups.len() + 2);
    if filter.admits_genes() && !genes.results.is_empty() {
        out.push(genes);
    }
    if filter.admits_regulons() && !regulons.results.is_empty() {
        out.push(regulons);
    }
    if filter.admits_clusters() {
        out.extend(groups.into_iter().filter(|b| !b.results.is_empty()));
    }
    out
}

/// Find or create the bucket for a clustering-type hit, keyed by its raw type.
fn group_bucket<'a, 'm>(
    groups: &'a mut Vec<ResultBucket>,
    index: &mut HashMap<&'m str, usize>,
    m: &'m RawMatch,
    label: Option<String>,
) -> &'a mut ResultBucket {
    let i = *index.entry(m.feature_type.as_str()).or_insert_with(|| {
        let mut bucket = ResultBucket::new(m.feature_type.as_str());
        bucket.label = label;
        groups.push(bucket);
        groups.len() - 1
    });
    &mut groups[i]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
