//! Domain-specific assertion macros for featsearch harnesses.
//!
//! These wrap plain comparisons with failure messages that show the whole
//! bucket list, which is what you want to see when a grouping is off.

/// Assert the bucket names of a `SearchState` or `&[ResultBucket]`, in order.
///
/// ```rust
/// assert_bucket_names!(session.state().buckets, ["gene", "regulon"]);
/// ```
#[macro_export]
macro_rules! assert_bucket_names {
    ($buckets:expr, [$($name:expr),* $(,)?]) => {{
        let buckets: &[featsearch_core::ResultBucket] = &$buckets;
        let actual: Vec<&str> = buckets.iter().map(|b| b.name.as_str()).collect();
        let expected: Vec<&str> = vec![$($name),*];
        if actual != expected {
            panic!(
                "assert_bucket_names! failed:\n  expected: {:?}\n  actual:   {:?}\n  buckets:  {:#?}",
                expected, actual, buckets
            );
        }
    }};
}

/// Assert the hit titles inside the bucket called `$name`.
///
/// ```rust
/// assert_bucket_titles!(session.state().buckets, "gene", ["CD3E", "CD3D"]);
/// ```
#[macro_export]
macro_rules! assert_bucket_titles {
    ($buckets:expr, $name:expr, [$($title:expr),* $(,)?]) => {{
        let buckets: &[featsearch_core::ResultBucket] = &$buckets;
        let name: &str = $name;
        let expected: Vec<&str> = vec![$($title),*];
        match buckets.iter().find(|b| b.name == name) {
            Some(bucket) => {
                let actual: Vec<&str> = bucket.results.iter().map(|m| m.title.as_str()).collect();
                if actual != expected {
                    panic!(
                        "assert_bucket_titles! failed for bucket {:?}:\n  expected: {:?}\n  actual:   {:?}",
                        name, expected, actual
                    );
                }
            }
            None => panic!(
                "assert_bucket_titles! failed: no bucket {:?}.\n  Available: {:?}",
                name,
                buckets.iter().map(|b| b.name.as_str()).collect::<Vec<_>>()
            ),
        }
    }};
}
