//! Union merge over recipe id lists.
//!
//! The merge policy is a set union: every id present in either snapshot is
//! present in the result exactly once. Union is commutative and idempotent,
//! so concurrent writers on different devices converge without locking.
//! These are pure functions with no storage dependency.

use std::collections::HashSet;

/// Merges a local and a remote id list into one canonical list.
///
/// Ids from `local` keep their relative order; ids only present in `remote`
/// follow in their own order. Duplicates are dropped.
pub fn merge_id_lists(local: &[String], remote: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(local.len() + remote.len());

    for id in local.iter().chain(remote.iter()) {
        if seen.insert(id.as_str()) {
            merged.push(id.clone());
        }
    }

    merged
}

/// Drops duplicate ids, keeping the first occurrence of each.
pub fn dedup_ids(ids: &[String]) -> Vec<String> {
    merge_id_lists(ids, &[])
}
