//! Nearest common ancestor resolution.

use super::RevisionStore;
use crate::types::RevisionId;
use std::collections::HashSet;

/// Find the nearest revision reachable from both `a` and `b` by parent links.
///
/// Every id on `a`'s chain is collected first; the first id on `b`'s chain
/// that was seen is the answer. Walks end at the root or at an id that is
/// not in the store, so a missing id yields `None` rather than an error.
pub fn find_common_ancestor(
    revisions: &RevisionStore,
    a: &RevisionId,
    b: &RevisionId,
) -> Option<RevisionId> {
    let mut seen: HashSet<&RevisionId> = HashSet::new();

    let mut current = Some(a);
    while let Some(id) = current {
        if !seen.insert(id) {
            break;
        }
        current = revisions.get(id).and_then(|r| r.parent_id());
    }

    let mut visited: HashSet<&RevisionId> = HashSet::new();
    let mut current = Some(b);
    while let Some(id) = current {
        if seen.contains(id) {
            return Some(id.clone());
        }
        if !visited.insert(id) {
            break;
        }
        current = revisions.get(id).and_then(|r| r.parent_id());
    }

    None
}
