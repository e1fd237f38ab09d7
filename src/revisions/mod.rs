//! Append-only revision storage.
//!
//! Revisions form a forest through parent links. A parent must already be
//! present when a child is inserted, so the links can never form a cycle.

mod ancestry;
mod store;

pub use ancestry::find_common_ancestor;
pub use store::RevisionStore;
