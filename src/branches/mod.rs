//! Branch table: named, movable pointers into the revision store.
//!
//! Creating a branch never creates a revision; it aliases an existing one.
//! Heads only move forward through commits made while the branch is current.

mod table;

pub use table::{normalize_branch_name, BranchTable, MAIN_BRANCH};
