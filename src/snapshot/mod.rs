//! Versioned snapshots of the whole application state.
//!
//! Export always writes the current schema (v2). Import accepts v2 and the
//! legacy single-document v1 shape, upgrades it, and self-heals session
//! stashes against the documents they belong to.

mod file;
mod schema;

pub use file::{SnapshotConfig, SnapshotFile};
pub use schema::{
    export_snapshot, import_snapshot, PersistedSnapshot, SnapshotV1, SnapshotV2, SNAPSHOT_VERSION,
};
