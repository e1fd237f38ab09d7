//! # Draftwright
//!
//! The version-control core of a local-first writing tool: immutable
//! revision trees per document, named branch pointers, a working copy that
//! stashes unsaved text per revision, and a line-based three-way merge.
//!
//! ## Core Concepts
//!
//! - **Revisions**: Immutable snapshots of a document, linked to a parent
//! - **Branches**: Named pointers to a head revision
//! - **Sessions**: The editable working copy plus its per-revision stash
//! - **Merges**: Previewed against captured heads, then applied
//! - **Snapshots**: Versioned JSON of the whole application state
//!
//! ## Example
//!
//! ```ignore
//! use draftwright::{reduce, AppState, Command, MergeResolution, Outcome};
//!
//! let state = AppState::new();
//! let t = reduce(&state, Command::UpdateContent("# Draft\n\nHello".into()))?;
//! let t = reduce(&t.state, Command::Commit { rationale: "first pass".into() })?;
//!
//! // Branch from the current head and preview merging it back
//! let head = t.state.current_document()?.head()?.id().clone();
//! let t = reduce(&t.state, Command::CreateBranch { name: "alt".into(), from: head })?;
//! ```

pub mod branches;
pub mod document;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod revisions;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod types;
pub mod workspace;

// Re-exports
pub use branches::{normalize_branch_name, BranchTable, MAIN_BRANCH};
pub use document::{DiffMode, Document, DocumentPreferences, MarkdownExport, ProjectBrief};
pub use error::{CoreError, Result};
pub use merge::{
    count_line_changes, merge_three_way, summarize_merge, MergeConflict, MergeInput,
    MergePreview, MergeResolution, MergeResult, MergeSummary,
};
pub use pipeline::{GeneratedText, StageGenerator};
pub use revisions::{find_common_ancestor, RevisionStore};
pub use session::{CommitOutcome, Session};
pub use settings::{LlmProvider, LlmSettings, Settings, UiSettings};
pub use snapshot::{
    export_snapshot, import_snapshot, PersistedSnapshot, SnapshotConfig, SnapshotFile,
    SnapshotV1, SnapshotV2, SNAPSHOT_VERSION,
};
pub use types::*;
pub use workspace::{reduce, AppState, Command, Outcome, Transition};
