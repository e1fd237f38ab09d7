//! Working copy and per-revision stash.
//!
//! Each open document has one session. The working copy starts equal to the
//! selected revision's content; unsaved text is stashed per revision so that
//! navigating away and back restores exactly what was being edited.

mod working_copy;

pub use working_copy::{CommitOutcome, Session};
