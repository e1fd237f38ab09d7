//! Shared helpers for integration tests.
#![allow(dead_code)]

use draftwright::{AppState, BranchId, RevisionId};
use tracing::Level;

/// Route `tracing` output through the test harness so it only shows for
/// failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Replace the working copy and commit it.
pub fn commit_text(state: &mut AppState, text: &str, rationale: &str) -> RevisionId {
    state.update_content(text).unwrap();
    state.commit(rationale).unwrap();
    state.current_session().unwrap().selected_revision_id().clone()
}

pub fn current_branch(state: &AppState) -> BranchId {
    state.current_document().unwrap().current_branch_id().clone()
}

/// A document where `main` and `feature` both edited line 2 of a shared
/// base. Leaves `main` current.
pub fn diverged_state() -> (AppState, BranchId, BranchId) {
    let mut state = AppState::new();
    let main = current_branch(&state);

    let base = commit_text(&mut state, "alpha\nbeta\ngamma", "base");
    let feature = state.create_branch("feature", &base).unwrap();

    commit_text(&mut state, "alpha\nmain edit\ngamma", "main edit");

    state.switch_branch(&feature).unwrap();
    commit_text(&mut state, "alpha\nfeature edit\ngamma\ndelta", "feature edit");
    state.switch_branch(&main).unwrap();

    (state, main, feature)
}
