//! Property tests for the merge engine, ancestor resolution and snapshots.

use draftwright::{
    export_snapshot, find_common_ancestor, import_snapshot, merge_three_way, AppState,
    CommitOutcome, MergeInput, MergeResolution, MergeResult, Revision, RevisionId,
    RevisionInput, RevisionStore,
};
use proptest::prelude::*;
use std::collections::HashMap;

fn merge(base: &str, target: &str, source: &str, resolution: MergeResolution) -> MergeResult {
    merge_three_way(&MergeInput {
        base,
        target,
        source,
        target_label: "main",
        source_label: "feature",
        resolution,
    })
}

/// Text of short non-empty lines, without a trailing newline.
fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-c]{1,2}", 0..8).prop_map(|lines| lines.join("\n"))
}

fn resolution_strategy() -> impl Strategy<Value = MergeResolution> {
    prop_oneof![
        Just(MergeResolution::Manual),
        Just(MergeResolution::PreferTarget),
        Just(MergeResolution::PreferSource),
    ]
}

/// A tree of revisions; entry `i` picks its parent among the first `i`.
fn tree_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(any::<prop::sample::Index>(), 1..40).prop_map(|picks| {
        picks
            .iter()
            .enumerate()
            .map(|(i, pick)| pick.index(i + 1))
            .collect()
    })
}

fn build_tree(parents: &[usize]) -> (RevisionStore, Vec<RevisionId>) {
    let mut store = RevisionStore::new();
    let root: RevisionId = "root".into();
    store
        .insert(Revision::new(root.clone(), RevisionInput::new(None, "root")))
        .unwrap();

    let mut ids = vec![root];
    for (i, &parent) in parents.iter().enumerate() {
        let id = store
            .append(RevisionInput::new(Some(ids[parent].clone()), format!("n{}", i)))
            .unwrap()
            .id()
            .clone();
        ids.push(id);
    }
    (store, ids)
}

#[derive(Clone, Debug)]
enum Op {
    Edit(String),
    Select(prop::sample::Index),
    Commit,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z]{0,6}".prop_map(Op::Edit),
        any::<prop::sample::Index>().prop_map(Op::Select),
        Just(Op::Commit),
    ]
}

fn selected(state: &AppState) -> RevisionId {
    state.current_session().unwrap().selected_revision_id().clone()
}

fn content_of(state: &AppState, id: &RevisionId) -> String {
    state.current_document().unwrap().revision(id).unwrap().content().to_string()
}

fn ancestors(store: &RevisionStore, id: &RevisionId) -> Vec<RevisionId> {
    store.history(id).iter().map(|r| r.id().clone()).collect()
}

proptest! {
    #[test]
    fn self_merge_is_identity(text in "[a-c\n]{0,24}", resolution in resolution_strategy()) {
        let result = merge(&text, &text, &text, resolution);
        prop_assert_eq!(&result.content, &text);
        prop_assert!(!result.has_conflicts());
    }

    #[test]
    fn unchanged_target_takes_source(
        base in text_strategy(),
        source in text_strategy(),
        resolution in resolution_strategy()
    ) {
        let result = merge(&base, &base, &source, resolution);
        prop_assert_eq!(&result.content, &source);
        prop_assert!(!result.has_conflicts());
    }

    #[test]
    fn unchanged_source_takes_target(
        base in text_strategy(),
        target in text_strategy(),
        resolution in resolution_strategy()
    ) {
        let result = merge(&base, &target, &base, resolution);
        prop_assert_eq!(result.content, target);
    }

    #[test]
    fn conflicts_do_not_depend_on_resolution(
        base in text_strategy(),
        target in text_strategy(),
        source in text_strategy()
    ) {
        let manual = merge(&base, &target, &source, MergeResolution::Manual);
        let ours = merge(&base, &target, &source, MergeResolution::PreferTarget);
        let theirs = merge(&base, &target, &source, MergeResolution::PreferSource);

        prop_assert_eq!(&manual.conflicts, &ours.conflicts);
        prop_assert_eq!(&manual.conflicts, &theirs.conflicts);
        if !manual.has_conflicts() {
            prop_assert_eq!(&manual.content, &ours.content);
            prop_assert_eq!(&manual.content, &theirs.content);
        }
    }

    #[test]
    fn prefer_policies_never_emit_markers(
        base in text_strategy(),
        target in text_strategy(),
        source in text_strategy()
    ) {
        for resolution in [MergeResolution::PreferTarget, MergeResolution::PreferSource] {
            let result = merge(&base, &target, &source, resolution);
            prop_assert!(!result.content.contains("<<<<<<<"));
        }
    }

    #[test]
    fn common_ancestor_is_nearest_shared(
        parents in tree_strategy(),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>()
    ) {
        let (store, ids) = build_tree(&parents);
        let a = &ids[a.index(ids.len())];
        let b = &ids[b.index(ids.len())];

        let found = find_common_ancestor(&store, a, b);
        let from_a = ancestors(&store, a);
        let from_b = ancestors(&store, b);
        let expected = from_b.iter().find(|id| from_a.contains(id)).cloned();

        prop_assert_eq!(&found, &expected);
        prop_assert_eq!(found, find_common_ancestor(&store, b, a));
    }

    #[test]
    fn ancestor_of_descendant_is_itself(
        parents in tree_strategy(),
        pick in any::<prop::sample::Index>()
    ) {
        let (store, ids) = build_tree(&parents);
        let node = &ids[pick.index(ids.len())];
        for ancestor in ancestors(&store, node) {
            prop_assert_eq!(find_common_ancestor(&store, node, &ancestor), Some(ancestor.clone()));
        }
    }

    #[test]
    fn snapshot_round_trips_after_edits(
        edits in prop::collection::vec(("[a-z ]{0,12}", any::<bool>()), 0..12)
    ) {
        let mut state = AppState::new();
        for (text, commit) in edits {
            state.update_content(text).unwrap();
            if commit {
                state.commit("edit").unwrap();
            }
        }

        let back = import_snapshot(&export_snapshot(&state).unwrap()).unwrap();
        prop_assert_eq!(back, state);
    }

    #[test]
    fn working_copy_is_lossless(ops in prop::collection::vec(op_strategy(), 0..30)) {
        let mut state = AppState::new();
        let root = selected(&state);
        let mut known = vec![(root.clone(), content_of(&state, &root))];
        let mut unsaved: HashMap<RevisionId, String> = HashMap::new();

        for op in ops {
            match op {
                Op::Edit(text) => {
                    state.update_content(text.clone()).unwrap();
                    unsaved.insert(selected(&state), text);
                }
                Op::Select(pick) => {
                    let id = known[pick.index(known.len())].0.clone();
                    state.select_revision(&id).unwrap();
                    let want = unsaved
                        .get(&id)
                        .cloned()
                        .unwrap_or_else(|| content_of(&state, &id));
                    let working = state.current_session().unwrap().working_content();
                    prop_assert_eq!(working, want.as_str());
                }
                Op::Commit => {
                    let parent = selected(&state);
                    if let CommitOutcome::Committed(id) = state.commit("edit").unwrap() {
                        unsaved.remove(&parent);
                        let content = content_of(&state, &id);
                        known.push((id, content));
                    }
                }
            }
        }

        for (id, content) in &known {
            prop_assert_eq!(&content_of(&state, id), content);
        }
    }
}
