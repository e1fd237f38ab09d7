//! Revision store implementation.

use crate::error::{CoreError, Result};
use crate::types::{Revision, RevisionId, RevisionInput};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Arena of revisions keyed by id.
///
/// Traversal is by id lookup, never by reference, so a dangling parent id
/// simply ends a walk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionStore {
    revisions: BTreeMap<RevisionId, Revision>,
}

impl RevisionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a single root revision.
    pub(crate) fn from_root(root: Revision) -> Self {
        let mut revisions = BTreeMap::new();
        revisions.insert(root.id().clone(), root);
        Self { revisions }
    }

    /// Insert an already-materialized revision.
    ///
    /// Fails with `InvalidParent` if the parent is not in the store and with
    /// `InvalidRevision` if the id is already taken.
    pub fn insert(&mut self, revision: Revision) -> Result<&Revision> {
        if let Some(parent) = revision.parent_id() {
            if !self.revisions.contains_key(parent) {
                return Err(CoreError::InvalidParent(parent.clone()));
            }
        }
        if self.revisions.contains_key(revision.id()) {
            return Err(CoreError::InvalidRevision(revision.id().clone()));
        }

        let id = revision.id().clone();
        Ok(self.revisions.entry(id).or_insert(revision))
    }

    /// Assign an id to an input and insert it.
    pub fn append(&mut self, input: RevisionInput) -> Result<&Revision> {
        let parent = input.parent_id.as_ref().map(RevisionId::as_str).unwrap_or("");
        let id = RevisionId::generate(&[parent, &input.content]);
        self.insert(Revision::new(id, input))
    }

    /// Get a revision by id.
    pub fn get(&self, id: &RevisionId) -> Option<&Revision> {
        self.revisions.get(id)
    }

    /// Content of a revision, if it exists.
    pub fn content_of(&self, id: &RevisionId) -> Option<&str> {
        self.revisions.get(id).map(Revision::content)
    }

    pub fn contains(&self, id: &RevisionId) -> bool {
        self.revisions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Iterate all revisions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Revision> {
        self.revisions.values()
    }

    /// Set or clear a revision's label. Unknown ids are ignored.
    pub fn set_label(&mut self, id: &RevisionId, label: Option<String>) -> bool {
        match self.revisions.get_mut(id) {
            Some(revision) => {
                let label = label.filter(|l| !l.trim().is_empty());
                revision.set_label(label);
                true
            }
            None => false,
        }
    }

    /// Flip a revision's pinned flag. Unknown ids are ignored.
    pub fn toggle_pin(&mut self, id: &RevisionId) -> bool {
        match self.revisions.get_mut(id) {
            Some(revision) => {
                revision.toggle_pinned();
                true
            }
            None => false,
        }
    }

    /// Parent chain from `head` to the root, newest first.
    pub fn history(&self, head: &RevisionId) -> Vec<&Revision> {
        let mut ordered = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.revisions.get(head);

        while let Some(revision) = current {
            if !seen.insert(revision.id()) {
                break;
            }
            ordered.push(revision);
            current = revision.parent_id().and_then(|p| self.revisions.get(p));
        }

        ordered
    }

    /// Check what deserialization skips: every revision is keyed by its own
    /// id and no parent chain loops back on itself.
    pub fn verify(&self) -> Result<()> {
        for (key, revision) in &self.revisions {
            if key != revision.id() {
                return Err(CoreError::UnrecognizedSnapshot(format!(
                    "revision stored under {} has id {}",
                    key,
                    revision.id()
                )));
            }
        }

        let mut acyclic: HashSet<&RevisionId> = HashSet::new();
        for start in self.revisions.keys() {
            let mut path = HashSet::new();
            let mut current = Some(start);
            while let Some(id) = current {
                if acyclic.contains(id) {
                    break;
                }
                if !path.insert(id) {
                    return Err(CoreError::UnrecognizedSnapshot(format!(
                        "revision {} is its own ancestor",
                        id
                    )));
                }
                current = self.revisions.get(id).and_then(Revision::parent_id);
            }
            acyclic.extend(path);
        }
        Ok(())
    }

    /// Direct children of a revision.
    pub fn children(&self, id: &RevisionId) -> Vec<&Revision> {
        self.revisions
            .values()
            .filter(|r| r.parent_id() == Some(id))
            .collect()
    }

    /// Ids whose parent is not in the store.
    pub fn dangling_parents(&self) -> Vec<&RevisionId> {
        self.revisions
            .values()
            .filter(|r| r.parent_id().is_some_and(|p| !self.revisions.contains_key(p)))
            .map(Revision::id)
            .collect()
    }
}
