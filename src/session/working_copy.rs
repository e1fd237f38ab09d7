//! Session state and working-copy transitions.

use crate::document::Document;
use crate::error::{CoreError, Result};
use crate::types::{Author, BranchId, Revision, RevisionId, RevisionInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Result of a commit request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The working copy matched the selected revision.
    NothingToCommit,
    /// A new revision was created.
    Committed(RevisionId),
}

/// Editing state for one document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    selected_revision_id: RevisionId,
    #[serde(default)]
    compare_revision_id: Option<RevisionId>,
    working_content: String,
    #[serde(default)]
    draft_stash_by_revision_id: BTreeMap<RevisionId, String>,
}

impl Session {
    /// A clean session positioned on `revision`.
    pub fn for_revision(revision: &Revision) -> Self {
        Self {
            selected_revision_id: revision.id().clone(),
            compare_revision_id: None,
            working_content: revision.content().to_string(),
            draft_stash_by_revision_id: BTreeMap::new(),
        }
    }

    /// A clean session on the head of the document's current branch.
    pub fn for_document(doc: &Document) -> Result<Self> {
        Ok(Self::for_revision(doc.head()?))
    }

    /// Rebuild a session from persisted parts without checking it against a
    /// document; see [`Session::heal`].
    pub fn from_parts(
        selected_revision_id: RevisionId,
        compare_revision_id: Option<RevisionId>,
        working_content: String,
        draft_stash_by_revision_id: BTreeMap<RevisionId, String>,
    ) -> Self {
        Self {
            selected_revision_id,
            compare_revision_id,
            working_content,
            draft_stash_by_revision_id,
        }
    }

    pub fn selected_revision_id(&self) -> &RevisionId {
        &self.selected_revision_id
    }

    pub fn compare_revision_id(&self) -> Option<&RevisionId> {
        self.compare_revision_id.as_ref()
    }

    pub fn working_content(&self) -> &str {
        &self.working_content
    }

    pub fn stash(&self) -> &BTreeMap<RevisionId, String> {
        &self.draft_stash_by_revision_id
    }

    /// Stashed text for a revision, if any.
    pub fn stashed(&self, id: &RevisionId) -> Option<&str> {
        self.draft_stash_by_revision_id.get(id).map(String::as_str)
    }

    fn selected<'d>(&self, doc: &'d Document) -> Result<&'d Revision> {
        doc.revision(&self.selected_revision_id)
            .ok_or_else(|| CoreError::UnknownRevision(self.selected_revision_id.clone()))
    }

    /// Whether the working copy differs from the selected revision.
    pub fn is_dirty(&self, doc: &Document) -> bool {
        doc.revisions()
            .content_of(&self.selected_revision_id)
            .map_or(true, |content| content != self.working_content)
    }

    /// Replace the working copy, stashing it unless it matches the revision.
    pub fn update_content(&mut self, doc: &Document, text: impl Into<String>) {
        let text = text.into();
        let clean = doc
            .revisions()
            .content_of(&self.selected_revision_id)
            .is_some_and(|content| content == text);

        if clean {
            self.draft_stash_by_revision_id.remove(&self.selected_revision_id);
        } else {
            self.draft_stash_by_revision_id
                .insert(self.selected_revision_id.clone(), text.clone());
        }
        self.working_content = text;
    }

    /// Move the selection to `id`, restoring its stash if one exists.
    pub fn select_revision(&mut self, doc: &Document, id: &RevisionId) -> Result<()> {
        let revision = doc
            .revision(id)
            .ok_or_else(|| CoreError::UnknownRevision(id.clone()))?;

        self.working_content = match self.draft_stash_by_revision_id.get(id) {
            Some(stashed) => stashed.clone(),
            None => revision.content().to_string(),
        };
        self.selected_revision_id = id.clone();
        Ok(())
    }

    /// Commit the working copy as a child of the selected revision.
    ///
    /// The new revision inherits the selected revision's stage and advances
    /// the document's current branch.
    pub fn commit(&mut self, doc: &mut Document, rationale: &str) -> Result<CommitOutcome> {
        if !self.is_dirty(doc) {
            return Ok(CommitOutcome::NothingToCommit);
        }

        let parent = self.selected(doc)?;
        let input = RevisionInput::new(Some(parent.id().clone()), self.working_content.clone())
            .with_author(Author::User)
            .with_rationale(rationale)
            .with_stage(parent.stage());

        let old = self.selected_revision_id.clone();
        let id = doc.add_revision(input)?;

        self.draft_stash_by_revision_id.remove(&old);
        self.draft_stash_by_revision_id.remove(&id);
        self.selected_revision_id = id.clone();

        info!(document = %doc.id, revision = %id, parent = %old, "committed working copy");
        Ok(CommitOutcome::Committed(id))
    }

    /// Drop unsaved edits on the selected revision.
    pub fn discard(&mut self, doc: &Document) -> Result<()> {
        let content = self.selected(doc)?.content().to_string();
        self.draft_stash_by_revision_id.remove(&self.selected_revision_id);
        self.working_content = content;
        Ok(())
    }

    /// Switch the document's current branch and select its head.
    pub fn switch_branch(&mut self, doc: &mut Document, branch_id: &BranchId) -> Result<()> {
        let head = doc.switch_branch(branch_id)?;
        self.select_revision(doc, &head)
    }

    /// Select a freshly added revision, starting clean on it.
    pub fn adopt_revision(&mut self, doc: &Document, id: &RevisionId) -> Result<()> {
        self.draft_stash_by_revision_id.remove(id);
        self.select_revision(doc, id)
    }

    /// Set or clear the revision shown alongside the selection.
    pub fn compare_with(&mut self, doc: &Document, id: Option<&RevisionId>) -> Result<()> {
        if let Some(id) = id {
            if !doc.revisions().contains(id) {
                return Err(CoreError::UnknownRevision(id.clone()));
            }
        }
        self.compare_revision_id = id.cloned();
        Ok(())
    }

    /// Reconcile a deserialized session with its document.
    ///
    /// Drops stash entries for missing revisions or whose text equals the
    /// revision's own content, falls back to the branch head when the
    /// selection is gone, and re-stashes a dirty working copy. Returns the
    /// number of stash entries dropped.
    pub fn heal(&mut self, doc: &Document) -> Result<usize> {
        if !doc.revisions().contains(&self.selected_revision_id) {
            let head = doc.head()?;
            debug!(
                document = %doc.id,
                missing = %self.selected_revision_id,
                head = %head.id(),
                "selected revision missing, falling back to branch head"
            );
            self.selected_revision_id = head.id().clone();
            self.working_content = head.content().to_string();
        }

        if let Some(compare) = &self.compare_revision_id {
            if !doc.revisions().contains(compare) {
                self.compare_revision_id = None;
            }
        }

        let before = self.draft_stash_by_revision_id.len();
        self.draft_stash_by_revision_id
            .retain(|id, text| doc.revisions().content_of(id).is_some_and(|c| c != text.as_str()));
        let dropped = before - self.draft_stash_by_revision_id.len();

        if self.is_dirty(doc) {
            self.draft_stash_by_revision_id
                .insert(self.selected_revision_id.clone(), self.working_content.clone());
        } else {
            self.draft_stash_by_revision_id.remove(&self.selected_revision_id);
        }

        Ok(dropped)
    }
}
