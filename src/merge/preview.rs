//! Two-phase merge: preview against captured heads, then apply.

use super::engine::{merge_three_way, MergeInput, MergeResolution, MergeResult};
use super::metrics::{summarize_merge, MergeSummary};
use crate::document::Document;
use crate::error::{CoreError, Result};
use crate::revisions::find_common_ancestor;
use crate::types::{Author, BranchId, DocumentId, RevisionId, RevisionInput, Stage};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A computed merge of a source branch into the current branch.
///
/// Holds everything needed to recompute the merge under another resolution
/// and to detect, at apply time, that the target branch has moved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePreview {
    pub document_id: DocumentId,
    pub target_branch_id: BranchId,
    pub target_branch_name: String,
    pub target_head_id: RevisionId,
    pub source_branch_id: BranchId,
    pub source_branch_name: String,
    pub source_head_id: RevisionId,
    pub source_stage: Stage,
    pub base_revision_id: Option<RevisionId>,
    pub base_content: String,
    pub target_content: String,
    pub source_content: String,
    pub resolution: MergeResolution,
    pub result: MergeResult,
}

impl MergePreview {
    /// Merge the head of `source_branch_id` into the current branch's head.
    pub fn capture(
        doc: &Document,
        source_branch_id: &BranchId,
        resolution: MergeResolution,
    ) -> Result<Self> {
        let target = doc.current_branch()?;
        let source = doc
            .branches()
            .get(source_branch_id)
            .ok_or_else(|| CoreError::UnknownBranch(source_branch_id.clone()))?;

        let target_head = doc
            .revision(&target.head_revision_id)
            .ok_or_else(|| CoreError::InvalidRevision(target.head_revision_id.clone()))?;
        let source_head = doc
            .revision(&source.head_revision_id)
            .ok_or_else(|| CoreError::InvalidRevision(source.head_revision_id.clone()))?;

        let base_revision_id =
            find_common_ancestor(doc.revisions(), target_head.id(), source_head.id());
        let base_content = base_revision_id
            .as_ref()
            .and_then(|id| doc.revisions().content_of(id))
            .unwrap_or("")
            .to_string();

        let mut preview = Self {
            document_id: doc.id.clone(),
            target_branch_id: target.id.clone(),
            target_branch_name: target.name.clone(),
            target_head_id: target_head.id().clone(),
            source_branch_id: source.id.clone(),
            source_branch_name: source.name.clone(),
            source_head_id: source_head.id().clone(),
            source_stage: source_head.stage(),
            base_revision_id,
            base_content,
            target_content: target_head.content().to_string(),
            source_content: source_head.content().to_string(),
            resolution,
            result: MergeResult {
                content: String::new(),
                conflicts: Vec::new(),
            },
        };
        preview.result = preview.compute();
        Ok(preview)
    }

    fn compute(&self) -> MergeResult {
        merge_three_way(&MergeInput {
            base: &self.base_content,
            target: &self.target_content,
            source: &self.source_content,
            target_label: &self.target_branch_name,
            source_label: &self.source_branch_name,
            resolution: self.resolution,
        })
    }

    /// Recompute under another resolution, keeping the captured heads.
    pub fn with_resolution(mut self, resolution: MergeResolution) -> Self {
        self.resolution = resolution;
        self.result = self.compute();
        self
    }

    pub fn merged_content(&self) -> &str {
        &self.result.content
    }

    pub fn conflict_count(&self) -> usize {
        self.result.conflicts.len()
    }

    /// Line deltas between the merged text and each side.
    pub fn summary(&self) -> MergeSummary {
        summarize_merge(
            &self.target_content,
            &self.source_content,
            &self.result.content,
            self.conflict_count(),
        )
    }

    /// Rationale recorded on the merge revision.
    pub fn rationale(&self) -> String {
        match self.conflict_count() {
            0 => format!("Merged from branch {}", self.source_branch_name),
            n => format!(
                "Merged from branch {} ({} conflicts, {})",
                self.source_branch_name,
                n,
                self.resolution.label()
            ),
        }
    }

    /// Fail with `StalePreview` unless `doc` is still where it was captured.
    pub fn check_fresh(&self, doc: &Document) -> Result<()> {
        if doc.id != self.document_id {
            return Err(CoreError::StalePreview(format!(
                "preview was computed for document {}",
                self.document_id
            )));
        }

        let current = doc.current_branch()?;
        if current.id != self.target_branch_id {
            return Err(CoreError::StalePreview(format!(
                "current branch changed from {} to {}",
                self.target_branch_name, current.name
            )));
        }
        if current.head_revision_id != self.target_head_id {
            return Err(CoreError::StalePreview(format!(
                "branch {} moved from {} to {}",
                current.name, self.target_head_id, current.head_revision_id
            )));
        }
        Ok(())
    }

    /// Create the merge revision on top of the captured target head.
    ///
    /// The merge revision takes the source head's stage.
    pub fn apply(&self, doc: &mut Document) -> Result<RevisionId> {
        if let Err(err) = self.check_fresh(doc) {
            warn!(document = %self.document_id, error = %err, "rejected stale merge preview");
            return Err(err);
        }
        if !doc.revisions().contains(&self.source_head_id) {
            return Err(CoreError::UnknownRevision(self.source_head_id.clone()));
        }

        let parent = Some(self.target_head_id.clone());
        let input = RevisionInput::new(parent, self.result.content.clone())
            .with_author(Author::User)
            .with_rationale(self.rationale())
            .with_stage(self.source_stage);
        let id = doc.add_revision(input)?;

        info!(
            document = %self.document_id,
            source = %self.source_branch_name,
            target = %self.target_branch_name,
            conflicts = self.conflict_count(),
            revision = %id,
            "merge applied"
        );
        Ok(id)
    }
}
