//! Documents: one revision store plus one branch table.

use crate::branches::BranchTable;
use crate::error::{CoreError, Result};
use crate::merge::MergeResolution;
use crate::revisions::RevisionStore;
use crate::session::Session;
use crate::types::{Branch, BranchId, DocumentId, Revision, RevisionId, RevisionInput, Stage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Title given to documents created without one.
pub const DEFAULT_TITLE: &str = "Untitled Draft";

/// Writing brief attached to a document.
///
/// Every field falls back to its default when missing from a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectBrief {
    pub audience: String,
    pub goal: String,
    pub tone: String,
    pub length: u32,
    pub key_points: Vec<String>,
    pub constraints: String,
    pub template_id: String,
}

impl Default for ProjectBrief {
    fn default() -> Self {
        Self {
            audience: "Product and marketing teams".to_string(),
            goal: "Explain the update, why it matters, and the next step.".to_string(),
            tone: "Clear, confident, and concise".to_string(),
            length: 700,
            key_points: vec![
                "Problem or opportunity".to_string(),
                "What changed".to_string(),
                "Expected impact".to_string(),
            ],
            constraints: "Keep it scannable with headings and bullets.".to_string(),
            template_id: "product-update".to_string(),
        }
    }
}

/// How two revisions are shown side by side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
    #[default]
    Inline,
    Side,
}

/// Markdown export flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarkdownExport {
    #[default]
    Plain,
    Frontmatter,
}

/// Per-document preferences.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentPreferences {
    pub diff_mode: DiffMode,
    pub markdown_export: MarkdownExport,
    /// Policy new merge previews start with.
    pub merge_resolution: MergeResolution,
}

/// A document with its own history and branches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    current_branch_id: BranchId,
    #[serde(default)]
    pub brief: ProjectBrief,
    #[serde(default)]
    pub preferences: DocumentPreferences,
    branches: BranchTable,
    revisions: RevisionStore,
}

impl Document {
    /// Fresh document with one root revision and a `main` branch.
    pub fn new(title: Option<&str>) -> Self {
        Self::new_with_session(title).0
    }

    /// Fresh document plus a clean session positioned on its root.
    pub(crate) fn new_with_session(title: Option<&str>) -> (Self, Session) {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();

        let root = Revision::new(
            RevisionId::generate(&[title.as_str()]),
            RevisionInput::new(None, format!("# {}\n\nStart writing here...", title))
                .with_rationale("Initial draft")
                .with_stage(Stage::Draft),
        );
        let root_id = root.id().clone();
        let session = Session::for_revision(&root);

        let revisions = RevisionStore::from_root(root);
        let (branches, main_id) = BranchTable::with_main(root_id);

        let doc = Self {
            id: DocumentId::generate(&[title.as_str()]),
            title,
            current_branch_id: main_id,
            brief: ProjectBrief::default(),
            preferences: DocumentPreferences::default(),
            branches,
            revisions,
        };
        (doc, session)
    }

    /// Check the invariants a deserialized document relies on: parent
    /// chains end, map keys match ids, branch names are distinct and every
    /// branch head exists.
    pub fn validate(&self) -> Result<()> {
        if self.revisions.is_empty() {
            return Err(CoreError::UnrecognizedSnapshot(format!(
                "document {} has no revisions",
                self.id
            )));
        }
        self.revisions.verify()?;
        self.branches.verify()?;
        if !self.branches.contains(&self.current_branch_id) {
            return Err(CoreError::UnknownBranch(self.current_branch_id.clone()));
        }
        if let Some(branch) = self.branches.dangling_heads(&self.revisions).next() {
            return Err(CoreError::InvalidRevision(branch.head_revision_id.clone()));
        }
        Ok(())
    }

    pub fn revisions(&self) -> &RevisionStore {
        &self.revisions
    }

    pub fn branches(&self) -> &BranchTable {
        &self.branches
    }

    pub fn revision(&self, id: &RevisionId) -> Option<&Revision> {
        self.revisions.get(id)
    }

    pub fn current_branch_id(&self) -> &BranchId {
        &self.current_branch_id
    }

    /// The branch commits currently advance.
    pub fn current_branch(&self) -> Result<&Branch> {
        self.branches
            .get(&self.current_branch_id)
            .ok_or_else(|| CoreError::UnknownBranch(self.current_branch_id.clone()))
    }

    /// Head of the current branch.
    pub fn head(&self) -> Result<&Revision> {
        let branch = self.current_branch()?;
        self.revisions
            .get(&branch.head_revision_id)
            .ok_or_else(|| CoreError::InvalidRevision(branch.head_revision_id.clone()))
    }

    /// Append a revision and advance the current branch to it.
    pub fn add_revision(&mut self, input: RevisionInput) -> Result<RevisionId> {
        // Resolve the branch before touching the store so a bad branch
        // leaves nothing behind.
        let branch_id = self.current_branch()?.id.clone();
        let id = self.revisions.append(input)?.id().clone();
        self.branches.set_head(&branch_id, id.clone(), &self.revisions)?;

        debug!(document = %self.id, branch = %branch_id, revision = %id, "revision added");
        Ok(id)
    }

    /// Create a branch named `name` at `from`.
    pub fn create_branch(&mut self, name: &str, from: &RevisionId) -> Result<BranchId> {
        let branch = self.branches.create(name, from, &self.revisions)?;
        debug!(document = %self.id, branch = %branch.id, name = %branch.name, "branch created");
        Ok(branch.id.clone())
    }

    /// Make `branch_id` current and return its head.
    pub fn switch_branch(&mut self, branch_id: &BranchId) -> Result<RevisionId> {
        let branch = self
            .branches
            .get(branch_id)
            .ok_or_else(|| CoreError::UnknownBranch(branch_id.clone()))?;
        let head = branch.head_revision_id.clone();

        self.current_branch_id = branch_id.clone();
        debug!(document = %self.id, branch = %branch_id, "switched branch");
        Ok(head)
    }

    /// Set or clear a revision label. Unknown ids are a no-op.
    pub fn set_revision_label(&mut self, id: &RevisionId, label: Option<String>) {
        self.revisions.set_label(id, label);
    }

    /// Flip a revision's pin. Unknown ids are a no-op.
    pub fn toggle_pin(&mut self, id: &RevisionId) {
        self.revisions.toggle_pin(id);
    }
}
