//! Top-level application state.

use crate::document::{Document, DocumentPreferences, ProjectBrief};
use crate::error::{CoreError, Result};
use crate::merge::{MergePreview, MergeResolution};
use crate::pipeline::{GeneratedText, StageGenerator};
use crate::session::{CommitOutcome, Session};
use crate::settings::Settings;
use crate::types::{Author, BranchId, DocumentId, RevisionId, RevisionInput, Stage};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// All documents, their sessions, and global settings.
///
/// Exactly one document is current. Operations validate before they mutate,
/// so an error leaves the state as it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppState {
    documents: BTreeMap<DocumentId, Document>,
    sessions: BTreeMap<DocumentId, Session>,
    current_document_id: DocumentId,
    pub settings: Settings,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// First-launch state: one untitled document on `main`.
    pub fn new() -> Self {
        let (doc, session) = Document::new_with_session(None);
        let id = doc.id.clone();

        let mut documents = BTreeMap::new();
        documents.insert(id.clone(), doc);
        let mut sessions = BTreeMap::new();
        sessions.insert(id.clone(), session);

        Self {
            documents,
            sessions,
            current_document_id: id,
            settings: Settings::default(),
        }
    }

    /// Assemble a state from already-validated parts.
    ///
    /// Every document must have a session and the current id must name one
    /// of the documents.
    pub(crate) fn from_parts(
        documents: BTreeMap<DocumentId, Document>,
        sessions: BTreeMap<DocumentId, Session>,
        current_document_id: DocumentId,
        settings: Settings,
    ) -> Result<Self> {
        if !documents.contains_key(&current_document_id) {
            return Err(CoreError::UnrecognizedSnapshot(format!(
                "current document {} is not in the documents map",
                current_document_id
            )));
        }
        if let Some(id) = documents.keys().find(|id| !sessions.contains_key(*id)) {
            return Err(CoreError::UnrecognizedSnapshot(format!(
                "document {} has no session",
                id
            )));
        }
        Ok(Self {
            documents,
            sessions,
            current_document_id,
            settings,
        })
    }

    // --- Accessors ---

    pub fn current_document_id(&self) -> &DocumentId {
        &self.current_document_id
    }

    pub fn documents(&self) -> &BTreeMap<DocumentId, Document> {
        &self.documents
    }

    pub fn sessions(&self) -> &BTreeMap<DocumentId, Session> {
        &self.sessions
    }

    pub fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn session(&self, id: &DocumentId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    fn missing_current(&self) -> CoreError {
        CoreError::UnrecognizedSnapshot(format!(
            "current document {} is missing",
            self.current_document_id
        ))
    }

    pub fn current_document(&self) -> Result<&Document> {
        self.documents
            .get(&self.current_document_id)
            .ok_or_else(|| self.missing_current())
    }

    pub fn current_session(&self) -> Result<&Session> {
        self.sessions
            .get(&self.current_document_id)
            .ok_or_else(|| self.missing_current())
    }

    fn current_mut(&mut self) -> Result<(&mut Document, &mut Session)> {
        let err = self.missing_current();
        let doc = self.documents.get_mut(&self.current_document_id);
        let session = self.sessions.get_mut(&self.current_document_id);
        match (doc, session) {
            (Some(doc), Some(session)) => Ok((doc, session)),
            _ => Err(err),
        }
    }

    /// Whether the current working copy has uncommitted edits.
    pub fn is_dirty(&self) -> Result<bool> {
        Ok(self.current_session()?.is_dirty(self.current_document()?))
    }

    // --- Working copy ---

    pub fn update_content(&mut self, text: impl Into<String>) -> Result<()> {
        let (doc, session) = self.current_mut()?;
        session.update_content(doc, text);
        Ok(())
    }

    pub fn select_revision(&mut self, id: &RevisionId) -> Result<()> {
        let (doc, session) = self.current_mut()?;
        session.select_revision(doc, id)
    }

    pub fn compare_revision(&mut self, id: Option<&RevisionId>) -> Result<()> {
        let (doc, session) = self.current_mut()?;
        session.compare_with(doc, id)
    }

    pub fn commit(&mut self, rationale: &str) -> Result<CommitOutcome> {
        let (doc, session) = self.current_mut()?;
        session.commit(doc, rationale)
    }

    pub fn discard(&mut self) -> Result<()> {
        let (doc, session) = self.current_mut()?;
        session.discard(doc)
    }

    /// Append a fully specified revision and select it.
    pub fn add_revision(&mut self, input: RevisionInput) -> Result<RevisionId> {
        let (doc, session) = self.current_mut()?;
        let id = doc.add_revision(input)?;
        session.adopt_revision(doc, &id)?;
        Ok(id)
    }

    // --- Branches and revision metadata ---

    pub fn create_branch(&mut self, name: &str, from: &RevisionId) -> Result<BranchId> {
        let (doc, _) = self.current_mut()?;
        doc.create_branch(name, from)
    }

    pub fn switch_branch(&mut self, id: &BranchId) -> Result<()> {
        let (doc, session) = self.current_mut()?;
        session.switch_branch(doc, id)
    }

    pub fn set_revision_label(&mut self, id: &RevisionId, label: Option<String>) -> Result<()> {
        let (doc, _) = self.current_mut()?;
        doc.set_revision_label(id, label);
        Ok(())
    }

    pub fn toggle_pin(&mut self, id: &RevisionId) -> Result<()> {
        let (doc, _) = self.current_mut()?;
        doc.toggle_pin(id);
        Ok(())
    }

    // --- Pipeline ---

    /// Wrap generated text in an agent revision on top of the selection.
    pub fn commit_generated(
        &mut self,
        stage: Stage,
        generated: GeneratedText,
    ) -> Result<RevisionId> {
        let parent = self.current_session()?.selected_revision_id().clone();
        let input = RevisionInput::new(Some(parent), generated.output)
            .with_author(Author::Agent)
            .with_rationale(generated.rationale)
            .with_stage(stage);
        self.add_revision(input)
    }

    /// Run one pipeline stage over the working copy.
    ///
    /// A dirty working copy is committed first so the generated revision
    /// descends from exactly the text that was fed to the generator.
    pub fn run_stage(
        &mut self,
        stage: Stage,
        generator: &dyn StageGenerator,
    ) -> Result<RevisionId> {
        self.commit(&format!("Auto-commit before {}", stage.label()))?;
        let input = self.current_session()?.working_content().to_string();
        let generated = generator.generate(stage, &input);
        debug!(stage = stage.label(), "stage generated");
        self.commit_generated(stage, generated)
    }

    // --- Merge ---

    /// Preview merging `source` into the current branch.
    ///
    /// A dirty working copy is committed first. With no explicit resolution
    /// the document's preferred policy is used.
    pub fn preview_merge(
        &mut self,
        source: &BranchId,
        resolution: Option<MergeResolution>,
    ) -> Result<MergePreview> {
        let doc = self.current_document()?;
        if !doc.branches().contains(source) {
            return Err(CoreError::UnknownBranch(source.clone()));
        }
        let resolution = resolution.unwrap_or(doc.preferences.merge_resolution);

        self.commit("Auto-commit before merge preview")?;
        MergePreview::capture(self.current_document()?, source, resolution)
    }

    /// Apply a preview to the current document and select the merge revision.
    pub fn apply_merge(&mut self, preview: &MergePreview) -> Result<RevisionId> {
        let (doc, session) = self.current_mut()?;
        let id = preview.apply(doc)?;
        session.adopt_revision(doc, &id)?;
        Ok(id)
    }

    // --- Document metadata ---

    pub fn update_title(&mut self, title: impl Into<String>) -> Result<()> {
        let (doc, _) = self.current_mut()?;
        doc.title = title.into();
        Ok(())
    }

    pub fn update_brief(&mut self, brief: ProjectBrief) -> Result<()> {
        let (doc, _) = self.current_mut()?;
        doc.brief = brief;
        Ok(())
    }

    pub fn update_preferences(&mut self, preferences: DocumentPreferences) -> Result<()> {
        let (doc, _) = self.current_mut()?;
        doc.preferences = preferences;
        Ok(())
    }

    // --- Documents ---

    /// Add a fresh document and make it current.
    pub fn create_document(&mut self, title: Option<&str>) -> DocumentId {
        let (doc, session) = Document::new_with_session(title);
        let id = doc.id.clone();

        self.documents.insert(id.clone(), doc);
        self.sessions.insert(id.clone(), session);
        self.current_document_id = id.clone();

        info!(document = %id, "document created");
        id
    }

    /// Make `id` current. Unknown ids leave the state unchanged.
    pub fn switch_document(&mut self, id: &DocumentId) -> bool {
        if !self.documents.contains_key(id) {
            debug!(document = %id, "ignoring switch to unknown document");
            return false;
        }
        self.current_document_id = id.clone();
        true
    }

    /// Remove a document and its session.
    ///
    /// Ignored for unknown ids and for the last remaining document. If the
    /// current document is removed, the first remaining one becomes current.
    pub fn delete_document(&mut self, id: &DocumentId) -> bool {
        if self.documents.len() <= 1 || !self.documents.contains_key(id) {
            debug!(document = %id, "ignoring document deletion");
            return false;
        }

        self.documents.remove(id);
        self.sessions.remove(id);

        if &self.current_document_id == id {
            if let Some(next) = self.documents.keys().next() {
                self.current_document_id = next.clone();
            }
        }

        info!(document = %id, "document deleted");
        true
    }
}
