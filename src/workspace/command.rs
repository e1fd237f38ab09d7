//! Command/reducer interface over [`AppState`].

use super::AppState;
use crate::document::{DocumentPreferences, ProjectBrief};
use crate::error::Result;
use crate::merge::{MergePreview, MergeResolution};
use crate::pipeline::GeneratedText;
use crate::session::CommitOutcome;
use crate::settings::LlmSettings;
use crate::types::{BranchId, DocumentId, RevisionId, RevisionInput, Stage};
use tracing::debug;

/// One user intent.
#[derive(Clone, Debug)]
pub enum Command {
    UpdateContent(String),
    SelectRevision(RevisionId),
    CompareRevision(Option<RevisionId>),
    Commit { rationale: String },
    Discard,
    AddRevision(RevisionInput),
    CommitGenerated { stage: Stage, generated: GeneratedText },
    CreateBranch { name: String, from: RevisionId },
    SwitchBranch(BranchId),
    SetRevisionLabel { id: RevisionId, label: Option<String> },
    TogglePin(RevisionId),
    PreviewMerge {
        source: BranchId,
        resolution: Option<MergeResolution>,
    },
    ApplyMerge(Box<MergePreview>),
    UpdateTitle(String),
    UpdateBrief(ProjectBrief),
    UpdatePreferences(DocumentPreferences),
    UpdateLlmSettings(LlmSettings),
    ToggleFocusMode,
    ToggleTypewriterMode,
    SetExportTheme(String),
    CreateDocument { title: Option<String> },
    SwitchDocument(DocumentId),
    DeleteDocument(DocumentId),
    Reset(Box<AppState>),
}

/// What a command did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The state changed as requested.
    Applied,
    /// The command was a deliberate no-op (unknown or protected target).
    Ignored,
    NothingToCommit,
    Committed(RevisionId),
    RevisionAdded(RevisionId),
    BranchCreated(BranchId),
    DocumentCreated(DocumentId),
    MergePreviewed(Box<MergePreview>),
    Merged { revision: RevisionId, conflicts: usize },
}

/// The state after a command, plus what happened.
#[derive(Clone, Debug)]
pub struct Transition {
    pub state: AppState,
    pub outcome: Outcome,
}

impl AppState {
    /// Apply a command in place.
    ///
    /// Commands that touch one component validate before mutating; use
    /// [`reduce`] for an all-or-nothing transition.
    pub fn apply(&mut self, command: Command) -> Result<Outcome> {
        let outcome = match command {
            Command::UpdateContent(text) => {
                self.update_content(text)?;
                Outcome::Applied
            }
            Command::SelectRevision(id) => {
                self.select_revision(&id)?;
                Outcome::Applied
            }
            Command::CompareRevision(id) => {
                self.compare_revision(id.as_ref())?;
                Outcome::Applied
            }
            Command::Commit { rationale } => match self.commit(&rationale)? {
                CommitOutcome::NothingToCommit => Outcome::NothingToCommit,
                CommitOutcome::Committed(id) => Outcome::Committed(id),
            },
            Command::Discard => {
                self.discard()?;
                Outcome::Applied
            }
            Command::AddRevision(input) => Outcome::RevisionAdded(self.add_revision(input)?),
            Command::CommitGenerated { stage, generated } => {
                Outcome::RevisionAdded(self.commit_generated(stage, generated)?)
            }
            Command::CreateBranch { name, from } => {
                Outcome::BranchCreated(self.create_branch(&name, &from)?)
            }
            Command::SwitchBranch(id) => {
                self.switch_branch(&id)?;
                Outcome::Applied
            }
            Command::SetRevisionLabel { id, label } => {
                self.set_revision_label(&id, label)?;
                Outcome::Applied
            }
            Command::TogglePin(id) => {
                self.toggle_pin(&id)?;
                Outcome::Applied
            }
            Command::PreviewMerge { source, resolution } => {
                Outcome::MergePreviewed(Box::new(self.preview_merge(&source, resolution)?))
            }
            Command::ApplyMerge(preview) => Outcome::Merged {
                revision: self.apply_merge(&preview)?,
                conflicts: preview.conflict_count(),
            },
            Command::UpdateTitle(title) => {
                self.update_title(title)?;
                Outcome::Applied
            }
            Command::UpdateBrief(brief) => {
                self.update_brief(brief)?;
                Outcome::Applied
            }
            Command::UpdatePreferences(preferences) => {
                self.update_preferences(preferences)?;
                Outcome::Applied
            }
            Command::UpdateLlmSettings(llm) => {
                self.settings.llm = llm;
                Outcome::Applied
            }
            Command::ToggleFocusMode => {
                self.settings.ui.focus_mode = !self.settings.ui.focus_mode;
                Outcome::Applied
            }
            Command::ToggleTypewriterMode => {
                self.settings.ui.typewriter_mode = !self.settings.ui.typewriter_mode;
                Outcome::Applied
            }
            Command::SetExportTheme(theme) => {
                self.settings.ui.export_theme_id = theme;
                Outcome::Applied
            }
            Command::CreateDocument { title } => {
                Outcome::DocumentCreated(self.create_document(title.as_deref()))
            }
            Command::SwitchDocument(id) => applied_if(self.switch_document(&id)),
            Command::DeleteDocument(id) => applied_if(self.delete_document(&id)),
            Command::Reset(state) => {
                *self = *state;
                Outcome::Applied
            }
        };
        Ok(outcome)
    }
}

fn applied_if(changed: bool) -> Outcome {
    if changed {
        Outcome::Applied
    } else {
        Outcome::Ignored
    }
}

/// Pure transition: apply `command` to a copy of `state`.
///
/// On error the caller still holds the untouched input state.
pub fn reduce(state: &AppState, command: Command) -> Result<Transition> {
    let mut next = state.clone();
    let outcome = next.apply(command)?;
    debug!(outcome = outcome_kind(&outcome), "command applied");
    Ok(Transition {
        state: next,
        outcome,
    })
}

fn outcome_kind(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Applied => "applied",
        Outcome::Ignored => "ignored",
        Outcome::NothingToCommit => "nothing-to-commit",
        Outcome::Committed(_) => "committed",
        Outcome::RevisionAdded(_) => "revision-added",
        Outcome::BranchCreated(_) => "branch-created",
        Outcome::DocumentCreated(_) => "document-created",
        Outcome::MergePreviewed(_) => "merge-previewed",
        Outcome::Merged { .. } => "merged",
    }
}
