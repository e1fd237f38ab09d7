//! Snapshot schemas and the normalize step that turns either one into an
//! [`AppState`].

use crate::document::Document;
use crate::error::{CoreError, Result};
use crate::session::Session;
use crate::settings::Settings;
use crate::types::{DocumentId, RevisionId};
use crate::workspace::AppState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Schema version written by [`export_snapshot`].
pub const SNAPSHOT_VERSION: u32 = 2;

fn current_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Multi-document snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotV2 {
    #[serde(default = "current_version")]
    pub version: u32,
    pub documents: BTreeMap<DocumentId, Document>,
    pub current_document_id: DocumentId,
    #[serde(default)]
    pub sessions: BTreeMap<DocumentId, Session>,
    #[serde(default)]
    pub settings: Settings,
}

/// Legacy single-document snapshot. Read only.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotV1 {
    pub document: Document,
    pub selected_revision_id: RevisionId,
    #[serde(default)]
    pub compare_revision_id: Option<RevisionId>,
    #[serde(default)]
    pub working_content: Option<String>,
    #[serde(default)]
    pub draft_stash_by_revision_id: BTreeMap<RevisionId, String>,
    #[serde(default)]
    pub settings: Settings,
}

/// A parsed snapshot in whichever schema it was written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PersistedSnapshot {
    V2(SnapshotV2),
    V1(SnapshotV1),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedSnapshot<'a> {
    version: u32,
    documents: &'a BTreeMap<DocumentId, Document>,
    current_document_id: &'a DocumentId,
    sessions: &'a BTreeMap<DocumentId, Session>,
    settings: &'a Settings,
}

fn wrong_shape(err: serde_json::Error) -> CoreError {
    CoreError::UnrecognizedSnapshot(err.to_string())
}

impl PersistedSnapshot {
    /// Parse raw text. Text that is not JSON fails with `InvalidJson`; JSON
    /// of the wrong shape fails with `UnrecognizedSnapshot`.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(raw).map_err(|err| CoreError::InvalidJson(err.to_string()))?;
        Self::from_value(value)
    }

    /// Pick the schema by its top-level keys.
    pub fn from_value(value: Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(CoreError::UnrecognizedSnapshot(
                "top level is not an object".into(),
            ));
        };

        if object.contains_key("documents") {
            if let Some(version) = object.get("version") {
                if version.as_u64() != Some(u64::from(SNAPSHOT_VERSION)) {
                    return Err(CoreError::UnrecognizedSnapshot(format!(
                        "unsupported snapshot version {}",
                        version
                    )));
                }
            }
            serde_json::from_value(value).map(Self::V2).map_err(wrong_shape)
        } else if object.contains_key("document") {
            serde_json::from_value(value).map(Self::V1).map_err(wrong_shape)
        } else {
            Err(CoreError::UnrecognizedSnapshot(
                "expected a `documents` map or a legacy `document`".into(),
            ))
        }
    }

    /// Upgrade to the current shape and heal every session.
    pub fn normalize(self) -> Result<AppState> {
        match self {
            Self::V2(snapshot) => normalize_v2(snapshot),
            Self::V1(legacy) => {
                debug!("upgrading legacy single-document snapshot");
                normalize_v2(upgrade_v1(legacy))
            }
        }
    }
}

fn upgrade_v1(legacy: SnapshotV1) -> SnapshotV2 {
    let SnapshotV1 {
        document,
        selected_revision_id,
        compare_revision_id,
        working_content,
        draft_stash_by_revision_id,
        settings,
    } = legacy;

    let working_content = working_content
        .or_else(|| {
            document
                .revisions()
                .content_of(&selected_revision_id)
                .map(str::to_string)
        })
        .unwrap_or_default();
    let session = Session::from_parts(
        selected_revision_id,
        compare_revision_id,
        working_content,
        draft_stash_by_revision_id,
    );

    let id = document.id.clone();
    SnapshotV2 {
        version: SNAPSHOT_VERSION,
        documents: BTreeMap::from([(id.clone(), document)]),
        current_document_id: id.clone(),
        sessions: BTreeMap::from([(id, session)]),
        settings,
    }
}

fn normalize_v2(snapshot: SnapshotV2) -> Result<AppState> {
    let SnapshotV2 {
        documents,
        current_document_id,
        mut sessions,
        settings,
        ..
    } = snapshot;

    if documents.is_empty() {
        return Err(CoreError::UnrecognizedSnapshot(
            "snapshot has no documents".into(),
        ));
    }

    let mut checked = BTreeMap::new();
    for (key, mut doc) in documents {
        if doc.id != key {
            warn!(key = %key, id = %doc.id, "document id does not match its key, using key");
            doc.id = key.clone();
        }
        doc.validate().map_err(|err| {
            let detail = match err {
                CoreError::UnrecognizedSnapshot(detail) => detail,
                other => other.to_string(),
            };
            CoreError::UnrecognizedSnapshot(format!("document {}: {}", key, detail))
        })?;
        for orphan in doc.revisions().dangling_parents() {
            warn!(document = %key, revision = %orphan, "revision parent is missing");
        }
        checked.insert(key, doc);
    }

    if !checked.contains_key(&current_document_id) {
        return Err(CoreError::UnrecognizedSnapshot(format!(
            "current document {} is not in the documents map",
            current_document_id
        )));
    }

    let mut healed = BTreeMap::new();
    for (id, doc) in &checked {
        let mut session = match sessions.remove(id) {
            Some(session) => session,
            None => {
                debug!(document = %id, "no session stored, starting clean on branch head");
                Session::for_document(doc)?
            }
        };
        let dropped = session.heal(doc)?;
        if dropped > 0 {
            warn!(document = %id, dropped, "dropped stale stash entries");
        }
        healed.insert(id.clone(), session);
    }
    for orphan in sessions.keys() {
        warn!(document = %orphan, "dropping session for unknown document");
    }

    info!(documents = checked.len(), "snapshot imported");
    AppState::from_parts(checked, healed, current_document_id, settings)
}

/// Parse and normalize a snapshot of either schema.
pub fn import_snapshot(raw: &str) -> Result<AppState> {
    PersistedSnapshot::parse(raw)?.normalize()
}

/// Pretty-printed snapshot in the current schema.
pub fn export_snapshot(state: &AppState) -> Result<String> {
    let snapshot = ExportedSnapshot {
        version: SNAPSHOT_VERSION,
        documents: state.documents(),
        current_document_id: state.current_document_id(),
        sessions: state.sessions(),
        settings: &state.settings,
    };
    Ok(serde_json::to_string_pretty(&snapshot)?)
}
