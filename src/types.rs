//! Core types for the revision history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Length of generated ids, in hex characters.
const ID_HEX_LEN: usize = 24;

static ID_NONCE: AtomicU64 = AtomicU64::new(0);

/// Derive a fresh opaque id from a kind tag and some identifying parts.
///
/// The creation instant and a process-local nonce are folded in, so two
/// calls with identical parts still yield distinct ids.
pub(crate) fn fresh_id(kind: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(Timestamp::now().0.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.update(ID_NONCE.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    digest[..ID_HEX_LEN].to_string()
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $debug:literal, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub(crate) fn generate(parts: &[&str]) -> Self {
                $name(fresh_id($kind, parts))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($debug, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a revision.
    RevisionId,
    "RevisionId",
    "revision"
);

string_id!(
    /// Unique identifier for a branch within a document.
    BranchId,
    "BranchId",
    "branch"
);

string_id!(
    /// Unique identifier for a document.
    DocumentId,
    "DocumentId",
    "document"
);

/// Wall-clock instant, serialized as RFC 3339.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        Timestamp(Utc::now())
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0.to_rfc3339())
    }
}

/// Who produced a revision's content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    #[default]
    User,
    Agent,
}

/// Writing stage a revision belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Draft,
    Critique,
    Revise,
    Polish,
}

impl Stage {
    /// Stages in pipeline order.
    pub const ALL: [Stage; 4] = [Stage::Draft, Stage::Critique, Stage::Revise, Stage::Polish];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Draft => "Draft",
            Stage::Critique => "Critique",
            Stage::Revise => "Revise",
            Stage::Polish => "Polish",
        }
    }

    /// The stage after this one, if any.
    pub fn next(self) -> Option<Stage> {
        let pos = Stage::ALL.iter().position(|s| *s == self)?;
        Stage::ALL.get(pos + 1).copied()
    }
}

/// An immutable snapshot of a document at one point in history.
///
/// Only `label` and `pinned` may change after creation; everything else is
/// exposed read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    id: RevisionId,
    parent_id: Option<RevisionId>,
    created_at: Timestamp,
    author: Author,
    content: String,
    rationale: String,
    stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default)]
    pinned: bool,
}

impl Revision {
    /// Materialize an input under the given id, stamped with the current time.
    pub fn new(id: RevisionId, input: RevisionInput) -> Self {
        Self {
            id,
            parent_id: input.parent_id,
            created_at: Timestamp::now(),
            author: input.author,
            content: input.content,
            rationale: input.rationale,
            stage: input.stage,
            label: None,
            pinned: false,
        }
    }

    pub fn id(&self) -> &RevisionId {
        &self.id
    }

    pub fn parent_id(&self) -> Option<&RevisionId> {
        self.parent_id.as_ref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn author(&self) -> Author {
        self.author
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn pinned(&self) -> bool {
        self.pinned
    }

    pub(crate) fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    pub(crate) fn toggle_pinned(&mut self) {
        self.pinned = !self.pinned;
    }
}

/// Input for creating a new revision (before id and timestamp are assigned).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevisionInput {
    pub parent_id: Option<RevisionId>,
    pub author: Author,
    pub content: String,
    pub rationale: String,
    pub stage: Stage,
}

impl RevisionInput {
    /// A user-authored draft-stage revision on top of `parent_id`.
    pub fn new(parent_id: Option<RevisionId>, content: impl Into<String>) -> Self {
        Self {
            parent_id,
            author: Author::User,
            content: content.into(),
            rationale: String::new(),
            stage: Stage::Draft,
        }
    }

    pub fn with_author(mut self, author: Author) -> Self {
        self.author = author;
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }
}

/// A named, movable pointer to a revision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub head_revision_id: RevisionId,
}
