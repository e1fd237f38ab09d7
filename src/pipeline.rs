//! Boundary to the text-generation collaborator.
//!
//! The core never waits on generation. Callers run a [`StageGenerator`]
//! (or any slower process of their own) and hand the finished text back as
//! a [`GeneratedText`], which is wrapped in an agent-authored revision.

use crate::types::Stage;
use serde::{Deserialize, Serialize};

/// Output of one pipeline stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub output: String,
    pub rationale: String,
}

impl GeneratedText {
    pub fn new(output: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            rationale: rationale.into(),
        }
    }
}

/// Produces new revision content for a stage from the current text.
pub trait StageGenerator {
    fn generate(&self, stage: Stage, input: &str) -> GeneratedText;
}

impl<F> StageGenerator for F
where
    F: Fn(Stage, &str) -> GeneratedText,
{
    fn generate(&self, stage: Stage, input: &str) -> GeneratedText {
        self(stage, input)
    }
}
