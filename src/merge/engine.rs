//! Three-way merge engine.

use serde::{Deserialize, Serialize};

/// How conflicting lines are written into the merged text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MergeResolution {
    /// Emit conflict marker blocks for the user to resolve.
    #[default]
    Manual,
    /// Keep the target (current branch) line.
    PreferTarget,
    /// Keep the source (merged-in branch) line.
    PreferSource,
}

impl MergeResolution {
    /// Human-readable description used in merge rationales.
    pub fn label(self) -> &'static str {
        match self {
            MergeResolution::Manual => "manual conflict markers",
            MergeResolution::PreferTarget => "prefer current branch",
            MergeResolution::PreferSource => "prefer source branch",
        }
    }
}

/// A line both sides changed in different ways.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConflict {
    /// 1-based line number in the compared texts.
    pub line: usize,
    pub base: String,
    pub target: String,
    pub source: String,
}

/// Inputs to a merge.
#[derive(Clone, Debug)]
pub struct MergeInput<'a> {
    pub base: &'a str,
    pub target: &'a str,
    pub source: &'a str,
    pub target_label: &'a str,
    pub source_label: &'a str,
    pub resolution: MergeResolution,
}

/// Merged text and the conflicts found while producing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    pub content: String,
    pub conflicts: Vec<MergeConflict>,
}

impl MergeResult {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Split normalized text into lines. The empty text has no lines; a single
/// terminal newline does not start an extra line.
fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.strip_suffix('\n').unwrap_or(text).split('\n').collect()
}

/// Merge `source` into `target` using `base` as the common ancestor.
///
/// Lines are compared by position. A line missing on one side compares as
/// the empty line. Lines dropped by both sides are not emitted.
pub fn merge_three_way(input: &MergeInput<'_>) -> MergeResult {
    let base = normalize_line_endings(input.base);
    let target = normalize_line_endings(input.target);
    let source = normalize_line_endings(input.source);

    let base_lines = split_lines(&base);
    let target_lines = split_lines(&target);
    let source_lines = split_lines(&source);

    let line_count = base_lines
        .len()
        .max(target_lines.len())
        .max(source_lines.len());

    let mut merged: Vec<Emitted<'_>> = Vec::with_capacity(line_count);
    let mut conflicts = Vec::new();

    for index in 0..line_count {
        let base_line = base_lines.get(index).copied();
        let target_line = target_lines.get(index).copied();
        let source_line = source_lines.get(index).copied();

        let base_text = base_line.unwrap_or("");
        let target_text = target_line.unwrap_or("");
        let source_text = source_line.unwrap_or("");

        let target_changed = target_text != base_text;
        let source_changed = source_text != base_text;

        let chosen = match (target_changed, source_changed) {
            (false, false) => target_line.or(source_line),
            (true, false) => target_line,
            (false, true) => source_line,
            (true, true) if target_text == source_text => target_line.or(source_line),
            (true, true) => {
                conflicts.push(MergeConflict {
                    line: index + 1,
                    base: base_text.to_string(),
                    target: target_text.to_string(),
                    source: source_text.to_string(),
                });

                match input.resolution {
                    MergeResolution::PreferTarget => target_line,
                    MergeResolution::PreferSource => source_line,
                    MergeResolution::Manual => {
                        merged.extend([
                            Emitted::TargetMarker,
                            Emitted::Line(target_text),
                            Emitted::Line(CONFLICT_SEPARATOR),
                            Emitted::Line(source_text),
                            Emitted::SourceMarker,
                        ]);
                        None
                    }
                }
            }
        };

        if let Some(line) = chosen {
            merged.push(Emitted::Line(line));
        }
    }

    let terminal_newline = [&base, &target, &source].iter().any(|t| t.ends_with('\n'));

    MergeResult {
        content: join_lines(&merged, input, terminal_newline),
        conflicts,
    }
}

const CONFLICT_SEPARATOR: &str = "=======";

/// One output line; conflict markers carry the side labels at join time.
enum Emitted<'a> {
    Line(&'a str),
    TargetMarker,
    SourceMarker,
}

fn join_lines(lines: &[Emitted<'_>], input: &MergeInput<'_>, terminal_newline: bool) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match line {
            Emitted::Line(text) => out.push_str(text),
            Emitted::TargetMarker => {
                out.push_str("<<<<<<< ");
                out.push_str(input.target_label);
            }
            Emitted::SourceMarker => {
                out.push_str(">>>>>>> ");
                out.push_str(input.source_label);
            }
        }
    }
    if terminal_newline && !lines.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_applies_non_conflicting_source_changes() {
        let merged = merge(
            "alpha\nbeta",
            "alpha\nbeta",
            "alpha\nbeta\nsource-note",
            MergeResolution::Manual,
        );
        assert!(merged.conflicts.is_empty());
        assert_eq!(merged.content, "alpha\nbeta\nsource-note");
    }

    #[test]
    fn test_one_sided_changes_from_both_sides() {
        let merged = merge(
            "one\ntwo\nthree",
            "ONE\ntwo\nthree",
            "one\ntwo\nTHREE",
            MergeResolution::Manual,
        );
        assert!(merged.conflicts.is_empty());
        assert_eq!(merged.content, "ONE\ntwo\nTHREE");
    }

    #[test]
    fn test_convergent_edit_is_not_a_conflict() {
        let merged = merge("a\nb", "a\nsame", "a\nsame", MergeResolution::Manual);
        assert!(merged.conflicts.is_empty());
        assert_eq!(merged.content, "a\nsame");
    }

    #[test]
    fn test_manual_conflict_markers() {
        let merged = merge(
            "alpha\nbeta",
            "alpha\nmain-change",
            "alpha\nfeature-change",
            MergeResolution::Manual,
        );

        assert_eq!(merged.conflicts.len(), 1);
        assert_eq!(
            merged.conflicts[0],
            MergeConflict {
                line: 2,
                base: "beta".into(),
                target: "main-change".into(),
                source: "feature-change".into(),
            }
        );
        assert_eq!(
            merged.content,
            "alpha\n<<<<<<< main\nmain-change\n=======\nfeature-change\n>>>>>>> feature"
        );
    }

    #[test]
    fn test_prefer_source() {
        let merged = merge(
            "alpha\nbeta",
            "alpha\nmain-change",
            "alpha\nfeature-change",
            MergeResolution::PreferSource,
        );
        assert_eq!(merged.conflicts.len(), 1);
        assert_eq!(merged.content, "alpha\nfeature-change");
        assert!(!merged.content.contains("<<<<<<<"));
    }

    #[test]
    fn test_prefer_target() {
        let merged = merge(
            "alpha\nbeta",
            "alpha\nmain-change",
            "alpha\nfeature-change",
            MergeResolution::PreferTarget,
        );
        assert_eq!(merged.conflicts.len(), 1);
        assert_eq!(merged.content, "alpha\nmain-change");
    }

    #[test]
    fn test_empty_base_treats_additions_as_one_sided() {
        let merged = merge("", "", "new text", MergeResolution::Manual);
        assert!(merged.conflicts.is_empty());
        assert_eq!(merged.content, "new text");

        let merged = merge("", "left", "right", MergeResolution::Manual);
        assert_eq!(merged.conflicts.len(), 1);
        assert_eq!(merged.conflicts[0].base, "");
    }

    #[test]
    fn test_terminal_newline_preserved_if_any_side_has_one() {
        let merged = merge("a\n", "a", "a", MergeResolution::Manual);
        assert_eq!(merged.content, "a\n");

        let merged = merge("a", "a", "a", MergeResolution::Manual);
        assert_eq!(merged.content, "a");

        let merged = merge("a\nb\n", "a\nb\n", "a\nb\nc\n", MergeResolution::Manual);
        assert_eq!(merged.content, "a\nb\nc\n");
    }

    #[test]
    fn test_crlf_is_normalized() {
        let merged = merge("a\r\nb", "a\r\nb", "a\r\nc", MergeResolution::Manual);
        assert_eq!(merged.content, "a\nc");
    }

    #[test]
    fn test_lines_deleted_on_both_sides_are_dropped() {
        let merged = merge("a\nb\nc", "a\nb", "a\nb", MergeResolution::Manual);
        assert_eq!(merged.content, "a\nb");
        assert!(merged.conflicts.is_empty());
    }

    #[test]
    fn test_self_merge_is_identity() {
        let text = "# Title\n\nbody line\n";
        for resolution in [
            MergeResolution::Manual,
            MergeResolution::PreferTarget,
            MergeResolution::PreferSource,
        ] {
            let merged = merge("# Title\n\nold body\n", text, text, resolution);
            assert_eq!(merged.content, text);
            assert!(merged.conflicts.is_empty());
        }
    }

    #[test]
    fn test_resolution_serde_names() {
        assert_eq!(
            serde_json::to_string(&MergeResolution::PreferSource).unwrap(),
            "\"prefer-source\""
        );
        let parsed: MergeResolution = serde_json::from_str("\"prefer-target\"").unwrap();
        assert_eq!(parsed, MergeResolution::PreferTarget);
    }
}
