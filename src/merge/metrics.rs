//! Line-delta metrics for merge previews.

use serde::{Deserialize, Serialize};

fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect()
}

/// Number of positions at which `before` and `after` differ line-wise.
pub fn count_line_changes(before: &str, after: &str) -> usize {
    let before = split_lines(before);
    let after = split_lines(after);
    let max = before.len().max(after.len());

    (0..max)
        .filter(|&i| before.get(i).unwrap_or(&"") != after.get(i).unwrap_or(&""))
        .count()
}

/// Size and delta summary shown next to a merge preview.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub target_lines: usize,
    pub source_lines: usize,
    pub merged_lines: usize,
    pub changed_from_target: usize,
    pub changed_from_source: usize,
    pub conflicts: usize,
}

/// Summarize how far a merged text is from each side.
pub fn summarize_merge(target: &str, source: &str, merged: &str, conflicts: usize) -> MergeSummary {
    MergeSummary {
        target_lines: split_lines(target).len(),
        source_lines: split_lines(source).len(),
        merged_lines: split_lines(merged).len(),
        changed_from_target: count_line_changes(target, merged),
        changed_from_source: count_line_changes(source, merged),
        conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_changed_lines_by_position() {
        let before = ["alpha", "beta", "gamma"].join("\n");
        let after = ["alpha", "beta2", "gamma", "delta"].join("\n");
        assert_eq!(count_line_changes(&before, &after), 2);
        assert_eq!(count_line_changes(&before, &before), 0);
    }

    #[test]
    fn test_summarizes_merge_sizes_and_deltas() {
        let target = ["one", "two", "three"].join("\n");
        let source = ["one", "TWO", "three", "four"].join("\n");
        let merged = source.clone();

        assert_eq!(
            summarize_merge(&target, &source, &merged, 1),
            MergeSummary {
                target_lines: 3,
                source_lines: 4,
                merged_lines: 4,
                changed_from_target: 2,
                changed_from_source: 0,
                conflicts: 1,
            }
        );
    }
}
