//! Line-based three-way merge.
//!
//! The engine is a pure function of its inputs. Previews capture the heads
//! they were computed against so that applying a preview can detect that the
//! target branch moved in the meantime.

mod engine;
mod metrics;
mod preview;

pub use engine::{merge_three_way, MergeConflict, MergeInput, MergeResolution, MergeResult};
pub use metrics::{count_line_changes, summarize_merge, MergeSummary};
pub use preview::MergePreview;
