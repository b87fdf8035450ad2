use crate::audit::types::{ComparisonResult, NotableDiff};

/// Files whose change count strictly exceeds `threshold`, in the order the
/// comparison lists them.
pub fn notable_diffs(result: &ComparisonResult, threshold: u64) -> Vec<NotableDiff> {
    result
        .files
        .iter()
        .filter(|f| f.change_count > threshold)
        .map(|f| NotableDiff {
            filename: f.filename.clone(),
            change_count: f.change_count,
        })
        .collect()
}
