use crate::audit::types::ForkRecord;

/// Most recently active forks first, then the most starred. Forks without a
/// timestamp go last; exact ties keep their retrieval order.
pub fn rank(mut records: Vec<ForkRecord>) -> Vec<ForkRecord> {
    // Option orders None below Some, so a descending compare puts None last.
    records.sort_by(|a, b| {
        b.last_push_timestamp
            .cmp(&a.last_push_timestamp)
            .then_with(|| b.stargazer_count.cmp(&a.stargazer_count))
    });
    records
}
