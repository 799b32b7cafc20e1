use crate::record::ActivityRecord;

/// Concatenate per-component batches into one timeline ordered by `time`.
///
/// The sort is stable: records sharing a timestamp keep their input order.
pub fn merge<I, L>(lists: I) -> Vec<ActivityRecord>
where
    I: IntoIterator<Item = L>,
    L: IntoIterator<Item = ActivityRecord>,
{
    let mut merged: Vec<ActivityRecord> = lists.into_iter().flatten().collect();
    merged.sort_by(|a, b| a.time.total_cmp(&b.time));
    merged
}

/// The newest `cap` records of an ascending timeline, newest first.
pub fn most_recent_first(timeline: &[ActivityRecord], cap: usize) -> Vec<&ActivityRecord> {
    timeline.iter().rev().take(cap).collect()
}
