use crate::state::AggregatedState;

/// Whether `new` differs from the last rendered snapshot. No previous
/// snapshot always counts as a change.
pub fn has_changed(prev: Option<&AggregatedState>, new: &AggregatedState) -> bool {
    prev != Some(new)
}

/// Holds only the last observed snapshot, for comparison against the next.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<AggregatedState>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare against the previous snapshot, then keep `new` as the previous.
    pub fn observe(&mut self, new: &AggregatedState) -> bool {
        let changed = has_changed(self.last.as_ref(), new);
        if changed {
            self.last = Some(new.clone());
        }
        changed
    }

    /// Forget the previous snapshot so the next observation reports a change.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
