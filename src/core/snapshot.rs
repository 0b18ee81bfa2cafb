//! Generation-tagged holder for the published prayer set.

use std::sync::{Arc, RwLock};

use crate::prayer::DailyPrayerSet;

/// The current [`DailyPrayerSet`], shared between the coordinator and
/// anything that wants to read it.
///
/// Every calculation is tagged with the generation of the request that
/// started it. Publishing refuses a generation older than the stored one,
/// so a slow calculation for an outdated request cannot overwrite a newer
/// result. Readers get an `Arc` and always see a complete set.
#[derive(Debug, Default)]
pub struct PrayerSetCell {
    slot: RwLock<Option<(u64, Arc<DailyPrayerSet>)>>,
}

impl PrayerSetCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `set` unless a newer generation is already published.
    /// Returns whether the set was accepted.
    pub fn publish(&self, generation: u64, set: Arc<DailyPrayerSet>) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        if let Some((stored, _)) = slot.as_ref()
            && *stored > generation
        {
            return false;
        }
        *slot = Some((generation, set));
        true
    }

    pub fn current(&self) -> Option<Arc<DailyPrayerSet>> {
        self.read().map(|(_, set)| set)
    }

    pub fn generation(&self) -> Option<u64> {
        self.read().map(|(generation, _)| generation)
    }

    /// Forget the published set, e.g. when the location is removed.
    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn read(&self) -> Option<(u64, Arc<DailyPrayerSet>)> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|(generation, set)| (*generation, Arc::clone(set)))
    }
}
