//! Aggregate counters.
//!
//! Rejections are never reported individually; these counters are the only
//! place where they show up.

use core::ops::AddAssign;

use crate::sink::PairScope;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MixingStats {
    pub batches: u64,
    pub tracks_seen: u64,
    pub tracks_passing_quality: u64,
    pub selected_first: u64,
    pub selected_second: u64,
    pub events_binned: u64,
    pub se_candidates: u64,
    pub se_accepted: u64,
    pub me_candidates: u64,
    pub me_accepted: u64,
    pub close_pairs_rejected: u64,
    pub rapidity_rejected: u64,
}

impl MixingStats {
    pub fn candidates(&self, scope: PairScope) -> u64 {
        match scope {
            PairScope::SameEvent => self.se_candidates,
            PairScope::MixedEvent => self.me_candidates,
        }
    }

    pub fn accepted(&self, scope: PairScope) -> u64 {
        match scope {
            PairScope::SameEvent => self.se_accepted,
            PairScope::MixedEvent => self.me_accepted,
        }
    }

    pub(crate) fn count_candidate(&mut self, scope: PairScope) {
        match scope {
            PairScope::SameEvent => self.se_candidates += 1,
            PairScope::MixedEvent => self.me_candidates += 1,
        }
    }

    pub(crate) fn count_accepted(&mut self, scope: PairScope) {
        match scope {
            PairScope::SameEvent => self.se_accepted += 1,
            PairScope::MixedEvent => self.me_accepted += 1,
        }
    }

    /// merge the counts tracked by `other` into `self`
    pub fn merge(&mut self, other: &MixingStats) {
        self.batches += other.batches;
        self.tracks_seen += other.tracks_seen;
        self.tracks_passing_quality += other.tracks_passing_quality;
        self.selected_first += other.selected_first;
        self.selected_second += other.selected_second;
        self.events_binned += other.events_binned;
        self.se_candidates += other.se_candidates;
        self.se_accepted += other.se_accepted;
        self.me_candidates += other.me_candidates;
        self.me_accepted += other.me_accepted;
        self.close_pairs_rejected += other.close_pairs_rejected;
        self.rapidity_rejected += other.rapidity_rejected;
    }
}

impl AddAssign<&MixingStats> for MixingStats {
    fn add_assign(&mut self, other: &MixingStats) {
        self.merge(other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge() {
        let mut stats = MixingStats::default();
        stats.count_candidate(PairScope::SameEvent);
        stats.count_candidate(PairScope::SameEvent);
        stats.count_accepted(PairScope::SameEvent);
        stats.count_candidate(PairScope::MixedEvent);

        let mut other = MixingStats::default();
        other.count_candidate(PairScope::MixedEvent);
        other.count_accepted(PairScope::MixedEvent);
        other.close_pairs_rejected = 4;

        stats += &other;
        assert_eq!(stats.candidates(PairScope::SameEvent), 2);
        assert_eq!(stats.accepted(PairScope::SameEvent), 1);
        assert_eq!(stats.candidates(PairScope::MixedEvent), 2);
        assert_eq!(stats.accepted(PairScope::MixedEvent), 1);
        assert_eq!(stats.close_pairs_rejected, 4);
    }
}
