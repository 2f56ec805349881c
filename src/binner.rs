//! Per-batch bookkeeping: which tracks were selected for each collision, and
//! which collisions share a mixing bin.
//!
//! Neither structure owns any track or collision data. They only hold
//! [`EventIdx`]/[`TrackIdx`] values that point into the current [`Batch`],
//! and they must be cleared before the next batch starts.

use std::collections::{BTreeMap, HashMap};

use crate::config::{MixingBinWidths, PairingMode};
use crate::track::{Batch, Event, EventIdx, TrackIdx};

/// The tracks of each collision that were selected for one side of the pair.
///
/// Tracks are stored in the order in which they were selected.
#[derive(Clone, Debug, Default)]
pub struct SelectedTracks {
    per_event: HashMap<EventIdx, Vec<TrackIdx>>,
}

impl SelectedTracks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EventIdx, track: TrackIdx) {
        self.per_event.entry(event).or_default().push(track);
    }

    /// the selected tracks of `event` (empty if there are none)
    pub fn get(&self, event: EventIdx) -> &[TrackIdx] {
        self.per_event.get(&event).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_tracks(&self, event: EventIdx) -> bool {
        self.per_event.get(&event).is_some_and(|v| !v.is_empty())
    }

    /// total number of selected tracks
    pub fn n_tracks(&self) -> usize {
        self.per_event.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.per_event.is_empty()
    }

    pub fn clear(&mut self) {
        self.per_event.clear();
    }
}

/// Identifies the mixing bin of a collision.
///
/// The vertex index is `round(vertex_z / width)`, the multiplicity index is
/// `floor(multiplicity / width)`. Collisions with equal keys are considered
/// compatible for mixing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MixingBinKey {
    pub vertex: i64,
    pub multiplicity: i64,
}

impl MixingBinKey {
    pub fn of(event: &Event, widths: &MixingBinWidths) -> MixingBinKey {
        MixingBinKey {
            vertex: (event.vertex_z / widths.vertex_z).round() as i64,
            multiplicity: (event.multiplicity / widths.multiplicity).floor() as i64,
        }
    }
}

/// Groups the collisions of a batch into mixing bins.
///
/// Bins are visited in key order; within a bin, collisions keep the order in
/// which they appear in the batch.
#[derive(Clone, Debug)]
pub struct EventBinner {
    widths: MixingBinWidths,
    bins: BTreeMap<MixingBinKey, Vec<EventIdx>>,
}

impl EventBinner {
    pub fn new(widths: MixingBinWidths) -> Self {
        Self {
            widths,
            bins: BTreeMap::new(),
        }
    }

    /// Assign every collision that can contribute to a pair to its bin.
    ///
    /// In identical mode, a collision needs at least one first-particle
    /// track. Otherwise, a track of either kind suffices, since the collision
    /// may still provide one side of a mixed-event pair. Returns the number
    /// of collisions that were binned.
    pub fn assign(
        &mut self,
        batch: &Batch,
        first: &SelectedTracks,
        second: &SelectedTracks,
        mode: PairingMode,
    ) -> usize {
        let mut n_binned = 0;
        for (i, event) in batch.events().iter().enumerate() {
            let idx = EventIdx(i);
            let qualifies = match mode {
                PairingMode::Identical => first.has_tracks(idx),
                PairingMode::NonIdentical => first.has_tracks(idx) || second.has_tracks(idx),
            };
            if qualifies {
                self.bins
                    .entry(MixingBinKey::of(event, &self.widths))
                    .or_default()
                    .push(idx);
                n_binned += 1;
            }
        }
        n_binned
    }

    pub fn bins(&self) -> impl Iterator<Item = (&MixingBinKey, &[EventIdx])> {
        self.bins.iter().map(|(key, events)| (key, events.as_slice()))
    }

    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn clear(&mut self) {
        self.bins.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Track;

    fn widths() -> MixingBinWidths {
        MixingBinWidths {
            vertex_z: 2.0,
            multiplicity: 50.0,
        }
    }

    #[test]
    fn bin_key() {
        let key = |vz, mult| MixingBinKey::of(&Event::new(0, vz, mult), &widths());
        // vertex: rounding, halves away from zero
        assert_eq!(key(0.9, 0.0).vertex, 0);
        assert_eq!(key(1.0, 0.0).vertex, 1);
        assert_eq!(key(-1.0, 0.0).vertex, -1);
        assert_eq!(key(-0.99, 0.0).vertex, 0);
        // multiplicity: flooring
        assert_eq!(key(0.0, 49.9).multiplicity, 0);
        assert_eq!(key(0.0, 50.0).multiplicity, 1);
        assert_eq!(key(0.0, -0.1).multiplicity, -1);

        assert_eq!(key(0.3, 10.0), key(-0.7, 45.0));
        assert_ne!(key(0.3, 10.0), key(0.3, 55.0));
    }

    #[test]
    fn selected_tracks() {
        let mut selected = SelectedTracks::new();
        assert!(selected.is_empty());
        assert!(selected.get(EventIdx(3)).is_empty());
        selected.push(EventIdx(3), TrackIdx(7));
        selected.push(EventIdx(3), TrackIdx(2));
        selected.push(EventIdx(0), TrackIdx(1));
        assert_eq!(selected.get(EventIdx(3)), &[TrackIdx(7), TrackIdx(2)]);
        assert!(selected.has_tracks(EventIdx(0)));
        assert!(!selected.has_tracks(EventIdx(1)));
        assert_eq!(selected.n_tracks(), 3);
        selected.clear();
        assert!(selected.is_empty());
    }

    #[test]
    fn assign_respects_pairing_mode() {
        let events = vec![
            Event::new(100, 0.1, 10.0),
            Event::new(101, 0.2, 20.0),
            Event::new(102, 5.0, 20.0),
            Event::new(103, 0.3, 30.0),
        ];
        let tracks = vec![Track::from_pt_eta_phi(100, 1, 1.0, 0.0, 0.0); 4];
        let batch = Batch::new(events, tracks).unwrap();

        let mut first = SelectedTracks::new();
        let mut second = SelectedTracks::new();
        first.push(EventIdx(0), TrackIdx(0));
        first.push(EventIdx(2), TrackIdx(1));
        second.push(EventIdx(3), TrackIdx(2));

        let mut binner = EventBinner::new(widths());
        assert_eq!(
            binner.assign(&batch, &first, &second, PairingMode::Identical),
            2
        );
        assert_eq!(binner.n_bins(), 2);
        binner.clear();
        assert!(binner.is_empty());

        assert_eq!(
            binner.assign(&batch, &first, &second, PairingMode::NonIdentical),
            3
        );
        let bins: Vec<_> = binner.bins().collect();
        assert_eq!(bins.len(), 2);
        // events 0 & 3 share a bin and keep the batch order
        assert_eq!(bins[0].1, &[EventIdx(0), EventIdx(3)]);
        assert_eq!(bins[1].1, &[EventIdx(2)]);
    }
}
