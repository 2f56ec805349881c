//! Particle identification for one side of the pair.

use crate::config::{RejectionSelection, SpeciesSelection};
use crate::species::Species;
use crate::track::Track;

/// Which detector response a PID decision is based on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PidRegime {
    /// only the TPC response is used
    Tpc,
    /// only the TOF response is used
    Tof,
}

/// Decides whether a track is consistent with a configured species.
#[derive(Clone, Debug)]
pub struct SpeciesIdentifier {
    selection: SpeciesSelection,
    reject: Option<RejectionSelection>,
}

impl SpeciesIdentifier {
    pub fn new(selection: SpeciesSelection) -> Self {
        Self {
            selection,
            reject: None,
        }
    }

    /// Build an identifier that additionally vetoes tracks resembling the
    /// species in `reject` (only meant for the second particle of a
    /// non-identical pair).
    pub fn with_rejection(selection: SpeciesSelection, reject: Option<RejectionSelection>) -> Self {
        Self { selection, reject }
    }

    pub fn species(&self) -> Species {
        self.selection.species
    }

    pub fn selection(&self) -> &SpeciesSelection {
        &self.selection
    }

    /// The regime is picked from the total momentum. A momentum that exactly
    /// equals the threshold is handled by the TOF.
    #[inline]
    pub fn regime(&self, momentum: f64) -> PidRegime {
        if momentum < self.selection.pid_momentum_threshold {
            PidRegime::Tpc
        } else {
            PidRegime::Tof
        }
    }

    /// Returns whether the detector response is consistent with the species.
    ///
    /// This ignores the charge, the rejection species and the rapidity; see
    /// [`Self::accepts`] for the full decision.
    pub fn pid_accepts(&self, track: &Track) -> bool {
        let species = self.selection.species;
        match self.regime(track.p) {
            PidRegime::Tpc => self
                .selection
                .tpc_nsigma
                .contains(track.tpc_nsigma.get(species)),
            PidRegime::Tof => self
                .selection
                .tof_nsigma
                .contains(track.tof_nsigma.get(species)),
        }
    }

    /// Returns `true` when the track looks like the rejected species
    fn is_vetoed(&self, track: &Track) -> bool {
        self.reject.is_some_and(|reject| {
            reject
                .tof_nsigma
                .contains(track.tof_nsigma.get(reject.species))
        })
    }

    /// rapidity of the track, assuming the mass of the target species
    #[inline]
    pub fn rapidity(&self, track: &Track) -> f64 {
        track.rapidity(self.selection.species.mass())
    }

    /// The complete decision: charge, rejection species, PID window and
    /// rapidity acceptance.
    pub fn accepts(&self, track: &Track) -> bool {
        if track.sign != self.selection.sign {
            return false;
        }
        if self.is_vetoed(track) {
            return false;
        }
        if !self.pid_accepts(track) {
            return false;
        }
        self.rapidity(track).abs() <= self.selection.max_abs_rapidity
    }
}
