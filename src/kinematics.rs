//! Pair kinematics: invariant mass, transverse momentum and rapidity of the
//! two-track system.

use core::ops::Add;

use crate::track::Track;

/// Pairs with |y| beyond this value are not recorded.
pub const PAIR_RAPIDITY_LIMIT: f64 = 0.5;

/// A four-momentum `(px, py, pz, E)`, in GeV
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FourMomentum {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub e: f64,
}

impl FourMomentum {
    /// the four-momentum of `track`, assuming that it has the given mass
    pub fn from_track(track: &Track, mass: f64) -> FourMomentum {
        let (px, py, pz) = (track.px(), track.py(), track.pz());
        FourMomentum {
            px,
            py,
            pz,
            e: (px * px + py * py + pz * pz + mass * mass).sqrt(),
        }
    }

    pub fn mass_squared(&self) -> f64 {
        self.e * self.e - (self.px * self.px + self.py * self.py + self.pz * self.pz)
    }

    /// Invariant mass. Round-off can push `mass_squared` slightly below zero
    /// for (nearly) massless systems; we clamp to 0 in that case.
    pub fn mass(&self) -> f64 {
        self.mass_squared().max(0.0).sqrt()
    }

    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    pub fn rapidity(&self) -> f64 {
        0.5 * ((self.e + self.pz) / (self.e - self.pz)).ln()
    }
}

impl Add for FourMomentum {
    type Output = FourMomentum;

    fn add(self, other: FourMomentum) -> FourMomentum {
        FourMomentum {
            px: self.px + other.px,
            py: self.py + other.py,
            pz: self.pz + other.pz,
            e: self.e + other.e,
        }
    }
}

/// The quantities recorded for every accepted pair
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairKinematics {
    pub inv_mass: f64,
    pub pt: f64,
    pub rapidity: f64,
}

/// Combines the tracks of a pair, using the mass of the species that each
/// side was identified as.
#[derive(Clone, Copy, Debug)]
pub struct PairAccumulator {
    mass_first: f64,
    mass_second: f64,
}

impl PairAccumulator {
    pub fn new(mass_first: f64, mass_second: f64) -> Self {
        Self {
            mass_first,
            mass_second,
        }
    }

    /// Returns `None` when the pair lies outside of the rapidity acceptance.
    pub fn combine(&self, first: &Track, second: &Track) -> Option<PairKinematics> {
        let sum = FourMomentum::from_track(first, self.mass_first)
            + FourMomentum::from_track(second, self.mass_second);
        let rapidity = sum.rapidity();
        if !(rapidity.abs() <= PAIR_RAPIDITY_LIMIT) {
            return None;
        }
        Some(PairKinematics {
            inv_mass: sum.mass(),
            pt: sum.pt(),
            rapidity,
        })
    }
}
