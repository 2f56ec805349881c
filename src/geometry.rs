//! Close-pair rejection.
//!
//! Two reconstructed tracks that run very close to each other inside of the
//! TPC are likely to be a single split track (or two merged ones). We compare
//! the tracks in pseudorapidity and in phi-star: the azimuth of the track at a
//! reference radius, after it has been bent by the solenoid field.

use std::f64::consts::PI;

use crate::config::ClosePairCuts;
use crate::track::Track;

/// converts the field in kG into T and folds in the usual 0.3 factor that
/// relates curvature to momentum (GeV/c, T, m)
const KG_TO_CURVATURE: f64 = 0.1 * 0.3;

/// Azimuth of the track at the transverse radius `radius_m`.
///
/// Returns `None` when the track curls up before it reaches the radius.
pub fn phi_star(track: &Track, magnetic_field_kg: f64, radius_m: f64) -> Option<f64> {
    let arg = KG_TO_CURVATURE * magnetic_field_kg * (track.sign as f64) * radius_m / (2.0 * track.pt);
    if arg.abs() <= 1.0 {
        Some(track.phi - arg.asin())
    } else {
        None
    }
}

/// Wrap an angle difference into `[-π, π)`.
///
/// A non-finite difference comes back as NaN, which never compares as
/// smaller than a threshold.
fn wrap_angle(dphi: f64) -> f64 {
    (dphi + PI).rem_euclid(2.0 * PI) - PI
}

/// Separation between 2 tracks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairSeparation {
    pub delta_eta: f64,
    /// `None` if either track never reaches the reference radius
    pub delta_phi_star: Option<f64>,
}

/// Measures track separations and applies [`ClosePairCuts`].
#[derive(Clone, Debug)]
pub struct PairGeometry {
    cuts: ClosePairCuts,
}

impl PairGeometry {
    pub fn new(cuts: ClosePairCuts) -> Self {
        Self { cuts }
    }

    /// Compute the separation of `a` & `b`; each track is propagated in the
    /// field of its own collision.
    pub fn separation(&self, a: &Track, field_a: f64, b: &Track, field_b: f64) -> PairSeparation {
        let radius = self.cuts.radius_m;
        let delta_phi_star = match (phi_star(a, field_a, radius), phi_star(b, field_b, radius)) {
            (Some(phi_a), Some(phi_b)) => Some(wrap_angle(phi_a - phi_b)),
            _ => None,
        };
        PairSeparation {
            delta_eta: a.eta - b.eta,
            delta_phi_star,
        }
    }

    /// A pair is close when it is closer than the thresholds in both
    /// pseudorapidity and phi-star.
    pub fn is_close_pair(&self, a: &Track, field_a: f64, b: &Track, field_b: f64) -> bool {
        let separation = self.separation(a, field_a, b, field_b);
        let Some(delta_phi_star) = separation.delta_phi_star else {
            return false;
        };
        separation.delta_eta.abs() < self.cuts.min_delta_eta
            && delta_phi_star.abs() < self.cuts.min_delta_phi_star
    }
}
