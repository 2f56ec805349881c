//! Records handed over by the ingestion boundary, and the batch arena that
//! owns them while they are being mixed.
//!
//! Everything inside of the mixing machinery refers to tracks & collisions
//! through [`TrackIdx`] and [`EventIdx`]: plain indices into the arrays owned
//! by a [`Batch`]. These indices are only meaningful for the lifetime of the
//! batch they came from.

use std::collections::HashMap;

use crate::Error;
use crate::species::NSigma;

/// Index of a track within a [`Batch`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackIdx(pub usize);

/// Index of a collision within a [`Batch`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventIdx(pub usize);

/// A reconstructed charged-particle track.
///
/// Kinematics are in GeV/c (momenta) & radians (angles), the impact
/// parameters are in cm. The track refers to its collision through the
/// collision's id (`event_id`) rather than by holding onto it.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub event_id: i64,
    pub sign: i8,
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    /// total momentum
    pub p: f64,
    pub tpc_nsigma: NSigma,
    pub tof_nsigma: NSigma,
    pub tpc_clusters_found: u16,
    pub tpc_clusters_shared: u16,
    pub tpc_chi2_per_cluster: f64,
    pub tpc_crossed_rows_over_findable: f64,
    pub its_clusters: u8,
    pub its_chi2_per_cluster: f64,
    pub dca_xy: f64,
    pub dca_z: f64,
}

impl Track {
    /// Create a track from its transverse momentum, pseudorapidity and
    /// azimuth.
    ///
    /// The total momentum is derived from `pt` & `eta`. The detector
    /// observables are zero-initialized; callers overwrite the fields they
    /// actually have.
    pub fn from_pt_eta_phi(event_id: i64, sign: i8, pt: f64, eta: f64, phi: f64) -> Track {
        Track {
            event_id,
            sign,
            pt,
            eta,
            phi,
            p: pt * eta.cosh(),
            tpc_nsigma: NSigma::default(),
            tof_nsigma: NSigma::default(),
            tpc_clusters_found: 0,
            tpc_clusters_shared: 0,
            tpc_chi2_per_cluster: 0.0,
            tpc_crossed_rows_over_findable: 0.0,
            its_clusters: 0,
            its_chi2_per_cluster: 0.0,
            dca_xy: 0.0,
            dca_z: 0.0,
        }
    }

    #[inline]
    pub fn px(&self) -> f64 {
        self.pt * self.phi.cos()
    }

    #[inline]
    pub fn py(&self) -> f64 {
        self.pt * self.phi.sin()
    }

    #[inline]
    pub fn pz(&self) -> f64 {
        self.pt * self.eta.sinh()
    }

    /// rapidity of the track under the assumption that it has the given mass
    pub fn rapidity(&self, mass: f64) -> f64 {
        let pz = self.pz();
        let energy = (self.p * self.p + mass * mass).sqrt();
        0.5 * ((energy + pz) / (energy - pz)).ln()
    }
}

/// A single collision (what the rest of the crate calls an "event").
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub id: i64,
    /// longitudinal position of the primary vertex (cm)
    pub vertex_z: f64,
    /// multiplicity estimate used for mixing-bin assignment
    pub multiplicity: f64,
    /// multiplicity percentile, used for event selection
    pub mult_percentile: f64,
    /// solenoid field in kG (the sign encodes the polarity)
    pub magnetic_field: f64,
}

impl Event {
    pub fn new(id: i64, vertex_z: f64, multiplicity: f64) -> Event {
        Event {
            id,
            vertex_z,
            multiplicity,
            mult_percentile: 0.0,
            magnetic_field: 0.0,
        }
    }

    pub fn with_magnetic_field(mut self, magnetic_field: f64) -> Event {
        self.magnetic_field = magnetic_field;
        self
    }

    pub fn with_mult_percentile(mut self, mult_percentile: f64) -> Event {
        self.mult_percentile = mult_percentile;
        self
    }
}

/// Owns the collisions & tracks of one processing batch.
///
/// Construction resolves every track's `event_id` to an [`EventIdx`], so
/// the mixing machinery never has to deal with a dangling reference.
#[derive(Clone, Debug)]
pub struct Batch {
    events: Vec<Event>,
    tracks: Vec<Track>,
    // owner_of[i] is the index of the event that owns tracks[i]
    owner_of: Vec<EventIdx>,
}

impl Batch {
    pub fn new(events: Vec<Event>, tracks: Vec<Track>) -> Result<Batch, Error> {
        let mut index_of_id: HashMap<i64, EventIdx> = HashMap::with_capacity(events.len());
        for (i, event) in events.iter().enumerate() {
            if index_of_id.insert(event.id, EventIdx(i)).is_some() {
                return Err(Error::duplicate_event(event.id));
            }
        }

        let owner_of = tracks
            .iter()
            .enumerate()
            .map(|(i, track)| {
                index_of_id
                    .get(&track.event_id)
                    .copied()
                    .ok_or_else(|| Error::unknown_event(i, track.event_id))
            })
            .collect::<Result<Vec<EventIdx>, Error>>()?;

        Ok(Batch {
            events,
            tracks,
            owner_of,
        })
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn n_events(&self) -> usize {
        self.events.len()
    }

    pub fn n_tracks(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn event(&self, idx: EventIdx) -> &Event {
        &self.events[idx.0]
    }

    #[inline]
    pub fn track(&self, idx: TrackIdx) -> &Track {
        &self.tracks[idx.0]
    }

    /// index of the collision that owns the track
    #[inline]
    pub fn owner_of(&self, idx: TrackIdx) -> EventIdx {
        self.owner_of[idx.0]
    }
}
