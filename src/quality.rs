//! Per-track and per-collision acceptance.
//!
//! These predicates are evaluated for every track of every collision, so each
//! check returns as soon as it fails.

use crate::config::{EventCuts, TrackQualityCuts};
use crate::track::{Event, Track};

/// Applies [`TrackQualityCuts`] to individual tracks.
#[derive(Clone, Debug)]
pub struct TrackQualityFilter {
    cuts: TrackQualityCuts,
}

impl TrackQualityFilter {
    pub fn new(cuts: TrackQualityCuts) -> Self {
        Self { cuts }
    }

    pub fn cuts(&self) -> &TrackQualityCuts {
        &self.cuts
    }

    /// Returns whether the track passes every quality cut.
    pub fn accepts(&self, track: &Track) -> bool {
        let cuts = &self.cuts;

        // kinematic preselection
        if !cuts.momentum.contains_open(track.p) {
            return false;
        }
        if !(track.eta.abs() < cuts.max_abs_eta) {
            return false;
        }

        // TPC
        if track.tpc_clusters_found < cuts.min_tpc_clusters_found {
            return false;
        }
        if track.tpc_clusters_shared > cuts.max_tpc_clusters_shared {
            return false;
        }
        if !(track.tpc_chi2_per_cluster <= cuts.max_tpc_chi2_per_cluster) {
            return false;
        }
        if !(track.tpc_crossed_rows_over_findable >= cuts.min_tpc_crossed_rows_over_findable) {
            return false;
        }

        // ITS
        if track.its_clusters < cuts.min_its_clusters {
            return false;
        }
        if !(track.its_chi2_per_cluster <= cuts.max_its_chi2_per_cluster) {
            return false;
        }

        cuts.dca_xy.accepts(track.dca_xy) && cuts.dca_z.accepts(track.dca_z)
    }
}

/// Applies [`EventCuts`] to collisions.
#[derive(Clone, Debug)]
pub struct EventFilter {
    cuts: EventCuts,
}

impl EventFilter {
    pub fn new(cuts: EventCuts) -> Self {
        Self { cuts }
    }

    pub fn accepts(&self, event: &Event) -> bool {
        event.vertex_z.abs() < self.cuts.max_abs_vertex_z
            && self.cuts.mult_percentile.contains(event.mult_percentile)
    }
}
