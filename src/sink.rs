//! Recording sinks.
//!
//! The mixing engine reports accepted pairs (and the tracks that it selected)
//! to a [`PairSink`]. It never reads anything back from the sink.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::Error;
use crate::bins::{BinEdgeSpec, BinEdges, RegularBinEdges};
use crate::kinematics::PairKinematics;
use crate::species::{Role, Species};
use crate::track::TrackIdx;

/// Whether the 2 tracks of a pair come from the same collision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PairScope {
    SameEvent,
    MixedEvent,
}

impl PairScope {
    fn index(&self) -> usize {
        match self {
            PairScope::SameEvent => 0,
            PairScope::MixedEvent => 1,
        }
    }
}

/// An accepted pair.
///
/// The collision ids are stable; the track indices are only meaningful
/// while the batch that produced the pair is alive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairRecord {
    pub scope: PairScope,
    pub first_event: i64,
    pub second_event: i64,
    pub first_track: TrackIdx,
    pub second_track: TrackIdx,
    pub kinematics: PairKinematics,
}

/// Monitoring information about a selected track
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackRecord {
    pub role: Role,
    pub species: Species,
    pub event_id: i64,
    pub p: f64,
    pub pt: f64,
    pub eta: f64,
    pub dca_xy: f64,
    /// TPC response under the hypothesis of `species`
    pub tpc_nsigma: f64,
    /// TOF response under the hypothesis of `species`
    pub tof_nsigma: f64,
    /// rapidity computed with the mass of `species`
    pub rapidity: f64,
}

/// Write-only destination for the output of the mixing engine.
pub trait PairSink {
    fn record_pair(&mut self, pair: &PairRecord);

    /// Called for every track selected for either side of the pair. The
    /// default implementation ignores the track.
    fn record_track(&mut self, _track: &TrackRecord) {}
}

impl<S: PairSink + ?Sized> PairSink for &mut S {
    fn record_pair(&mut self, pair: &PairRecord) {
        (**self).record_pair(pair)
    }

    fn record_track(&mut self, track: &TrackRecord) {
        (**self).record_track(track)
    }
}

/// Keeps every record in memory. Mostly useful for testing & debugging.
#[derive(Clone, Debug, Default)]
pub struct PairCollector {
    pub pairs: Vec<PairRecord>,
    pub tracks: Vec<TrackRecord>,
}

impl PairCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_scope(&self, scope: PairScope) -> impl Iterator<Item = &PairRecord> {
        self.pairs.iter().filter(move |pair| pair.scope == scope)
    }

    pub fn n_pairs(&self, scope: PairScope) -> usize {
        self.in_scope(scope).count()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
        self.tracks.clear();
    }
}

impl PairSink for PairCollector {
    fn record_pair(&mut self, pair: &PairRecord) {
        self.pairs.push(*pair);
    }

    fn record_track(&mut self, track: &TrackRecord) {
        self.tracks.push(*track);
    }
}

/// axis of the detector-response histograms (in units of sigma, and for the
/// track rapidity)
const RESPONSE_AXIS: RegularBinEdges = RegularBinEdges::fixed(-10.0, 10.0, 100);

/// default axis of the DCA-xy histograms (in cm)
const DCA_XY_AXIS: RegularBinEdges = RegularBinEdges::fixed(-0.5, 0.5, 100);

/// Monitoring histograms of the tracks selected for one side of the pair.
///
/// Axis 0 of every 2D histogram is the pt axis of the sink. It is filled
/// with the transverse momentum for `dca_xy` & `eta`, and with the total
/// momentum for the others.
#[derive(Clone, Debug)]
struct TrackHistograms {
    momentum: Array1<f64>,
    dca_xy: Array2<f64>,
    eta: Array2<f64>,
    tpc_nsigma: Array2<f64>,
    tof_nsigma: Array2<f64>,
    rapidity: Array2<f64>,
}

impl TrackHistograms {
    fn new(n_pt: usize, n_dca: usize) -> Self {
        let n_response = RESPONSE_AXIS.n_bins();
        TrackHistograms {
            momentum: Array1::zeros(n_pt),
            dca_xy: Array2::zeros((n_pt, n_dca)),
            eta: Array2::zeros((n_pt, n_response)),
            tpc_nsigma: Array2::zeros((n_pt, n_response)),
            tof_nsigma: Array2::zeros((n_pt, n_response)),
            rapidity: Array2::zeros((n_pt, n_response)),
        }
    }

    fn reset(&mut self) {
        self.momentum.fill(0.0);
        for h in [
            &mut self.dca_xy,
            &mut self.eta,
            &mut self.tpc_nsigma,
            &mut self.tof_nsigma,
            &mut self.rapidity,
        ] {
            h.fill(0.0);
        }
    }

    fn add(&mut self, other: &TrackHistograms) {
        self.momentum += &other.momentum;
        self.dca_xy += &other.dca_xy;
        self.eta += &other.eta;
        self.tpc_nsigma += &other.tpc_nsigma;
        self.tof_nsigma += &other.tof_nsigma;
        self.rapidity += &other.rapidity;
    }
}

fn fill_2d(hist: &mut Array2<f64>, bin_x: Option<usize>, bin_y: Option<usize>) {
    if let (Some(x), Some(y)) = (bin_x, bin_y) {
        hist[[x, y]] += 1.0;
    }
}

/// A detector-response histogram of the selected tracks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackHistogram {
    /// DCA-xy vs pt
    DcaXy,
    /// pseudorapidity vs pt
    Eta,
    /// TPC response (for the species of the role) vs p
    TpcNSigma,
    /// TOF response (for the species of the role) vs p
    TofNSigma,
    /// rapidity (under the mass of the species of the role) vs p
    Rapidity,
}

/// Fills invariant-mass histograms (and mass-vs-pt histograms) separately for
/// same-event and mixed-event pairs.
///
/// For each side of the pair, it also histograms the selected tracks: the
/// total momentum (on the pt axis) and the 2D histograms listed by
/// [`TrackHistogram`]. The response histograms span `[-10, 10)` in 100 bins;
/// the DCA-xy axis defaults to `[-0.5, 0.5)` cm in 100 bins.
///
/// Values that fall outside of the axes are dropped.
#[derive(Clone, Debug)]
pub struct HistogramSink {
    mass_edges: BinEdgeSpec,
    pt_edges: BinEdgeSpec,
    dca_edges: BinEdgeSpec,
    // indexed by PairScope::index
    mass: [Array1<f64>; 2],
    mass_vs_pt: [Array2<f64>; 2],
    // indexed by role
    tracks: [TrackHistograms; 2],
}

fn role_index(role: Role) -> usize {
    match role {
        Role::First => 0,
        Role::Second => 1,
    }
}

impl HistogramSink {
    pub fn new(mass_edges: impl Into<BinEdgeSpec>, pt_edges: impl Into<BinEdgeSpec>) -> Self {
        let mass_edges = mass_edges.into();
        let pt_edges = pt_edges.into();
        let dca_edges = BinEdgeSpec::from(DCA_XY_AXIS);
        let (n_mass, n_pt, n_dca) = (mass_edges.n_bins(), pt_edges.n_bins(), dca_edges.n_bins());
        Self {
            mass: [Array1::zeros(n_mass), Array1::zeros(n_mass)],
            mass_vs_pt: [
                Array2::zeros((n_mass, n_pt)),
                Array2::zeros((n_mass, n_pt)),
            ],
            tracks: [
                TrackHistograms::new(n_pt, n_dca),
                TrackHistograms::new(n_pt, n_dca),
            ],
            mass_edges,
            pt_edges,
            dca_edges,
        }
    }

    /// Replace the DCA-xy axis. This discards the contents of the DCA-xy
    /// histograms.
    pub fn with_dca_axis(mut self, dca_edges: impl Into<BinEdgeSpec>) -> Self {
        self.dca_edges = dca_edges.into();
        let shape = (self.pt_edges.n_bins(), self.dca_edges.n_bins());
        for hists in self.tracks.iter_mut() {
            hists.dca_xy = Array2::zeros(shape);
        }
        self
    }

    pub fn mass(&self, scope: PairScope) -> ArrayView1<'_, f64> {
        self.mass[scope.index()].view()
    }

    /// axis 0 is the invariant mass, axis 1 is the pair pt
    pub fn mass_vs_pt(&self, scope: PairScope) -> ArrayView2<'_, f64> {
        self.mass_vs_pt[scope.index()].view()
    }

    pub fn momentum(&self, role: Role) -> ArrayView1<'_, f64> {
        self.tracks[role_index(role)].momentum.view()
    }

    /// axis 0 is the momentum (see [`TrackHistogram`]), axis 1 is the
    /// quantity itself
    pub fn track_histogram(&self, role: Role, which: TrackHistogram) -> ArrayView2<'_, f64> {
        let hists = &self.tracks[role_index(role)];
        match which {
            TrackHistogram::DcaXy => hists.dca_xy.view(),
            TrackHistogram::Eta => hists.eta.view(),
            TrackHistogram::TpcNSigma => hists.tpc_nsigma.view(),
            TrackHistogram::TofNSigma => hists.tof_nsigma.view(),
            TrackHistogram::Rapidity => hists.rapidity.view(),
        }
    }

    pub fn reset(&mut self) {
        self.mass.iter_mut().for_each(|h| h.fill(0.0));
        self.mass_vs_pt.iter_mut().for_each(|h| h.fill(0.0));
        self.tracks.iter_mut().for_each(TrackHistograms::reset);
    }

    /// add the contents of `other` to `self`
    pub fn merge(&mut self, other: &HistogramSink) -> Result<(), Error> {
        if self.mass_edges != other.mass_edges
            || self.pt_edges != other.pt_edges
            || self.dca_edges != other.dca_edges
        {
            return Err(Error::bin_edge(
                "histogram sink",
                "can't merge histograms with different bin edges",
            ));
        }
        for i in 0..2 {
            self.mass[i] += &other.mass[i];
            self.mass_vs_pt[i] += &other.mass_vs_pt[i];
            self.tracks[i].add(&other.tracks[i]);
        }
        Ok(())
    }
}

impl PairSink for HistogramSink {
    fn record_pair(&mut self, pair: &PairRecord) {
        let scope = pair.scope.index();
        let Some(mass_bin) = self.mass_edges.bin_index(pair.kinematics.inv_mass) else {
            return;
        };
        self.mass[scope][mass_bin] += 1.0;
        if let Some(pt_bin) = self.pt_edges.bin_index(pair.kinematics.pt) {
            self.mass_vs_pt[scope][[mass_bin, pt_bin]] += 1.0;
        }
    }

    fn record_track(&mut self, track: &TrackRecord) {
        let p_bin = self.pt_edges.bin_index(track.p);
        let pt_bin = self.pt_edges.bin_index(track.pt);
        let hists = &mut self.tracks[role_index(track.role)];

        if let Some(bin) = p_bin {
            hists.momentum[bin] += 1.0;
        }
        fill_2d(&mut hists.dca_xy, pt_bin, self.dca_edges.bin_index(track.dca_xy));
        fill_2d(&mut hists.eta, pt_bin, RESPONSE_AXIS.bin_index(track.eta));
        fill_2d(&mut hists.tpc_nsigma, p_bin, RESPONSE_AXIS.bin_index(track.tpc_nsigma));
        fill_2d(&mut hists.tof_nsigma, p_bin, RESPONSE_AXIS.bin_index(track.tof_nsigma));
        fill_2d(&mut hists.rapidity, p_bin, RESPONSE_AXIS.bin_index(track.rapidity));
    }
}
