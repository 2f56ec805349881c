//! Configuration value objects.
//!
//! The defaults mirror the values that the analysis task historically ran
//! with. Most of them are deliberately loose (e.g. an |eta| limit of 100), so
//! that a default configuration only applies the cuts that are switched on
//! explicitly.
//!
//! [`MixingConfigBuilder`] accepts raw (integer) species codes and resolves
//! them when [`MixingConfigBuilder::build`] is called. That is the point
//! where an unsupported species is reported.

use crate::Error;
use crate::species::{Role, Species};

/// A closed interval `[low, high]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    pub low: f64,
    pub high: f64,
}

impl Interval {
    pub const fn new(low: f64, high: f64) -> Interval {
        Interval { low, high }
    }

    /// membership in the closed interval
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }

    /// membership in the open interval `(low, high)`
    #[inline]
    pub fn contains_open(&self, value: f64) -> bool {
        self.low < value && value < self.high
    }

    fn validate(&self, name: &'static str) -> Result<(), Error> {
        if self.low.is_nan() || self.high.is_nan() {
            Err(Error::config_value(name, "bounds must not be NaN".to_owned()))
        } else if self.low > self.high {
            Err(Error::config_value(
                name,
                format!("lower bound {} exceeds upper bound {}", self.low, self.high),
            ))
        } else {
            Ok(())
        }
    }
}

/// The two-bound rule applied to an impact parameter.
///
/// A track is kept when `|dca|` lies inside of `inclusion` (closed) AND
/// outside of `exclusion` (open). Both bounds always apply.
///
/// # Note
/// The default exclusion window is empty. Historically, the exclusion bound
/// was configured as a single lower bound that was compared in the same
/// direction as the inclusion bound; depending on the values, that could
/// either admit or reject everything. Picking a sensible combination is left
/// to whoever writes the configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DcaWindow {
    pub inclusion: Interval,
    pub exclusion: Interval,
}

impl DcaWindow {
    #[inline]
    pub fn accepts(&self, dca: f64) -> bool {
        let abs_dca = dca.abs();
        self.inclusion.contains(abs_dca) && !self.exclusion.contains_open(abs_dca)
    }
}

impl Default for DcaWindow {
    fn default() -> Self {
        DcaWindow {
            inclusion: Interval::new(0.0, 100.0),
            exclusion: Interval::new(0.0, 0.0),
        }
    }
}

/// Collision-level acceptance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventCuts {
    pub max_abs_vertex_z: f64,
    pub mult_percentile: Interval,
}

impl Default for EventCuts {
    fn default() -> Self {
        EventCuts {
            max_abs_vertex_z: 10.0,
            mult_percentile: Interval::new(-100.0, 1000.0),
        }
    }
}

/// Track-quality thresholds (see [`crate::TrackQualityFilter`])
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackQualityCuts {
    /// total momentum must lie inside of the open interval
    pub momentum: Interval,
    pub max_abs_eta: f64,
    pub min_tpc_clusters_found: u16,
    pub max_tpc_clusters_shared: u16,
    pub max_tpc_chi2_per_cluster: f64,
    pub min_tpc_crossed_rows_over_findable: f64,
    pub min_its_clusters: u8,
    pub max_its_chi2_per_cluster: f64,
    pub dca_xy: DcaWindow,
    pub dca_z: DcaWindow,
}

impl Default for TrackQualityCuts {
    fn default() -> Self {
        TrackQualityCuts {
            momentum: Interval::new(0.0, 100.0),
            max_abs_eta: 100.0,
            min_tpc_clusters_found: 0,
            max_tpc_clusters_shared: 100,
            max_tpc_chi2_per_cluster: 100.0,
            min_tpc_crossed_rows_over_findable: 0.0,
            min_its_clusters: 0,
            max_its_chi2_per_cluster: 100.0,
            dca_xy: DcaWindow::default(),
            dca_z: DcaWindow::default(),
        }
    }
}

/// Identification requirements for one side of the pair.
///
/// Below `pid_momentum_threshold` only the TPC response is used. At (and
/// above) the threshold only the TOF response is used.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeciesSelection {
    pub species: Species,
    pub sign: i8,
    pub tpc_nsigma: Interval,
    pub pid_momentum_threshold: f64,
    pub tof_nsigma: Interval,
    /// limit on |y| of the track, computed with the species mass
    pub max_abs_rapidity: f64,
}

impl SpeciesSelection {
    pub fn new(species: Species, sign: i8) -> SpeciesSelection {
        SpeciesSelection {
            species,
            sign,
            tpc_nsigma: Interval::new(-3.0, 3.0),
            pid_momentum_threshold: 10.0,
            tof_nsigma: Interval::new(-3.0, 3.0),
            max_abs_rapidity: 100.0,
        }
    }

    fn validate(&self, role: Role) -> Result<(), Error> {
        let (sign_name, tpc_name, tof_name, threshold_name, rapidity_name) = match role {
            Role::First => (
                "sign_1",
                "tpc_nsigma_1",
                "tof_nsigma_1",
                "pid_threshold_1",
                "max_rapidity",
            ),
            Role::Second => (
                "sign_2",
                "tpc_nsigma_2",
                "tof_nsigma_2",
                "pid_threshold_2",
                "max_rapidity",
            ),
        };
        if self.sign != 1 && self.sign != -1 {
            return Err(Error::config_value(
                sign_name,
                format!("must be +1 or -1, not {}", self.sign),
            ));
        }
        self.tpc_nsigma.validate(tpc_name)?;
        self.tof_nsigma.validate(tof_name)?;
        if self.pid_momentum_threshold.is_nan() {
            return Err(Error::config_value(threshold_name, "is NaN".to_owned()));
        }
        if !(self.max_abs_rapidity >= 0.0) {
            return Err(Error::config_value(
                rapidity_name,
                format!("must be non-negative, not {}", self.max_abs_rapidity),
            ));
        }
        Ok(())
    }
}

/// A species whose TOF signature disqualifies a second-particle candidate.
///
/// This only ever applies to the second particle, and only when the two
/// particles of a pair are not identical.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RejectionSelection {
    pub species: Species,
    pub tof_nsigma: Interval,
}

/// Close-pair rejection thresholds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosePairCuts {
    pub min_delta_eta: f64,
    pub min_delta_phi_star: f64,
    /// radius (in m) at which phi-star is evaluated
    pub radius_m: f64,
}

impl Default for ClosePairCuts {
    fn default() -> Self {
        ClosePairCuts {
            min_delta_eta: 0.01,
            min_delta_phi_star: 0.01,
            radius_m: 1.2,
        }
    }
}

/// widths of the (vertex-z, multiplicity) mixing bins
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixingBinWidths {
    pub vertex_z: f64,
    pub multiplicity: f64,
}

impl Default for MixingBinWidths {
    fn default() -> Self {
        MixingBinWidths {
            vertex_z: 2.0,
            multiplicity: 50.0,
        }
    }
}

/// Whether both sides of a pair are drawn from the same selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairingMode {
    Identical,
    NonIdentical,
}

/// Fully resolved configuration of a [`crate::MixingEngine`]
#[derive(Clone, Debug, PartialEq)]
pub struct MixingConfig {
    pub event_cuts: EventCuts,
    pub track_cuts: TrackQualityCuts,
    pub first: SpeciesSelection,
    pub second: SpeciesSelection,
    pub reject_from_second: Option<RejectionSelection>,
    pub close_pair: ClosePairCuts,
    pub bin_widths: MixingBinWidths,
    pub mix_events: bool,
}

impl MixingConfig {
    /// The particles are identical when both the species and the sign match.
    pub fn pairing_mode(&self) -> PairingMode {
        if self.first.species == self.second.species && self.first.sign == self.second.sign {
            PairingMode::Identical
        } else {
            PairingMode::NonIdentical
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.event_cuts.max_abs_vertex_z >= 0.0) {
            return Err(Error::config_value(
                "vertex_z",
                format!("must be non-negative, not {}", self.event_cuts.max_abs_vertex_z),
            ));
        }
        self.event_cuts.mult_percentile.validate("mult_percentile")?;

        let cuts = &self.track_cuts;
        cuts.momentum.validate("momentum")?;
        cuts.dca_xy.inclusion.validate("dca_xy")?;
        cuts.dca_xy.exclusion.validate("dca_xy_exclusion")?;
        cuts.dca_z.inclusion.validate("dca_z")?;
        cuts.dca_z.exclusion.validate("dca_z_exclusion")?;
        for (name, value) in [
            ("eta", cuts.max_abs_eta),
            ("tpc_chi2_per_cluster", cuts.max_tpc_chi2_per_cluster),
            ("its_chi2_per_cluster", cuts.max_its_chi2_per_cluster),
            (
                "tpc_crossed_rows_over_findable",
                cuts.min_tpc_crossed_rows_over_findable,
            ),
        ] {
            if value.is_nan() {
                return Err(Error::config_value(name, "is NaN".to_owned()));
            }
        }

        self.first.validate(Role::First)?;
        self.second.validate(Role::Second)?;
        if let Some(reject) = self.reject_from_second {
            reject.tof_nsigma.validate("reject_tof_nsigma")?;
        }

        let close_pair = &self.close_pair;
        if !(close_pair.radius_m > 0.0) {
            return Err(Error::config_value(
                "radius",
                format!("must be positive, not {}", close_pair.radius_m),
            ));
        } else if close_pair.min_delta_eta.is_nan() || close_pair.min_delta_phi_star.is_nan() {
            return Err(Error::config_value(
                "close_pair",
                "thresholds must not be NaN".to_owned(),
            ));
        }

        for (name, width) in [
            ("vertex_bin_width", self.bin_widths.vertex_z),
            ("mult_bin_width", self.bin_widths.multiplicity),
        ] {
            if !(width.is_finite() && width > 0.0) {
                return Err(Error::config_value(
                    name,
                    format!("must be positive & finite, not {width}"),
                ));
            }
        }
        Ok(())
    }
}

/// PID settings for one side of the pair, prior to species resolution
#[derive(Clone, Copy, Debug)]
struct RawSelection {
    pdg: i32,
    sign: i8,
    tpc_nsigma: Interval,
    pid_momentum_threshold: f64,
    tof_nsigma: Interval,
}

impl RawSelection {
    fn resolve(&self, role: Role, max_abs_rapidity: f64) -> Result<SpeciesSelection, Error> {
        let species = resolve_pdg(self.pdg, Some(role))?;
        Ok(SpeciesSelection {
            species,
            sign: self.sign,
            tpc_nsigma: self.tpc_nsigma,
            pid_momentum_threshold: self.pid_momentum_threshold,
            tof_nsigma: self.tof_nsigma,
            max_abs_rapidity,
        })
    }
}

impl Default for RawSelection {
    fn default() -> Self {
        RawSelection {
            pdg: 2212,
            sign: 1,
            tpc_nsigma: Interval::new(-3.0, 3.0),
            pid_momentum_threshold: 10.0,
            tof_nsigma: Interval::new(-3.0, 3.0),
        }
    }
}

fn resolve_pdg(code: i32, role: Option<Role>) -> Result<Species, Error> {
    Species::from_pdg(code).map_err(|_| Error::unsupported_species(role, code))
}

/// Assembles a [`MixingConfig`].
///
/// ```
/// use femtomix::{Interval, MixingConfigBuilder, PairingMode};
///
/// let config = MixingConfigBuilder::new()
///     .species_1(211, 1)
///     .species_2(321, -1)
///     .tof_nsigma_2(Interval::new(-2.0, 2.0))
///     .reject_from_second(2212, Interval::new(-1.0, 1.0))
///     .mix_events(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.pairing_mode(), PairingMode::NonIdentical);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MixingConfigBuilder {
    event_cuts: EventCuts,
    track_cuts: TrackQualityCuts,
    first: RawSelection,
    second: RawSelection,
    max_abs_rapidity: Option<f64>,
    reject_pdg: i32,
    reject_tof_nsigma: Option<Interval>,
    close_pair: ClosePairCuts,
    bin_widths: MixingBinWidths,
    mix_events: bool,
}

impl MixingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_cuts(mut self, cuts: EventCuts) -> Self {
        self.event_cuts = cuts;
        self
    }

    pub fn track_cuts(mut self, cuts: TrackQualityCuts) -> Self {
        self.track_cuts = cuts;
        self
    }

    /// set the PDG code and the required charge of the first particle
    pub fn species_1(mut self, pdg: i32, sign: i8) -> Self {
        self.first.pdg = pdg;
        self.first.sign = sign;
        self
    }

    /// set the PDG code and the required charge of the second particle
    pub fn species_2(mut self, pdg: i32, sign: i8) -> Self {
        self.second.pdg = pdg;
        self.second.sign = sign;
        self
    }

    pub fn tpc_nsigma_1(mut self, window: Interval) -> Self {
        self.first.tpc_nsigma = window;
        self
    }

    pub fn tpc_nsigma_2(mut self, window: Interval) -> Self {
        self.second.tpc_nsigma = window;
        self
    }

    pub fn tof_nsigma_1(mut self, window: Interval) -> Self {
        self.first.tof_nsigma = window;
        self
    }

    pub fn tof_nsigma_2(mut self, window: Interval) -> Self {
        self.second.tof_nsigma = window;
        self
    }

    pub fn pid_threshold_1(mut self, momentum: f64) -> Self {
        self.first.pid_momentum_threshold = momentum;
        self
    }

    pub fn pid_threshold_2(mut self, momentum: f64) -> Self {
        self.second.pid_momentum_threshold = momentum;
        self
    }

    /// limit on the track rapidity, applied to both particles
    pub fn max_rapidity(mut self, max_abs_rapidity: f64) -> Self {
        self.max_abs_rapidity = Some(max_abs_rapidity);
        self
    }

    /// Reject second-particle candidates whose TOF response for the species
    /// `pdg` falls within `window`. A `pdg` of 0 disables the rejection.
    pub fn reject_from_second(mut self, pdg: i32, window: Interval) -> Self {
        self.reject_pdg = pdg;
        self.reject_tof_nsigma = Some(window);
        self
    }

    pub fn close_pair(mut self, cuts: ClosePairCuts) -> Self {
        self.close_pair = cuts;
        self
    }

    pub fn bin_widths(mut self, vertex_z: f64, multiplicity: f64) -> Self {
        self.bin_widths = MixingBinWidths {
            vertex_z,
            multiplicity,
        };
        self
    }

    pub fn mix_events(mut self, mix_events: bool) -> Self {
        self.mix_events = mix_events;
        self
    }

    /// Resolve the species codes and validate every value.
    pub fn build(self) -> Result<MixingConfig, Error> {
        let max_abs_rapidity = self.max_abs_rapidity.unwrap_or(100.0);
        let first = self.first.resolve(Role::First, max_abs_rapidity)?;
        let second = self.second.resolve(Role::Second, max_abs_rapidity)?;

        let reject_from_second = if self.reject_pdg == 0 {
            None
        } else {
            Some(RejectionSelection {
                species: resolve_pdg(self.reject_pdg, None)?,
                tof_nsigma: self
                    .reject_tof_nsigma
                    .unwrap_or(Interval::new(0.0, 0.0)),
            })
        };

        let config = MixingConfig {
            event_cuts: self.event_cuts,
            track_cuts: self.track_cuts,
            first,
            second,
            reject_from_second,
            close_pair: self.close_pair,
            bin_widths: self.bin_widths,
            mix_events: self.mix_events,
        };
        config.validate()?;
        Ok(config)
    }
}
