//! The mixing engine: drives selection, binning and pair generation for one
//! batch of collisions at a time.
//!
//! # Lifecycle
//!
//! Each call to [`MixingEngine::process_batch`] walks through the phases
//! ```text
//! Idle -> Selecting -> Binning -> Mixing -> Idle
//! ```
//! The per-batch state (the selected tracks of each side & the mixing bins)
//! only holds indices into the batch that is being processed. It is wrapped
//! in a [`BatchScope`] guard that clears it when the guard is dropped, so the
//! state is discarded on every exit path (including a panicking sink). A
//! later batch can never observe indices from an earlier one.
//!
//! # Pair generation
//!
//! Within each mixing bin, collisions are visited in batch order. For the
//! collision `A` at position `i`:
//! - the same-event pairs of `A` are generated. For identical particles that
//!   is every unordered pair of distinct tracks. Otherwise it is the full
//!   product of `A`'s first-particle tracks with `A`'s second-particle tracks.
//! - if event mixing is enabled, `A` is paired with every collision `B` at a
//!   position `j > i`. Each unordered pair of collisions is visited exactly
//!   once, and only the product of `A`'s first-particle tracks with `B`'s
//!   second-particle tracks is considered (for identical particles, both
//!   sides use the first-particle selection).

use core::ops::{Deref, DerefMut};

use tracing::{debug, info};

use crate::Error;
use crate::binner::{EventBinner, SelectedTracks};
use crate::config::{MixingConfig, PairingMode};
use crate::geometry::PairGeometry;
use crate::kinematics::PairAccumulator;
use crate::pid::SpeciesIdentifier;
use crate::quality::{EventFilter, TrackQualityFilter};
use crate::sink::{PairRecord, PairScope, PairSink, TrackRecord};
use crate::species::Role;
use crate::stats::MixingStats;
use crate::track::{Batch, EventIdx, TrackIdx};

/// The phase of the engine's per-batch state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Selecting,
    Binning,
    Mixing,
}

/// Mutable state that only lives for the duration of a batch
#[derive(Debug)]
struct BatchState {
    phase: Phase,
    selected_first: SelectedTracks,
    // stays empty for identical particles
    selected_second: SelectedTracks,
    binner: EventBinner,
}

impl BatchState {
    fn is_clear(&self) -> bool {
        self.selected_first.is_empty() && self.selected_second.is_empty() && self.binner.is_empty()
    }

    fn clear(&mut self) {
        self.selected_first.clear();
        self.selected_second.clear();
        self.binner.clear();
        self.phase = Phase::Idle;
    }
}

/// Grants access to the [`BatchState`] for the duration of one batch and
/// clears it when dropped.
struct BatchScope<'a> {
    state: &'a mut BatchState,
}

impl<'a> BatchScope<'a> {
    fn enter(state: &'a mut BatchState) -> Self {
        debug_assert!(
            state.phase == Phase::Idle && state.is_clear(),
            "stale per-batch state at the start of a batch"
        );
        BatchScope { state }
    }

    fn advance(&mut self, phase: Phase) {
        self.state.phase = phase;
    }
}

impl Deref for BatchScope<'_> {
    type Target = BatchState;

    fn deref(&self) -> &BatchState {
        self.state
    }
}

impl DerefMut for BatchScope<'_> {
    fn deref_mut(&mut self) -> &mut BatchState {
        self.state
    }
}

impl Drop for BatchScope<'_> {
    fn drop(&mut self) {
        self.state.clear();
    }
}

/// The stateless machinery, shared by every batch
#[derive(Clone, Debug)]
struct Pipeline {
    mode: PairingMode,
    mix_events: bool,
    event_filter: EventFilter,
    quality: TrackQualityFilter,
    first: SpeciesIdentifier,
    // None for identical particles
    second: Option<SpeciesIdentifier>,
    geometry: PairGeometry,
    accumulator: PairAccumulator,
}

impl Pipeline {
    fn new(config: &MixingConfig) -> Self {
        let mode = config.pairing_mode();
        let second = match mode {
            PairingMode::Identical => None,
            PairingMode::NonIdentical => Some(SpeciesIdentifier::with_rejection(
                config.second,
                config.reject_from_second,
            )),
        };
        let mass_first = config.first.species.mass();
        let mass_second = second.as_ref().map_or(mass_first, |id| id.species().mass());
        Pipeline {
            mode,
            mix_events: config.mix_events,
            event_filter: EventFilter::new(config.event_cuts),
            quality: TrackQualityFilter::new(config.track_cuts),
            first: SpeciesIdentifier::new(config.first),
            second,
            geometry: PairGeometry::new(config.close_pair),
            accumulator: PairAccumulator::new(mass_first, mass_second),
        }
    }

    /// The selection phase. The per-track decisions are independent of each
    /// other; only the bookkeeping is sequential.
    fn select(
        &self,
        batch: &Batch,
        state: &mut BatchState,
        sink: &mut impl PairSink,
        stats: &mut MixingStats,
    ) {
        for (i, track) in batch.tracks().iter().enumerate() {
            let track_idx = TrackIdx(i);
            stats.tracks_seen += 1;
            if !self.quality.accepts(track) {
                continue;
            }
            stats.tracks_passing_quality += 1;

            let event_idx = batch.owner_of(track_idx);
            if !self.event_filter.accepts(batch.event(event_idx)) {
                continue;
            }

            if self.first.accepts(track) {
                state.selected_first.push(event_idx, track_idx);
                stats.selected_first += 1;
                sink.record_track(&track_record(batch, track_idx, Role::First, &self.first));
            }

            if let Some(second) = &self.second {
                if second.accepts(track) {
                    state.selected_second.push(event_idx, track_idx);
                    stats.selected_second += 1;
                    sink.record_track(&track_record(batch, track_idx, Role::Second, second));
                }
            }
        }
    }

    fn mix(
        &self,
        batch: &Batch,
        state: &BatchState,
        sink: &mut impl PairSink,
        stats: &mut MixingStats,
    ) {
        let second_selection = match self.mode {
            PairingMode::Identical => &state.selected_first,
            PairingMode::NonIdentical => &state.selected_second,
        };

        for (key, events) in state.binner.bins() {
            debug!(
                vertex_bin = key.vertex,
                mult_bin = key.multiplicity,
                n_events = events.len(),
                "mixing bin"
            );
            for (i, &event_a) in events.iter().enumerate() {
                let first_a = state.selected_first.get(event_a);
                match self.mode {
                    PairingMode::Identical => {
                        self.pair_within_event(batch, event_a, first_a, None, sink, stats)
                    }
                    PairingMode::NonIdentical => self.pair_within_event(
                        batch,
                        event_a,
                        first_a,
                        Some(state.selected_second.get(event_a)),
                        sink,
                        stats,
                    ),
                }

                if !self.mix_events {
                    continue;
                }
                for &event_b in &events[i + 1..] {
                    self.pair_across_events(
                        batch,
                        event_a,
                        first_a,
                        event_b,
                        second_selection.get(event_b),
                        sink,
                        stats,
                    );
                }
            }
        }
    }

    /// Generate the same-event pairs of `event`.
    ///
    /// When `second` is `None`, every unordered pair of distinct tracks in
    /// `first` is considered (`n (n - 1) / 2` candidates). Otherwise, every
    /// track in `first` is paired with every other track in `second`; a
    /// track that passed both selections is never paired with itself.
    fn pair_within_event(
        &self,
        batch: &Batch,
        event: EventIdx,
        first: &[TrackIdx],
        second: Option<&[TrackIdx]>,
        sink: &mut impl PairSink,
        stats: &mut MixingStats,
    ) {
        match second {
            None => {
                for (i, &a) in first.iter().enumerate() {
                    for &b in &first[i + 1..] {
                        self.consider_pair(
                            batch,
                            PairScope::SameEvent,
                            event,
                            a,
                            event,
                            b,
                            sink,
                            stats,
                        );
                    }
                }
            }
            Some(second) => {
                for &a in first {
                    for &b in second.iter().filter(|&&b| b != a) {
                        self.consider_pair(
                            batch,
                            PairScope::SameEvent,
                            event,
                            a,
                            event,
                            b,
                            sink,
                            stats,
                        );
                    }
                }
            }
        }
    }

    /// Generate the mixed-event pairs made of the `first` tracks of `event_a`
    /// and the `second` tracks of `event_b`.
    #[allow(clippy::too_many_arguments)]
    fn pair_across_events(
        &self,
        batch: &Batch,
        event_a: EventIdx,
        first: &[TrackIdx],
        event_b: EventIdx,
        second: &[TrackIdx],
        sink: &mut impl PairSink,
        stats: &mut MixingStats,
    ) {
        debug_assert_ne!(event_a, event_b);
        for &a in first {
            for &b in second {
                self.consider_pair(
                    batch,
                    PairScope::MixedEvent,
                    event_a,
                    a,
                    event_b,
                    b,
                    sink,
                    stats,
                );
            }
        }
    }

    /// Applies the close-pair & rapidity rejection to a single candidate and
    /// records it if it survives.
    #[allow(clippy::too_many_arguments)]
    fn consider_pair(
        &self,
        batch: &Batch,
        scope: PairScope,
        event_a: EventIdx,
        a: TrackIdx,
        event_b: EventIdx,
        b: TrackIdx,
        sink: &mut impl PairSink,
        stats: &mut MixingStats,
    ) {
        stats.count_candidate(scope);

        let (track_a, track_b) = (batch.track(a), batch.track(b));
        let (collision_a, collision_b) = (batch.event(event_a), batch.event(event_b));
        if self.geometry.is_close_pair(
            track_a,
            collision_a.magnetic_field,
            track_b,
            collision_b.magnetic_field,
        ) {
            stats.close_pairs_rejected += 1;
            return;
        }

        let Some(kinematics) = self.accumulator.combine(track_a, track_b) else {
            stats.rapidity_rejected += 1;
            return;
        };

        stats.count_accepted(scope);
        sink.record_pair(&PairRecord {
            scope,
            first_event: collision_a.id,
            second_event: collision_b.id,
            first_track: a,
            second_track: b,
            kinematics,
        });
    }
}

fn track_record(
    batch: &Batch,
    idx: TrackIdx,
    role: Role,
    identifier: &SpeciesIdentifier,
) -> TrackRecord {
    let track = batch.track(idx);
    let species = identifier.species();
    TrackRecord {
        role,
        species,
        event_id: track.event_id,
        p: track.p,
        pt: track.pt,
        eta: track.eta,
        dca_xy: track.dca_xy,
        tpc_nsigma: track.tpc_nsigma.get(species),
        tof_nsigma: track.tof_nsigma.get(species),
        rapidity: identifier.rapidity(track),
    }
}

/// Computes same-event and mixed-event pair distributions, one batch of
/// collisions at a time.
///
/// ```
/// use femtomix::{Batch, Event, MixingConfigBuilder, MixingEngine, PairCollector, PairScope, Track};
///
/// let config = MixingConfigBuilder::new().species_1(211, 1).species_2(211, 1).build().unwrap();
/// let mut engine = MixingEngine::new(config).unwrap();
///
/// let events = vec![Event::new(7, 0.5, 12.0)];
/// let tracks = vec![
///     Track::from_pt_eta_phi(7, 1, 0.8, 0.1, 0.2),
///     Track::from_pt_eta_phi(7, 1, 0.6, -0.2, 2.5),
/// ];
/// let batch = Batch::new(events, tracks).unwrap();
///
/// let mut sink = PairCollector::new();
/// let stats = engine.process_batch(&batch, &mut sink);
/// assert_eq!(stats.se_candidates, 1);
/// assert_eq!(sink.n_pairs(PairScope::SameEvent), 1);
/// ```
#[derive(Debug)]
pub struct MixingEngine {
    config: MixingConfig,
    pipeline: Pipeline,
    state: BatchState,
    totals: MixingStats,
}

impl MixingEngine {
    /// Set up an engine.
    ///
    /// The configuration is validated up-front; an invalid configuration
    /// (most notably an unsupported species) means that no batch can ever be
    /// processed.
    pub fn new(config: MixingConfig) -> Result<MixingEngine, Error> {
        config.validate()?;
        let pipeline = Pipeline::new(&config);
        let identical = pipeline.mode == PairingMode::Identical;
        info!(
            identical,
            species_1 = %config.first.species,
            sign_1 = config.first.sign,
            species_2 = %config.second.species,
            sign_2 = config.second.sign,
            mix_events = config.mix_events,
            "configured pair mixing"
        );
        Ok(MixingEngine {
            state: BatchState {
                phase: Phase::Idle,
                selected_first: SelectedTracks::new(),
                selected_second: SelectedTracks::new(),
                binner: EventBinner::new(config.bin_widths),
            },
            pipeline,
            config,
            totals: MixingStats::default(),
        })
    }

    pub fn config(&self) -> &MixingConfig {
        &self.config
    }

    pub fn pairing_mode(&self) -> PairingMode {
        self.pipeline.mode
    }

    /// The current phase. Outside of [`Self::process_batch`] this is always
    /// [`Phase::Idle`].
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Returns `true` when no per-batch state is being held.
    pub fn is_clear(&self) -> bool {
        self.state.phase == Phase::Idle && self.state.is_clear()
    }

    /// counters accumulated over every batch processed so far
    pub fn totals(&self) -> &MixingStats {
        &self.totals
    }

    /// Discard any per-batch state.
    ///
    /// [`Self::process_batch`] already does this on every exit path; this is
    /// provided for callers that want to be explicit at batch boundaries.
    pub fn reset(&mut self) {
        self.state.clear();
    }

    /// Select, bin and mix the contents of `batch`, reporting to `sink`.
    ///
    /// Returns the counters of this batch (they are also added to
    /// [`Self::totals`]). All per-batch state is cleared before returning.
    pub fn process_batch(&mut self, batch: &Batch, sink: &mut impl PairSink) -> MixingStats {
        debug!(
            n_collisions = batch.n_events(),
            n_tracks = batch.n_tracks(),
            "processing batch"
        );
        let MixingEngine {
            pipeline,
            state,
            totals,
            ..
        } = self;

        let mut stats = MixingStats {
            batches: 1,
            ..MixingStats::default()
        };
        {
            let mut scope = BatchScope::enter(state);

            scope.advance(Phase::Selecting);
            pipeline.select(batch, &mut scope, sink, &mut stats);

            scope.advance(Phase::Binning);
            let BatchState {
                selected_first,
                selected_second,
                binner,
                ..
            } = &mut *scope;
            stats.events_binned =
                binner.assign(batch, selected_first, selected_second, pipeline.mode) as u64;

            scope.advance(Phase::Mixing);
            pipeline.mix(batch, &scope, sink, &mut stats);
        }

        debug!(
            se_accepted = stats.se_accepted,
            me_accepted = stats.me_accepted,
            "finished batch"
        );
        *totals += &stats;
        stats
    }
}
