/*!
Event mixing for femtoscopic two-particle analyses.

Given a stream of collisions, each carrying a set of reconstructed tracks,
this crate computes same-event (SE) and mixed-event (ME) pair distributions
(invariant mass, transverse momentum and rapidity of the pair).

# High-Level: Event Mixing

A same-event distribution contains both correlated pairs (e.g. the decay
products of a resonance) and an uncorrelated combinatorial background. The
shape of the background is estimated by pairing tracks taken from
*different* collisions that were recorded under similar conditions. In this
crate, "similar conditions" means that the collisions share a mixing bin: a
`(vertex-z, multiplicity)` cell of configurable width.

Pairs of tracks that are too close to each other inside of the detector are
rejected in both cases, since they are likely to be a single split track (or
two merged tracks) rather than two particles.

# User Guide

1. assemble a [`MixingConfig`] with [`MixingConfigBuilder`] (this is where an
   unsupported species gets reported)
2. create a [`MixingEngine`]
3. for each batch of collisions, build a [`Batch`] and pass it to
   [`MixingEngine::process_batch`] along with a [`PairSink`] (e.g.
   [`HistogramSink`] or [`PairCollector`])

The engine only holds onto per-batch state while
[`MixingEngine::process_batch`] is running.

# Developer Guide

The pieces, leaf-first:
- [`TrackQualityFilter`] & [`EventFilter`]: stateless acceptance cuts
- [`SpeciesIdentifier`]: stateless PID decision for one side of the pair
- [`PairGeometry`]: close-pair rejection based on phi-star
- [`PairAccumulator`]: pair kinematics & the pair rapidity acceptance
- [`EventBinner`] & [`SelectedTracks`]: the per-batch bookkeeping
- [`MixingEngine`]: the per-batch state machine that drives everything

*/

#![deny(rustdoc::broken_intra_doc_links)]

// inform build-system of the crates in this package
mod binner;
mod bins;
mod config;
mod engine;
mod error;
mod geometry;
mod kinematics;
mod pid;
mod quality;
mod sink;
mod species;
mod stats;
mod track;

// pull in symbols that visible outside of the package
pub use binner::{EventBinner, MixingBinKey, SelectedTracks};
pub use bins::{BinEdgeSpec, BinEdges, IrregularBinEdges, RegularBinEdges};
pub use config::{
    ClosePairCuts, DcaWindow, EventCuts, Interval, MixingBinWidths, MixingConfig,
    MixingConfigBuilder, PairingMode, RejectionSelection, SpeciesSelection, TrackQualityCuts,
};
pub use engine::{MixingEngine, Phase};
pub use error::Error;
pub use geometry::{PairGeometry, PairSeparation, phi_star};
pub use kinematics::{FourMomentum, PAIR_RAPIDITY_LIMIT, PairAccumulator, PairKinematics};
pub use pid::{PidRegime, SpeciesIdentifier};
pub use quality::{EventFilter, TrackQualityFilter};
pub use sink::{
    HistogramSink, PairCollector, PairRecord, PairScope, PairSink, TrackHistogram, TrackRecord,
};
pub use species::{NSigma, Role, Species};
pub use stats::MixingStats;
pub use track::{Batch, Event, EventIdx, Track, TrackIdx};
