mod common;

use common::{identical_config, invariant_mass, isclose};
use femtomix::{
    Batch, Event, HistogramSink, Interval, MixingConfigBuilder, MixingEngine, NSigma,
    PairCollector, PairRecord, PairScope, PairSink, RegularBinEdges, Role, Species, Track,
};

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn single_event_single_pair() {
        let mut engine = MixingEngine::new(identical_config(211, true)).unwrap();

        let tracks = vec![
            Track::from_pt_eta_phi(42, 1, 0.7, 0.15, 0.3),
            Track::from_pt_eta_phi(42, 1, 0.45, -0.1, 2.1),
        ];
        let expected_mass = invariant_mass(
            &tracks[0],
            Species::Pion.mass(),
            &tracks[1],
            Species::Pion.mass(),
        );
        let batch = Batch::new(
            vec![Event::new(42, 1.3, 20.0).with_magnetic_field(-5.0)],
            tracks,
        )
        .unwrap();

        let mut sink = PairCollector::new();
        let stats = engine.process_batch(&batch, &mut sink);

        assert_eq!(stats.se_candidates, 1);
        assert_eq!(stats.se_accepted, 1);
        assert_eq!(stats.me_candidates, 0);
        assert_eq!(sink.pairs.len(), 1);

        let pair = &sink.pairs[0];
        assert_eq!(pair.scope, PairScope::SameEvent);
        assert_eq!((pair.first_event, pair.second_event), (42, 42));
        assert!(isclose(pair.kinematics.inv_mass, expected_mass, 1e-12, 0.0));

        // both tracks were reported for monitoring
        assert_eq!(sink.tracks.len(), 2);
        assert!(sink.tracks.iter().all(|t| t.role == Role::First));
    }

    fn two_compatible_events() -> Batch {
        // vertex bins: round(0.9 / 2) = 0 & round(-0.6 / 2) = 0
        // mult bins: floor(10 / 50) = 0 & floor(40 / 50) = 0
        let events = vec![
            Event::new(1, 0.9, 10.0).with_magnetic_field(5.0),
            Event::new(2, -0.6, 40.0).with_magnetic_field(5.0),
        ];
        let tracks = vec![
            Track::from_pt_eta_phi(1, 1, 0.8, 0.2, 0.4),
            Track::from_pt_eta_phi(2, 1, 0.6, -0.3, 1.9),
        ];
        Batch::new(events, tracks).unwrap()
    }

    #[test]
    fn two_events_mixed() {
        let batch = two_compatible_events();

        let mut engine = MixingEngine::new(identical_config(2212, true)).unwrap();
        let mut sink = PairCollector::new();
        let stats = engine.process_batch(&batch, &mut sink);
        assert_eq!(stats.events_binned, 2);
        assert_eq!(stats.se_candidates, 0);
        assert_eq!(stats.me_candidates, 1);
        assert_eq!(sink.n_pairs(PairScope::SameEvent), 0);
        assert_eq!(sink.n_pairs(PairScope::MixedEvent), 1);

        let pair = sink.in_scope(PairScope::MixedEvent).next().unwrap();
        assert_eq!((pair.first_event, pair.second_event), (1, 2));
        let tracks = batch.tracks();
        let expected = invariant_mass(
            &tracks[0],
            Species::Proton.mass(),
            &tracks[1],
            Species::Proton.mass(),
        );
        assert!(isclose(pair.kinematics.inv_mass, expected, 1e-12, 0.0));

        // without event mixing
        let mut engine = MixingEngine::new(identical_config(2212, false)).unwrap();
        let mut sink = PairCollector::new();
        let stats = engine.process_batch(&batch, &mut sink);
        assert_eq!(stats.me_candidates, 0);
        assert!(sink.pairs.is_empty());
    }

    #[test]
    fn incompatible_events_are_not_mixed() {
        let events = vec![Event::new(1, 0.9, 10.0), Event::new(2, 5.0, 10.0)];
        let tracks = vec![
            Track::from_pt_eta_phi(1, 1, 0.8, 0.2, 0.4),
            Track::from_pt_eta_phi(2, 1, 0.6, -0.3, 1.9),
        ];
        let batch = Batch::new(events, tracks).unwrap();

        let mut engine = MixingEngine::new(identical_config(2212, true)).unwrap();
        let stats = engine.process_batch(&batch, &mut PairCollector::new());
        assert_eq!(stats.events_binned, 2);
        assert_eq!(stats.me_candidates, 0);
    }

    #[test]
    fn close_pairs_are_excluded() {
        let mut engine = MixingEngine::new(identical_config(211, true)).unwrap();

        // event 1 holds a split track; event 2 holds a track that happens to
        // overlap with one of them
        let events = vec![
            Event::new(1, 0.1, 10.0).with_magnetic_field(5.0),
            Event::new(2, 0.2, 12.0).with_magnetic_field(5.0),
        ];
        let tracks = vec![
            Track::from_pt_eta_phi(1, 1, 1.0, 0.100, 1.000),
            Track::from_pt_eta_phi(1, 1, 1.0, 0.104, 1.004),
            Track::from_pt_eta_phi(2, 1, 1.0, 0.103, 0.997),
        ];
        let batch = Batch::new(events, tracks).unwrap();

        let mut sink = PairCollector::new();
        let stats = engine.process_batch(&batch, &mut sink);
        assert_eq!(stats.selected_first, 3);
        assert_eq!(stats.se_candidates, 1);
        assert_eq!(stats.me_candidates, 2);
        assert_eq!(stats.close_pairs_rejected, 3);
        assert!(sink.pairs.is_empty());

        // with the eta threshold switched off, the very same pairs make it
        // through
        let config = MixingConfigBuilder::new()
            .species_1(211, 1)
            .species_2(211, 1)
            .mix_events(true)
            .close_pair(femtomix::ClosePairCuts {
                min_delta_eta: 0.0,
                ..Default::default()
            })
            .build()
            .unwrap();
        let mut engine = MixingEngine::new(config).unwrap();
        let mut sink = PairCollector::new();
        engine.process_batch(&batch, &mut sink);
        assert_eq!(sink.n_pairs(PairScope::SameEvent), 1);
        assert_eq!(sink.n_pairs(PairScope::MixedEvent), 2);
    }

    fn kaon_pion_config() -> femtomix::MixingConfig {
        MixingConfigBuilder::new()
            .species_1(321, 1)
            .species_2(211, -1)
            .tpc_nsigma_2(Interval::new(-3.0, 3.0))
            .reject_from_second(2212, Interval::new(-2.0, 2.0))
            .mix_events(true)
            .build()
            .unwrap()
    }

    #[test]
    fn rejection_species_vetoes_second_particle() {
        let mut engine = MixingEngine::new(kaon_pion_config()).unwrap();

        let kaon = Track::from_pt_eta_phi(5, 1, 0.6, 0.0, 0.2);
        // a negative track that is a fine pion, but also looks like a proton
        // in the TOF
        let mut vetoed = Track::from_pt_eta_phi(5, -1, 0.5, 0.1, 2.0);
        vetoed.tof_nsigma = NSigma::default().with(Species::Proton, 1.0);
        // the same, with a TOF response far away from the proton hypothesis
        let mut kept = vetoed.clone();
        kept.tof_nsigma = NSigma::default().with(Species::Proton, 8.0);

        let batch = Batch::new(
            vec![Event::new(5, 0.0, 3.0)],
            vec![kaon, vetoed, kept],
        )
        .unwrap();

        let mut sink = PairCollector::new();
        let stats = engine.process_batch(&batch, &mut sink);
        assert_eq!(stats.selected_first, 1);
        assert_eq!(stats.selected_second, 1);

        let second: Vec<_> = sink
            .tracks
            .iter()
            .filter(|t| t.role == Role::Second)
            .collect();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].species, Species::Pion);

        // the vetoed track never shows up in a pair
        assert_eq!(sink.pairs.len(), 1);
        assert_eq!(sink.pairs[0].first_track.0, 0);
        assert_eq!(sink.pairs[0].second_track.0, 2);
    }

    #[test]
    fn rejection_species_ignored_for_identical_particles() {
        let config = MixingConfigBuilder::new()
            .species_1(211, 1)
            .species_2(211, 1)
            .reject_from_second(2212, Interval::new(-2.0, 2.0))
            .build()
            .unwrap();
        let mut engine = MixingEngine::new(config).unwrap();

        let mut a = Track::from_pt_eta_phi(5, 1, 0.5, 0.1, 2.0);
        a.tof_nsigma = NSigma::default().with(Species::Proton, 0.0);
        let b = Track::from_pt_eta_phi(5, 1, 0.5, -0.1, 0.0);
        let batch = Batch::new(vec![Event::new(5, 0.0, 3.0)], vec![a, b]).unwrap();

        let mut sink = PairCollector::new();
        let stats = engine.process_batch(&batch, &mut sink);
        assert_eq!(stats.selected_first, 2);
        assert_eq!(stats.selected_second, 0);
        assert_eq!(sink.n_pairs(PairScope::SameEvent), 1);
    }

    #[test]
    fn non_identical_mixes_one_direction() {
        let mut engine = MixingEngine::new(kaon_pion_config()).unwrap();

        // both collisions hold a kaon & a pion
        let events = vec![Event::new(1, 0.0, 3.0), Event::new(2, 0.0, 4.0)];
        let tracks = vec![
            Track::from_pt_eta_phi(1, 1, 0.6, 0.0, 0.2),
            Track::from_pt_eta_phi(1, -1, 0.5, 0.1, 2.0),
            Track::from_pt_eta_phi(2, 1, 0.7, -0.1, 1.2),
            Track::from_pt_eta_phi(2, -1, 0.4, 0.2, -2.0),
        ];
        let batch = Batch::new(events, tracks).unwrap();

        let mut sink = PairCollector::new();
        let stats = engine.process_batch(&batch, &mut sink);
        assert_eq!(stats.se_candidates, 2);
        // kaon(1) x pion(2), but not pion(1) x kaon(2)
        assert_eq!(stats.me_candidates, 1);
        let mixed: Vec<&PairRecord> = sink.in_scope(PairScope::MixedEvent).collect();
        assert_eq!(mixed.len(), 1);
        assert_eq!((mixed[0].first_track.0, mixed[0].second_track.0), (0, 3));
    }

    #[test]
    fn events_with_only_second_particles_can_be_mixed() {
        let mut engine = MixingEngine::new(kaon_pion_config()).unwrap();

        let events = vec![Event::new(1, 0.0, 3.0), Event::new(2, 0.0, 4.0)];
        let tracks = vec![
            Track::from_pt_eta_phi(1, 1, 0.6, 0.0, 0.2),
            Track::from_pt_eta_phi(2, -1, 0.4, 0.2, -2.0),
        ];
        let batch = Batch::new(events, tracks).unwrap();

        let stats = engine.process_batch(&batch, &mut PairCollector::new());
        assert_eq!(stats.events_binned, 2);
        assert_eq!(stats.se_candidates, 0);
        assert_eq!(stats.me_candidates, 1);
    }

    #[test]
    fn batches_are_isolated() {
        let mut engine = MixingEngine::new(identical_config(2212, true)).unwrap();

        let mut sink = PairCollector::new();
        engine.process_batch(&two_compatible_events(), &mut sink);
        assert_eq!(sink.pairs.len(), 1);
        assert!(engine.is_clear());

        // a lone collision in the same mixing bin as the previous batch
        let batch = Batch::new(
            vec![Event::new(3, 0.5, 15.0).with_magnetic_field(5.0)],
            vec![Track::from_pt_eta_phi(3, 1, 0.9, 0.0, 0.0)],
        )
        .unwrap();
        sink.clear();
        let stats = engine.process_batch(&batch, &mut sink);
        assert_eq!(stats.se_candidates, 0);
        assert_eq!(stats.me_candidates, 0);
        assert!(sink.pairs.is_empty());
        assert!(engine.is_clear());

        // ids can be reused by the next batch without any crosstalk
        sink.clear();
        engine.process_batch(&two_compatible_events(), &mut sink);
        assert_eq!(sink.pairs.len(), 1);
        assert_eq!(engine.totals().batches, 3);
        assert_eq!(engine.totals().me_candidates, 2);
    }

    struct PanickingSink;

    impl PairSink for PanickingSink {
        fn record_pair(&mut self, _pair: &PairRecord) {
            panic!("sink failure");
        }
    }

    #[test]
    fn state_cleared_after_panic() {
        let mut engine = MixingEngine::new(identical_config(2212, true)).unwrap();
        let batch = two_compatible_events();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            engine.process_batch(&batch, &mut PanickingSink);
        }));
        assert!(result.is_err());
        assert!(engine.is_clear());

        // the engine is still usable afterwards
        let mut sink = PairCollector::new();
        engine.process_batch(&batch, &mut sink);
        assert_eq!(sink.pairs.len(), 1);
    }

    #[test]
    fn event_cuts_remove_tracks() {
        let config = MixingConfigBuilder::new()
            .species_1(211, 1)
            .species_2(211, 1)
            .event_cuts(femtomix::EventCuts {
                max_abs_vertex_z: 7.0,
                mult_percentile: Interval::new(0.0, 90.0),
            })
            .build()
            .unwrap();
        let mut engine = MixingEngine::new(config).unwrap();

        let events = vec![
            Event::new(1, 8.0, 10.0),
            Event::new(2, 1.0, 10.0).with_mult_percentile(95.0),
            Event::new(3, 1.0, 10.0).with_mult_percentile(30.0),
        ];
        let mut tracks = Vec::new();
        for id in 1..=3 {
            tracks.push(Track::from_pt_eta_phi(id, 1, 0.5, 0.1, 0.0));
            tracks.push(Track::from_pt_eta_phi(id, 1, 0.5, -0.1, 2.0));
        }
        let batch = Batch::new(events, tracks).unwrap();

        let stats = engine.process_batch(&batch, &mut PairCollector::new());
        assert_eq!(stats.tracks_seen, 6);
        assert_eq!(stats.tracks_passing_quality, 6);
        assert_eq!(stats.selected_first, 2);
        assert_eq!(stats.events_binned, 1);
        assert_eq!(stats.se_candidates, 1);
    }

    #[test]
    fn malformed_batches() {
        let err = Batch::new(
            vec![Event::new(1, 0.0, 1.0), Event::new(1, 0.5, 2.0)],
            Vec::new(),
        )
        .unwrap_err();
        assert!(!err.is_configuration());

        let err = Batch::new(
            vec![Event::new(1, 0.0, 1.0)],
            vec![Track::from_pt_eta_phi(2, 1, 0.5, 0.0, 0.0)],
        )
        .unwrap_err();
        assert!(!err.is_configuration());
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn unsupported_species_stops_configuration() {
        let err = MixingConfigBuilder::new()
            .species_1(211, 1)
            .species_2(3122, 1)
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn histogram_sink() {
        let mut engine = MixingEngine::new(identical_config(211, true)).unwrap();
        let mut sink = HistogramSink::new(
            RegularBinEdges::new(0.0, 3.0, 30).unwrap(),
            RegularBinEdges::new(0.0, 5.0, 10).unwrap(),
        );

        let events = vec![Event::new(1, 0.1, 10.0), Event::new(2, 0.2, 12.0)];
        let tracks = vec![
            Track::from_pt_eta_phi(1, 1, 0.4, 0.1, 0.0),
            Track::from_pt_eta_phi(1, 1, 0.4, -0.1, 3.0),
            Track::from_pt_eta_phi(2, 1, 0.4, 0.2, 1.5),
        ];
        let batch = Batch::new(events, tracks).unwrap();
        let stats = engine.process_batch(&batch, &mut sink);

        assert_eq!(
            sink.mass(PairScope::SameEvent).sum(),
            stats.se_accepted as f64
        );
        assert_eq!(
            sink.mass(PairScope::MixedEvent).sum(),
            stats.me_accepted as f64
        );
        assert_eq!(stats.me_accepted, 2);
        assert_eq!(sink.momentum(Role::First).sum(), 3.0);
        assert_eq!(sink.momentum(Role::Second).sum(), 0.0);
    }
}
