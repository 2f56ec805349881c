// the reason this is named mod.rs has to do with some complexities of how
// testing is handled
//
// we are following the advice of the rust book
// https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

#![allow(dead_code)] // not every test file uses every helper

use femtomix::{MixingConfig, MixingConfigBuilder, Track};

// based on numpy!
// https://numpy.org/doc/stable/reference/generated/numpy.isclose.html
pub fn isclose(actual: f64, ref_val: f64, rtol: f64, atol: f64) -> bool {
    let actual_nan = actual.is_nan();
    let ref_nan = ref_val.is_nan();
    if actual_nan || ref_nan {
        actual_nan && ref_nan
    } else {
        (actual - ref_val).abs() <= (atol + rtol * ref_val.abs())
    }
}

/// invariant mass of 2 tracks, written out long-hand so that it doesn't
/// share any code with the crate
pub fn invariant_mass(a: &Track, mass_a: f64, b: &Track, mass_b: f64) -> f64 {
    let p_a = [
        a.pt * a.phi.cos(),
        a.pt * a.phi.sin(),
        a.pt * a.eta.sinh(),
    ];
    let p_b = [
        b.pt * b.phi.cos(),
        b.pt * b.phi.sin(),
        b.pt * b.eta.sinh(),
    ];
    let e_a = (p_a.iter().map(|x| x * x).sum::<f64>() + mass_a * mass_a).sqrt();
    let e_b = (p_b.iter().map(|x| x * x).sum::<f64>() + mass_b * mass_b).sqrt();
    let p_sum_sq: f64 = (0..3).map(|k| (p_a[k] + p_b[k]).powi(2)).sum();
    ((e_a + e_b).powi(2) - p_sum_sq).sqrt()
}

/// configuration for identical particles
pub fn identical_config(pdg: i32, mix_events: bool) -> MixingConfig {
    MixingConfigBuilder::new()
        .species_1(pdg, 1)
        .species_2(pdg, 1)
        .mix_events(mix_events)
        .build()
        .unwrap()
}
