//! Tests for the shared DSP helpers

use fm_resonator_dsp::utils::random::{Random, DEFAULT_SEED};
use fm_resonator_dsp::utils::sine::sine_pm;
use fm_resonator_dsp::utils::*;

const TABLE: [f32; 6] = [0.0, 1.0, 3.0, 3.0, 7.0, 7.0];

#[test]
fn plateau_holds_upper_entry() {
    let size = 4.0;

    for step in 0..=4 {
        let index = step as f32 / size;
        assert_eq!(interpolate_plateau(&TABLE, index, size), TABLE[step]);
    }

    // Ramp over the first half of a step, then hold.
    assert_eq!(interpolate_plateau(&TABLE, 1.25 / size, size), 2.0);
    assert_eq!(interpolate_plateau(&TABLE, 1.5 / size, size), 3.0);
    assert_eq!(interpolate_plateau(&TABLE, 1.9 / size, size), 3.0);
}

#[test]
fn plateau_clamps_index() {
    assert_eq!(interpolate_plateau(&TABLE, -1.0, 4.0), TABLE[0]);
    assert_eq!(interpolate_plateau(&TABLE, 2.0, 4.0), TABLE[4]);
}

#[test]
fn linear_interpolation() {
    assert_eq!(interpolate(&TABLE, 0.125, 4.0), 0.5);
    assert_eq!(interpolate(&TABLE, 1.0, 5.0), TABLE[5]);
}

#[test]
fn clips_to_16_bits() {
    assert_eq!(clip_16(40000), 32767);
    assert_eq!(clip_16(-40000), -32768);
    assert_eq!(clip_16(1234), 1234);
}

#[test]
fn semitone_ratios() {
    assert!((semitones_to_ratio(12.0) - 2.0).abs() < 1e-5);
    assert!((semitones_to_ratio(-24.0) - 0.25).abs() < 1e-6);
    assert_eq!(semitones_to_ratio(0.0), 1.0);
}

#[test]
fn one_pole_converges() {
    let mut state = 0.0;
    for _ in 0..100 {
        one_pole(&mut state, 1.0, 0.2);
    }
    assert!((state - 1.0).abs() < 1e-6);
}

#[test]
fn random_is_seedable() {
    let mut a = Random::default();
    let mut b = Random::new(DEFAULT_SEED);
    let mut c = Random::new(DEFAULT_SEED + 1);

    for _ in 0..100 {
        let value = a.get_float();
        assert_eq!(value, b.get_float());
        assert!((0.0..=1.0).contains(&value));
    }
    assert_ne!(a.get_word(), c.get_word());

    a.seed(5);
    b.seed(5);
    assert_eq!(a.state(), 5);
    assert_eq!(a.get_sample(), b.get_sample());
}

#[test]
fn sine_table() {
    assert!(sine_pm(0, 0.0).abs() < 1e-6);
    assert!((sine_pm(1 << 30, 0.0) - 1.0).abs() < 1e-3);
    assert!((sine_pm(3 << 30, 0.0) + 1.0).abs() < 1e-3);

    // A quarter cycle of phase modulation.
    assert!((sine_pm(0, 0.25) - 1.0).abs() < 1e-3);
}
