//! Tests for the chord resonator


use fm_resonator_dsp::fx::resonator::{
    FloatFrame, Resonator, FEEDBACK_DELAY_LENGTH, MAX_COMB, MEMORY_SIZE,
};
use fm_resonator_dsp::utils::random::Random;

const SAMPLE_RATE: f32 = 32000.0;
const BLOCK_SIZE: usize = 32;

fn resonator(seed: u32) -> Box<Resonator> {
    let mut resonator = Box::new(Resonator::new(Random::new(seed)).unwrap());
    resonator.init(SAMPLE_RATE);
    resonator
}

fn process_silence(resonator: &mut Resonator, blocks: usize) -> Vec<FloatFrame> {
    let mut output = Vec::new();
    let mut block = [FloatFrame::default(); BLOCK_SIZE];

    for _ in 0..blocks {
        block.fill(FloatFrame::default());
        resonator.process(&mut block);
        output.extend_from_slice(&block);
    }

    output
}

fn assert_near(a: f32, b: f32) {
    assert!((a - b).abs() < 1e-3, "{a} != {b}");
}

#[test]
fn memory_holds_every_line() {
    let resonator = resonator(1);
    assert_eq!(resonator.memory_size(), MEMORY_SIZE);
    assert!(MEMORY_SIZE >= 8 * MAX_COMB + FEEDBACK_DELAY_LENGTH);
}

#[test]
fn fundamental_comb_follows_pitch() {
    let mut resonator = resonator(1);

    process_silence(&mut resonator, 1);
    let delays = resonator.comb_delays();
    assert_near(delays[0][0], SAMPLE_RATE / 220.0);

    // Chord 0 stacks unisons.
    for harmonic in delays.iter() {
        assert_near(harmonic[0], SAMPLE_RATE / 220.0);
    }

    resonator.set_pitch(12.0);
    process_silence(&mut resonator, 1);
    assert_near(resonator.comb_delays()[0][0], SAMPLE_RATE / 440.0);
}

#[test]
fn comb_delays_are_clamped() {
    let mut resonator = resonator(1);

    resonator.set_pitch(-96.0);
    process_silence(&mut resonator, 1);
    for harmonic in resonator.comb_delays() {
        assert!(harmonic[0] <= MAX_COMB as f32);
        assert!(harmonic[0] >= 0.0);
    }
    assert_eq!(resonator.comb_delays()[0][0], MAX_COMB as f32);

    resonator.set_pitch(200.0);
    process_silence(&mut resonator, 1);
    assert!(resonator.comb_delays()[0][0] >= 0.0);
}

#[test]
fn chord_control_is_clamped() {
    let mut low = resonator(1);
    let mut high = resonator(1);

    low.set_chord(-3.0);
    high.set_chord(0.0);
    process_silence(&mut low, 1);
    process_silence(&mut high, 1);
    assert_eq!(low.comb_delays(), high.comb_delays());

    low.set_chord(7.0);
    high.set_chord(1.0);
    process_silence(&mut low, 1);
    process_silence(&mut high, 1);
    assert_eq!(low.comb_delays(), high.comb_delays());
}

#[test]
fn chord_steps_hold_table_entries() {
    let mut resonator = resonator(1);

    // Step 5 holds an octave and two octaves.
    resonator.set_chord(5.0 / 16.0);
    process_silence(&mut resonator, 1);
    let delays = resonator.comb_delays();
    let fundamental = delays[0][0];
    assert_near(delays[1][0], fundamental / 2.0);
    assert_near(delays[2][0], fundamental / 4.0);
    assert_near(delays[3][0], fundamental / 8.0);

    // Second half of a step still holds the upper entry.
    resonator.set_chord(5.75 / 16.0);
    process_silence(&mut resonator, 1);
    assert_near(resonator.comb_delays()[3][0], fundamental / 2.0_f32.powf(19.0 / 12.0));
}

#[test]
fn trigger_edges_alternate_voices() {
    let mut resonator = resonator(1);
    assert_eq!(resonator.active_voice(), 0);

    resonator.set_trigger(true);
    process_silence(&mut resonator, 1);
    assert_eq!(resonator.active_voice(), 1);

    // No edge while the trigger stays high.
    process_silence(&mut resonator, 3);
    assert_eq!(resonator.active_voice(), 1);

    resonator.set_trigger(false);
    process_silence(&mut resonator, 1);
    assert_eq!(resonator.active_voice(), 1);

    resonator.set_trigger(true);
    process_silence(&mut resonator, 1);
    assert_eq!(resonator.active_voice(), 0);
}

#[test]
fn inactive_voice_keeps_its_pitch() {
    let mut resonator = resonator(1);

    resonator.set_pitch(7.0);
    resonator.set_trigger(true);
    process_silence(&mut resonator, 1);
    let ringing = resonator.comb_delays()[0][1];

    resonator.set_trigger(false);
    process_silence(&mut resonator, 1);
    resonator.set_pitch(-5.0);
    resonator.set_trigger(true);
    process_silence(&mut resonator, 1);

    assert_eq!(resonator.active_voice(), 0);
    assert_eq!(resonator.comb_delays()[0][1], ringing);
    assert_near(
        resonator.comb_delays()[0][0],
        SAMPLE_RATE / 220.0 * 2.0_f32.powf(5.0 / 12.0),
    );
}

#[test]
fn trigger_arms_burst_and_redraws_diffusion() {
    let mut resonator = resonator(7);
    let initial = resonator.diffusion_offsets();

    resonator.set_burst_duration(1.0);
    resonator.set_trigger(true);
    process_silence(&mut resonator, 1);

    let expected = SAMPLE_RATE / 220.0 * 2.0 - BLOCK_SIZE as f32;
    assert_near(resonator.burst_countdown(), expected);
    assert_ne!(resonator.diffusion_offsets(), initial);

    for offset in resonator.diffusion_offsets() {
        assert!((0.0..FEEDBACK_DELAY_LENGTH as f32).contains(&offset));
    }

    // The countdown stops at zero.
    process_silence(&mut resonator, 100);
    assert_eq!(resonator.burst_countdown(), 0.0);
}

#[test]
fn seeded_generators_are_reproducible() {
    let mut a = resonator(1234);
    let mut b = resonator(1234);
    let c = resonator(4321);

    assert_eq!(a.diffusion_offsets(), b.diffusion_offsets());
    assert_ne!(a.diffusion_offsets(), c.diffusion_offsets());

    for resonator in [&mut a, &mut b] {
        resonator.set_feedback(0.9);
        resonator.set_burst_duration(0.5);
        resonator.set_spread_amount(0.5);
        resonator.set_trigger(true);
    }

    assert_eq!(process_silence(&mut a, 50), process_silence(&mut b, 50));
}

#[test]
fn silent_without_excitation() {
    let mut resonator = resonator(1);
    resonator.set_feedback(0.95);

    let output = process_silence(&mut resonator, 100);
    assert!(output.iter().all(|frame| frame.l == 0.0 && frame.r == 0.0));
}

#[test]
fn burst_rings_the_combs() {
    let mut resonator = resonator(1);
    resonator.set_feedback(0.9);
    resonator.set_burst_duration(1.0);
    resonator.set_trigger(true);

    let output = process_silence(&mut resonator, 200);
    let peak = output
        .iter()
        .map(|frame| frame.l.abs().max(frame.r.abs()))
        .fold(0.0, f32::max);
    assert!(peak > 0.0);
    assert!(output.iter().all(|frame| frame.l.is_finite() && frame.r.is_finite()));
}

#[test]
fn input_excites_active_voice() {
    let mut resonator = resonator(1);
    resonator.set_feedback(0.8);

    let mut block = [FloatFrame::default(); BLOCK_SIZE];
    block[0] = FloatFrame::new(0.5, 0.5);
    resonator.process(&mut block);

    let output = process_silence(&mut resonator, 40);
    assert!(output.iter().any(|frame| frame.l != 0.0));
}

#[test]
fn output_taps_read_comb_tails() {
    let mut resonator = resonator(1);
    resonator.set_burst_duration(1.0);
    resonator.set_trigger(true);

    let output = process_silence(&mut resonator, 40);
    let onset = output
        .iter()
        .position(|frame| frame.l != 0.0 || frame.r != 0.0);

    assert!(matches!(onset, Some(frame) if frame >= MAX_COMB - 1), "{onset:?}");
}

/// Feeds a unit impulse into the active voice with a transparent damping
/// filter and returns the frame where the comb tails reach the output.
fn impulse_response(resonator: &mut Resonator) -> FloatFrame {
    resonator.set_damp(1.0);

    let mut block = [FloatFrame::default(); BLOCK_SIZE];
    block[0] = FloatFrame::new(0.5, 0.5);
    resonator.process(&mut block);
    assert!(block.iter().all(|frame| frame.l == 0.0 && frame.r == 0.0));

    let output = process_silence(resonator, MAX_COMB / BLOCK_SIZE + 1);
    let tap = MAX_COMB - 1 - BLOCK_SIZE;
    assert!(output[..tap].iter().all(|frame| frame.l == 0.0 && frame.r == 0.0));
    assert!(output[tap + 1..].iter().all(|frame| frame.l == 0.0 && frame.r == 0.0));

    output[tap]
}

fn assert_frame(frame: FloatFrame, l: f32, r: f32) {
    assert!((frame.l - l).abs() < 1e-5, "left {} != {l}", frame.l);
    assert!((frame.r - r).abs() < 1e-5, "right {} != {r}", frame.r);
}

#[test]
fn tap_weights_sum_to_unity() {
    // 0.20 + 0.23 + 0.27 + 0.30 on both channels.
    let mut first = resonator(1);
    assert_frame(impulse_response(&mut first), 1.0, 1.0);

    let mut second = resonator(1);
    second.set_trigger(true);
    assert_frame(impulse_response(&mut second), 1.0, 1.0);
}

#[test]
fn stereo_widens_alternate_harmonics() {
    // First voice: odd harmonics widen to the left, even ones to the right.
    let mut first = resonator(1);
    first.set_stereo(1.0);
    assert_frame(impulse_response(&mut first), 0.46 + 0.60, 0.40 + 0.54);

    // Second voice mirrors it.
    let mut second = resonator(1);
    second.set_stereo(1.0);
    second.set_trigger(true);
    assert_frame(impulse_response(&mut second), 0.40 + 0.54, 0.46 + 0.60);
}

#[test]
fn separation_keeps_voices_apart() {
    // First voice only reaches the right channel.
    let mut first = resonator(1);
    first.set_separation(1.0);
    assert_frame(impulse_response(&mut first), 0.0, 1.0);

    // Second voice only reaches the left channel.
    let mut second = resonator(1);
    second.set_separation(1.0);
    second.set_trigger(true);
    assert_frame(impulse_response(&mut second), 1.0, 0.0);

    let mut half = resonator(1);
    half.set_separation(0.5);
    assert_frame(impulse_response(&mut half), 0.5, 1.0);
}

#[test]
fn chord_sequence() {
    let mut resonator = resonator(1);
    let mut wav_data = Vec::new();

    resonator.set_feedback(0.95);
    resonator.set_damp(0.5);
    resonator.set_burst_duration(0.3);
    resonator.set_burst_comb(0.5);
    resonator.set_burst_damp(0.8);
    resonator.set_spread_amount(0.3);
    resonator.set_stereo(0.5);
    resonator.set_separation(0.2);

    let blocks_per_note = (SAMPLE_RATE as usize / 2) / BLOCK_SIZE;

    for (n, pitch) in [0.0, 5.0, 7.0, -5.0].into_iter().enumerate() {
        resonator.set_pitch(pitch);
        resonator.set_chord(n as f32 / 4.0);
        resonator.set_trigger(true);
        wav_data.extend(process_silence(&mut resonator, 1));
        resonator.set_trigger(false);
        wav_data.extend(process_silence(&mut resonator, blocks_per_note));
    }

    assert!(wav_data.iter().all(|frame| frame.l.is_finite() && frame.r.is_finite()));
    assert!(wav_data.iter().any(|frame| frame.l != frame.r));

    wav_writer::write_stereo("fx/resonator_chords.wav", SAMPLE_RATE as u32, &wav_data).ok();
}
