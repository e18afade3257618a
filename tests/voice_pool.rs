//! Tests for the voice pool and scheduler


use fm_resonator_dsp::fm::controllers::Controllers;
use fm_resonator_dsp::fm::lfo::Lfo;
use fm_resonator_dsp::fm::note::VoiceStatus;
use fm_resonator_dsp::fm::patch::Patch;
use fm_resonator_dsp::fm::voice_pool::VoicePool;
use fm_resonator_dsp::fm::{MAX_ACTIVE_NOTES, N};

use spy::{SpyNote, RELEASE_FRAMES};

const SAMPLE_RATE: f32 = 48000.0;
const PITCH: i16 = 60 << 7;

fn setup() -> (VoicePool<SpyNote>, Patch, Lfo) {
    let mut pool = VoicePool::new(SAMPLE_RATE);
    pool.reset(SAMPLE_RATE);

    let mut lfo = Lfo::new();
    lfo.init(SAMPLE_RATE);

    (pool, Patch::new(), lfo)
}

fn compute_frame(pool: &mut VoicePool<SpyNote>) {
    let mut frame = [0; N];
    pool.compute(&mut frame, 0, 0, &Controllers::default());
}

#[test]
fn allocates_round_robin_from_cursor() {
    let (mut pool, patch, mut lfo) = setup();

    for expected in 0..MAX_ACTIVE_NOTES {
        let note = pool.keydown(&patch, &mut lfo, PITCH, 100);
        assert_eq!(note, expected);
        assert_eq!(pool.current_note(), Some((expected + 1) % MAX_ACTIVE_NOTES));
    }

    assert!(pool.voices().iter().all(|voice| voice.keydown() && voice.live()));
    assert_eq!(pool.active_count(), MAX_ACTIVE_NOTES);
}

#[test]
fn skips_held_slots_after_release() {
    let (mut pool, patch, mut lfo) = setup();

    pool.keydown(&patch, &mut lfo, PITCH, 100);
    pool.keydown(&patch, &mut lfo, PITCH, 100);
    assert_eq!(pool.keyup(), Some(0));

    // The cursor moves on rather than reusing the freed slot.
    assert_eq!(pool.keydown(&patch, &mut lfo, PITCH, 100), 2);
}

#[test]
fn steals_oldest_voice_when_full() {
    simple_logger::init_with_level(log::Level::Debug).ok();

    let (mut pool, patch, mut lfo) = setup();

    for _ in 0..MAX_ACTIVE_NOTES {
        pool.keydown(&patch, &mut lfo, PITCH, 100);
    }

    let note = pool.keydown(&patch, &mut lfo, PITCH + 128, 90);
    assert_eq!(note, 0);
    assert_eq!(pool.current_note(), Some(1));
    assert_eq!(pool.active_count(), MAX_ACTIVE_NOTES);

    let stolen = &pool.voices()[0];
    assert_eq!(stolen.synth().inits, 2);
    assert_eq!(stolen.pitch(), PITCH + 128);
    assert_eq!(stolen.velocity(), 90);

    // Nothing else was touched.
    assert!(pool.voices()[1..].iter().all(|voice| voice.synth().inits == 1));
}

#[test]
fn keyup_releases_first_held_slot() {
    let (mut pool, patch, mut lfo) = setup();

    for _ in 0..3 {
        pool.keydown(&patch, &mut lfo, PITCH, 100);
    }

    assert_eq!(pool.keyup(), Some(0));
    assert_eq!(pool.keyup(), Some(1));

    let voices = pool.voices();
    assert!(!voices[0].keydown());
    assert!(!voices[1].keydown());
    assert!(voices[2].keydown());
    assert_eq!(voices[0].synth().keyups, 1);
    assert_eq!(voices[2].synth().keyups, 0);
}

#[test]
fn keyup_without_held_voice_is_a_no_op() {
    simple_logger::init_with_level(log::Level::Trace).ok();

    let (mut pool, _, _) = setup();

    assert_eq!(pool.keyup(), None);
    assert!(pool
        .voices()
        .iter()
        .all(|voice| !voice.keydown() && !voice.live() && voice.synth().keyups == 0));
}

#[test]
fn sustain_defers_release_until_pedal_up() {
    let (mut pool, patch, mut lfo) = setup();

    pool.set_sustain(true);
    pool.keydown(&patch, &mut lfo, PITCH, 100);
    pool.keyup();

    let voice = &pool.voices()[0];
    assert!(!voice.keydown());
    assert!(voice.sustained());
    assert_eq!(voice.synth().keyups, 0);

    // A sustained voice keeps sounding.
    for _ in 0..10 {
        compute_frame(&mut pool);
    }
    assert!(pool.voices()[0].live());

    pool.set_sustain(false);

    let voice = &pool.voices()[0];
    assert!(!voice.sustained());
    assert_eq!(voice.synth().keyups, 1);
}

#[test]
fn pedal_up_keeps_held_keys() {
    let (mut pool, patch, mut lfo) = setup();

    pool.set_sustain(true);
    pool.keydown(&patch, &mut lfo, PITCH, 100);
    pool.set_sustain(false);

    let voice = &pool.voices()[0];
    assert!(voice.keydown());
    assert_eq!(voice.synth().keyups, 0);

    assert_eq!(pool.keyup(), Some(0));
    assert_eq!(pool.voices()[0].synth().keyups, 1);
}

#[test]
fn released_voice_goes_idle_after_decay() {
    let (mut pool, patch, mut lfo) = setup();

    pool.keydown(&patch, &mut lfo, PITCH, 100);
    pool.keyup();

    for _ in 0..RELEASE_FRAMES {
        compute_frame(&mut pool);
        assert!(pool.voices()[0].live());
    }

    compute_frame(&mut pool);
    assert!(!pool.voices()[0].live());
    assert_eq!(pool.active_count(), 0);

    // Idle voices are not computed any more.
    let frames = pool.voices()[0].synth().computed_frames;
    compute_frame(&mut pool);
    assert_eq!(pool.voices()[0].synth().computed_frames, frames);
}

#[test]
fn panic_clears_every_slot() {
    simple_logger::init_with_level(log::Level::Debug).ok();

    let (mut pool, patch, mut lfo) = setup();

    for _ in 0..5 {
        pool.keydown(&patch, &mut lfo, PITCH, 100);
    }

    pool.panic();

    for voice in pool.voices() {
        assert!(!voice.keydown());
        assert!(!voice.live());
        assert_eq!(voice.synth().syncs, 1);
    }

    // Always succeeds, even when nothing is playing.
    pool.panic();
    assert!(pool.voices().iter().all(|voice| voice.synth().syncs == 2));
}

#[test]
fn osc_sync_patch_flag_syncs_new_voices() {
    let (mut pool, mut patch, mut lfo) = setup();

    pool.keydown(&patch, &mut lfo, PITCH, 100);
    assert_eq!(pool.voices()[0].synth().syncs, 0);

    patch.osc_sync = true;
    pool.keydown(&patch, &mut lfo, PITCH, 100);
    assert_eq!(pool.voices()[1].synth().syncs, 1);
}

#[test]
fn normalized_velocity() {
    let (mut pool, patch, mut lfo) = setup();

    pool.keydown(&patch, &mut lfo, PITCH, 127);
    assert_eq!(pool.voices()[0].velocity(), 127);

    pool.set_normalize_velocity(true);
    pool.keydown(&patch, &mut lfo, PITCH, 127);
    let velocity = pool.voices()[1].velocity();
    assert!((99..=100).contains(&velocity));
    assert_eq!(pool.voices()[1].synth().velocity, velocity);
}

#[test]
fn pitch_update_only_retunes_live_voices() {
    let (mut pool, patch, mut lfo) = setup();

    pool.keydown(&patch, &mut lfo, PITCH, 100);
    pool.update_pitch(PITCH + 256);

    let voices = pool.voices();
    assert!(voices.iter().all(|voice| voice.pitch() == PITCH + 256));
    assert_eq!(voices[0].synth().pitch, PITCH + 256);
    assert_eq!(voices[1].synth().pitch, 0);
}

#[test]
fn refresh_updates_live_voices() {
    let (mut pool, patch, mut lfo) = setup();

    pool.keydown(&patch, &mut lfo, PITCH, 100);
    pool.refresh(&patch, PITCH);

    assert_eq!(pool.voices()[0].synth().updates, 1);
    assert_eq!(pool.voices()[1].synth().updates, 0);
}

#[test]
fn peek_prefers_held_then_live_voices() {
    let mut pool = VoicePool::<SpyNote>::new(SAMPLE_RATE);
    let patch = Patch::new();
    let mut lfo = Lfo::new();
    lfo.init(SAMPLE_RATE);
    let mut status = VoiceStatus::default();

    // Cursor unset.
    assert!(!pool.peek_status(&mut status));
    assert_eq!(status, VoiceStatus::default());

    pool.reset(SAMPLE_RATE);
    assert!(!pool.peek_status(&mut status));

    pool.keydown(&patch, &mut lfo, 1000, 100);
    pool.keydown(&patch, &mut lfo, 2000, 100);
    pool.keydown(&patch, &mut lfo, 3000, 100);

    // Most recent held voice first.
    assert!(pool.peek_status(&mut status));
    assert_eq!(status.amp[0], 3000.0);

    // Releasing the first two leaves slot 2 held.
    pool.keyup();
    pool.keyup();
    assert!(pool.peek_status(&mut status));
    assert_eq!(status.amp[0], 3000.0);

    pool.keyup();
    pool.keydown(&patch, &mut lfo, 4000, 100);
    pool.keyup();

    // Nothing held: the most recent live voice is reported.
    assert!(pool.peek_status(&mut status));
    assert_eq!(status.amp[0], 4000.0);

    pool.release();
    assert!(!pool.peek_status(&mut status));
}
