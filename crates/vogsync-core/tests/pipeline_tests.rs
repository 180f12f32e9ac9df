//! Frame pipeline scenarios: analysis -> animation -> rendering, no I/O.

use vogsync_core::analysis::{color_from_centroid, COOL, WARM};
use vogsync_core::render;
use vogsync_core::{
    detector_for, AnimationState, AudioSource, FrameAnalyzer, LiveParameters, MemorySource,
    PlayerConfig, Rgb, VisualMode, WavSource,
};

const SR: u32 = 22050;

/// Run every full frame of `samples` through the pipeline, collecting zone brightness.
fn run_frames(
    samples: &[f32],
    mode: VisualMode,
    params: &LiveParameters,
    onset_detection: bool,
) -> Vec<Vec<u8>> {
    let config = PlayerConfig::default();
    let frame_len = config.frame_len(SR);
    let dt = config.frame_period().as_secs_f32();
    let zones = config.active_zones();

    let mut analyzer = FrameAnalyzer::new(frame_len, SR);
    let mut detector = detector_for(onset_detection, frame_len, SR);
    let mut state = AnimationState::new(mode);

    let mut out = Vec::new();
    let mut idx = 0;
    while idx + frame_len < samples.len() {
        let frame = &samples[idx..idx + frame_len];
        let features = analyzer
            .analyze(frame, params.color_shift)
            .unwrap()
            .with_detection(detector.onset(frame), detector.pitch(frame));
        state.advance(dt, &features, SR, params);
        out.push(
            (0..zones)
                .map(|z| {
                    let strength = features.onset_strength;
                    render::compute(z, zones, &state, params, strength, features.color).brightness
                })
                .collect(),
        );
        idx += frame_len;
    }
    out
}

#[test]
fn test_silence_renders_ambient_glow_everywhere() {
    let silence = vec![0.0f32; SR as usize];
    let params = LiveParameters::default();

    let frames = run_frames(&silence, VisualMode::Bloom, &params, true);
    // 1 s at 661 samples per frame with a strict bound: 33 full frames
    assert_eq!(frames.len(), 33);
    let glow = (params.ambient_glow * 255.0).round() as u8;
    for zones in &frames {
        assert_eq!(zones, &vec![glow; 3]);
    }
}

#[test]
fn test_exact_multiple_of_frame_len_drops_last_frame() {
    let frame_len = PlayerConfig::default().frame_len(SR);
    let samples = vec![0.0f32; frame_len * 4];
    let frames = run_frames(&samples, VisualMode::Wave, &LiveParameters::default(), false);
    assert_eq!(frames.len(), 3);
}

#[test]
fn test_forced_onset_spawns_centered_bloom() {
    let params = LiveParameters {
        bloom_scale: 1.5,
        color_shift: 0.0,
        ..Default::default()
    };
    let mut analyzer = FrameAnalyzer::new(661, SR);
    let mut state = AnimationState::new(VisualMode::Bloom);

    let mut features = analyzer
        .analyze(&vec![0.0; 661], params.color_shift)
        .unwrap()
        .with_detection(true, 0.0);
    features.centroid = SR as f32 / 4.0;
    features.color = color_from_centroid(features.centroid, SR, params.color_shift);

    state.advance(0.03, &features, SR, &params);

    let AnimationState::Bloom(field) = &state else {
        panic!("expected bloom state");
    };
    assert_eq!(field.len(), 1);
    let bloom = field.iter().next().unwrap();
    assert_eq!(bloom.center, 0.5);
    assert_eq!(bloom.life, 1.0);
    assert!((bloom.radius - 0.03).abs() < 1e-6);
    assert_eq!(bloom.color, features.color);
}

#[test]
fn test_color_endpoints_without_shift() {
    assert_eq!(color_from_centroid(0.0, SR, 0.0), WARM);
    assert_eq!(color_from_centroid(SR as f32 / 2.0, SR, 0.0), COOL);
    assert_eq!(color_from_centroid(SR as f32 * 4.0, SR, 0.0), COOL);
}

#[test]
fn test_loud_tone_raises_brightness_in_wave_mode() {
    // Wave mode with no onsets: the head parks at 0 and widens with loudness,
    // so the zone nearest position 0 brightens relative to silence.
    let params = LiveParameters {
        ambient_glow: 0.0,
        ..Default::default()
    };
    let tone: Vec<f32> = (0..SR as usize)
        .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / SR as f32).sin())
        .collect();
    let silence = vec![0.0f32; SR as usize];

    let loud = run_frames(&tone, VisualMode::Wave, &params, false);
    let quiet = run_frames(&silence, VisualMode::Wave, &params, false);
    let last = loud.len() - 1;
    assert!(loud[last][0] > quiet[last][0]);
    assert_eq!(loud[last][0], loud[last][2]);
}

#[test]
fn test_memory_source_feeds_pipeline() {
    let source = MemorySource::new(vec![0.0; 2000], SR).unwrap();
    let audio = source.load().unwrap();
    assert_eq!(audio.sample_rate(), SR);
    let frames = run_frames(audio.samples(), VisualMode::Bloom, &LiveParameters::default(), true);
    assert_eq!(frames.len(), 3);
}

#[test]
fn test_wav_stereo_is_downmixed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..100 {
        writer.write_sample(16384i16).unwrap();
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    let audio = WavSource::new(&path).load().unwrap();
    assert_eq!(audio.sample_rate(), 8000);
    assert_eq!(audio.len(), 100);
    for &s in audio.samples() {
        assert!((s - 0.25).abs() < 1e-4);
    }
}

#[test]
fn test_float_wav_is_read_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mono.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for s in [0.5f32, -0.5, 0.125] {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();

    let audio = WavSource::new(&path).load().unwrap();
    assert_eq!(audio.samples(), &[0.5f32, -0.5, 0.125][..]);
}

#[test]
fn test_frame_color_passes_through_to_zones() {
    let state = AnimationState::new(VisualMode::Bloom);
    let color = Rgb::new(1, 2, 3);
    let value = render::compute(2, 3, &state, &LiveParameters::default(), 0.0, color);
    assert_eq!(value.color, color);
}
