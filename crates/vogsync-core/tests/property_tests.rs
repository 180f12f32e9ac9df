use proptest::prelude::*;
use vogsync_core::analysis::{centroid, loudness};
use vogsync_core::render::{self, zone_center};
use vogsync_core::{AnimationState, BloomField, LiveParameters, Rgb, VisualMode, WaveHead};

const DT: f32 = 0.03;

proptest! {
    #[test]
    fn loudness_stays_in_unit_range(frame in prop::collection::vec(-10.0f32..10.0, 0..2048)) {
        let value = loudness(&frame);
        prop_assert!((0.0..=1.0).contains(&value));
    }

    #[test]
    fn centroid_is_non_negative_and_below_nyquist(
        frame in prop::collection::vec(-1.0f32..1.0, 1..1024),
    ) {
        let c = centroid(&frame, 22050);
        prop_assert!(c >= 0.0);
        prop_assert!(c <= 11025.0 + 1.0);
    }

    #[test]
    fn wave_position_stays_wrapped(
        steps in prop::collection::vec(
            (0.0f32..1.0, prop::bool::ANY, 0.0f32..2000.0, -5.0f32..5.0),
            1..300,
        ),
    ) {
        let mut head = WaveHead::default();
        for (energy, onset, pitch, wave_speed) in steps {
            let strength = if onset { 1.0 } else { 0.0 };
            head.step(DT, energy, strength, pitch, wave_speed);
            prop_assert!(head.position >= 0.0 && head.position < 1.0, "position {}", head.position);
            prop_assert!(head.width > 0.0);
        }
    }

    #[test]
    fn bloom_life_falls_and_radius_grows(scale in 0.0f32..10.0, steps in 1usize..60) {
        let mut field = BloomField::new();
        field.add(0.5, Rgb::new(1, 2, 3), scale);

        let mut prev = *field.iter().next().unwrap();
        for _ in 0..steps {
            field.step(DT);
            match field.iter().next() {
                Some(bloom) => {
                    prop_assert!(bloom.life <= prev.life);
                    prop_assert!(bloom.radius >= prev.radius);
                    prop_assert!(bloom.life > 0.0);
                    prev = *bloom;
                }
                None => {
                    // Removed exactly on the step that took life to <= 0
                    prop_assert!(prev.life - DT * 0.9 <= 0.0);
                    break;
                }
            }
        }
    }

    #[test]
    fn brightness_respects_clip_chain(
        glow in -1.0f32..2.0,
        threshold in -1.0f32..2.0,
        onset in prop::bool::ANY,
        centers in prop::collection::vec(0.0f32..1.0, 0..12),
        zone_count in 1usize..8,
    ) {
        let mut field = BloomField::new();
        for c in centers {
            field.add(c, Rgb::default(), 1.0);
        }
        let state = AnimationState::Bloom(field);
        let params = LiveParameters {
            ambient_glow: glow,
            climax_threshold: threshold,
            ..Default::default()
        };
        let strength = if onset { 1.0 } else { 0.0 };

        for zone in 0..zone_count {
            let value =
                render::compute(zone, zone_count, &state, &params, strength, Rgb::default());
            // Glow alone sets a floor; nothing can exceed full scale
            let floor = (glow.clamp(0.0, 1.0) * 255.0).round() as u8;
            prop_assert!(value.brightness >= floor.saturating_sub(1));
            if strength > threshold {
                let flashed = ((glow.clamp(0.0, 1.0) + 0.2).min(1.0) * 255.0).round() as u8;
                prop_assert!(value.brightness >= flashed.saturating_sub(1));
            }
        }
    }

    #[test]
    fn wave_render_peaks_at_head(position in 0.0f32..1.0, width in 0.04f32..0.24) {
        let head = WaveHead { position, speed: 0.0, width };
        let state = AnimationState::Wave(head);
        let params = LiveParameters { ambient_glow: 0.0, ..Default::default() };
        let under = render::wave_value(&head, position);
        prop_assert!((under - 1.0).abs() < 1e-4);
        for zone in 0..3 {
            let v = render::compute(zone, 3, &state, &params, 0.0, Rgb::default());
            let direct = (render::wave_value(&head, zone_center(zone, 3)) * 255.0).round() as u8;
            prop_assert_eq!(v.brightness, direct);
        }
    }
}

#[test]
fn test_new_state_matches_mode() {
    assert_eq!(AnimationState::new(VisualMode::Wave).mode(), VisualMode::Wave);
    assert_eq!(AnimationState::new(VisualMode::Bloom).mode(), VisualMode::Bloom);
}
