//! Zone rendering
//!
//! Zones sit at evenly spaced centers on a unit ring. [`compute`] turns the
//! current animation state into a brightness for one zone, adds the ambient glow
//! and the climax flash, and pairs it with the frame color.

use serde::{Deserialize, Serialize};

use crate::analysis::Rgb;
use crate::animation::{AnimationState, BloomField, WaveHead};
use crate::params::LiveParameters;

/// Brightness added on frames whose onset strength exceeds `climax_threshold`
pub const CLIMAX_BOOST: f32 = 0.2;

/// Bloom falloff: value = exp(-(distance * BLOOM_FALLOFF)^2) * life
pub const BLOOM_FALLOFF: f32 = 6.0;

/// Output for one zone in one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneValue {
    pub brightness: u8,
    pub color: Rgb,
}

/// Center of zone `index` out of `count`.
pub fn zone_center(index: usize, count: usize) -> f32 {
    (index as f32 + 0.5) / count.max(1) as f32
}

/// Animation value (0.0 - 1.0) of a wave head at `center`.
pub fn wave_value(head: &WaveHead, center: f32) -> f32 {
    let d = ((head.position - center + 0.5).rem_euclid(1.0) - 0.5)
        .abs()
        .clamp(0.0, 0.5);
    let sigma = head.width;
    (-(d * d) / (2.0 * sigma * sigma)).exp()
}

/// Animation value (0.0 - 1.0) of all live blooms at `center`.
pub fn bloom_value(field: &BloomField, center: f32) -> f32 {
    let total: f32 = field
        .iter()
        .map(|bloom| {
            let d = (center - bloom.center).abs() * BLOOM_FALLOFF;
            ((-(d * d)).exp() * bloom.life).clamp(0.0, 1.0)
        })
        .sum();
    total.clamp(0.0, 1.0)
}

/// Compute one zone's value.
///
/// Pure: the result depends only on the arguments.
pub fn compute(
    zone_index: usize,
    zone_count: usize,
    state: &AnimationState,
    params: &LiveParameters,
    onset_strength: f32,
    frame_color: Rgb,
) -> ZoneValue {
    let center = zone_center(zone_index, zone_count);

    let mut value = match state {
        AnimationState::Wave(head) => wave_value(head, center),
        AnimationState::Bloom(field) => bloom_value(field, center),
    };

    value = (value + params.ambient_glow).clamp(0.0, 1.0);

    if onset_strength > params.climax_threshold {
        value = (value + CLIMAX_BOOST).min(1.0);
    }

    ZoneValue {
        brightness: to_brightness(value),
        color: frame_color,
    }
}

/// Scale a value to 0-255, rounding. NaN maps to 0.
fn to_brightness(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
