//! Fade-out tail run after the last audio frame

use vogsync_control::ZoneCommand;
use vogsync_core::Rgb;

/// Color of every fade step and of the stop command
pub const DIM: Rgb = Rgb::new(50, 50, 80);

/// `steps` factors evenly spaced from 1.0 down to 0.0 inclusive.
///
/// One step gives `[1.0]`; zero steps give nothing.
pub fn fade_factors(steps: usize) -> Vec<f32> {
    match steps {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let last = (steps - 1) as f32;
            (0..steps).map(|i| 1.0 - i as f32 / last).collect()
        }
    }
}

/// Brightness of a fade step, truncated.
pub fn fade_brightness(last: u8, factor: f32) -> u8 {
    (last as f32 * factor.clamp(0.0, 1.0)) as u8
}

/// Commands for one fade step.
pub fn fade_step(endpoints: &[String], last: &[u8], factor: f32) -> Vec<ZoneCommand> {
    endpoints
        .iter()
        .zip(last)
        .map(|(endpoint, &bri)| {
            ZoneCommand::new(endpoint.clone(), fade_brightness(bri, factor), DIM)
        })
        .collect()
}

/// Final command sent to every zone when a session is stopped.
pub fn off_commands(endpoints: &[String]) -> Vec<ZoneCommand> {
    endpoints
        .iter()
        .map(|endpoint| ZoneCommand::new(endpoint.clone(), 0, DIM))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twelve_factors() {
        let factors = fade_factors(12);
        assert_eq!(factors.len(), 12);
        assert_eq!(factors[0], 1.0);
        assert_eq!(factors[11], 0.0);
        assert!(factors.windows(2).all(|w| w[0] > w[1]));
        assert!((factors[1] - (1.0 - 1.0 / 11.0)).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_step_counts() {
        assert!(fade_factors(0).is_empty());
        assert_eq!(fade_factors(1), vec![1.0]);
        assert_eq!(fade_factors(2), vec![1.0, 0.0]);
    }

    #[test]
    fn test_brightness_truncates() {
        assert_eq!(fade_brightness(20, 1.0), 20);
        assert_eq!(fade_brightness(20, 0.99), 19);
        assert_eq!(fade_brightness(255, 0.5), 127);
        assert_eq!(fade_brightness(255, 0.0), 0);
    }

    #[test]
    fn test_step_commands() {
        let endpoints = vec!["http://a".to_string(), "http://b".to_string()];
        let cmds = fade_step(&endpoints, &[200, 100], 0.5);
        assert_eq!(cmds[0], ZoneCommand::new("http://a", 100, DIM));
        assert_eq!(cmds[1], ZoneCommand::new("http://b", 50, DIM));
        assert!(off_commands(&endpoints).iter().all(|c| c.brightness == 0 && c.color == DIM));
    }
}
