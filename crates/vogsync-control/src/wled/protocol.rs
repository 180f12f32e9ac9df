use serde::{Deserialize, Serialize};
use vogsync_core::Rgb;

use crate::error::{ControlError, Result};

/// Transition time sent with every command, in WLED units of 100 ms
pub const TRANSITION: u32 = 20;

/// Solid color effect
pub const FX_SOLID: u32 = 0;

/// Body of `POST /json/state`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateCommand {
    pub seg: Vec<Segment>,
    pub transition: u32,
}

/// One segment update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: u32,
    pub bri: u8,
    pub col: Vec<[u8; 3]>,
    pub fx: u32,
}

impl StateCommand {
    /// Segment 0 at `brightness` with `color` as its only color slot.
    pub fn new(brightness: u8, color: Rgb) -> Self {
        Self {
            seg: vec![Segment {
                id: 0,
                bri: brightness,
                col: vec![color.to_array()],
                fx: FX_SOLID,
            }],
            transition: TRANSITION,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// State endpoint for a controller base URL. A trailing `/` is tolerated.
pub fn state_url(endpoint: &str) -> Result<String> {
    let base = endpoint.trim().trim_end_matches('/');
    let has_host = base
        .strip_prefix("http://")
        .or_else(|| base.strip_prefix("https://"))
        .is_some_and(|host| !host.is_empty() && !host.contains(char::is_whitespace));
    if !has_host {
        return Err(ControlError::InvalidEndpoint(endpoint.to_string()));
    }
    Ok(format!("{}/json/state", base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let cmd = StateCommand::new(128, Rgb::new(255, 140, 40));
        assert_eq!(
            cmd.to_json().unwrap(),
            r#"{"seg":[{"id":0,"bri":128,"col":[[255,140,40]],"fx":0}],"transition":20}"#
        );
    }

    #[test]
    fn test_parse_back() {
        let cmd: StateCommand = serde_json::from_str(
            r#"{"seg":[{"id":0,"bri":0,"col":[[50,50,80]],"fx":0}],"transition":20}"#,
        )
        .unwrap();
        assert_eq!(cmd, StateCommand::new(0, Rgb::new(50, 50, 80)));
    }

    #[test]
    fn test_state_url() {
        assert_eq!(
            state_url("http://192.168.1.101").unwrap(),
            "http://192.168.1.101/json/state"
        );
        assert_eq!(
            state_url("http://wled.local:8080/").unwrap(),
            "http://wled.local:8080/json/state"
        );
        assert!(matches!(
            state_url("192.168.1.101"),
            Err(ControlError::InvalidEndpoint(_))
        ));
        assert!(state_url("http://").is_err());
    }
}
