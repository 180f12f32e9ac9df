//! vogsync Control - Lighting Controller Output
//!
//! Best-effort delivery of per-zone brightness/color commands to WLED controllers:
//! - **Protocol**: the JSON state command understood by WLED's `/json/state`
//! - **Dispatch**: the [`ZoneDispatch`] seam plus concurrent per-frame fan-out
//! - **WLED**: an HTTP dispatcher with a shared client and per-command timeout
//!
//! Delivery failures never reach the caller. They are logged at `debug` and
//! counted in [`DispatchStats`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vogsync_control::{WledDispatcher, ZoneDispatch};
//! use vogsync_core::Rgb;
//!
//! # async fn demo() -> vogsync_control::Result<()> {
//! let dispatcher = WledDispatcher::new(Duration::from_millis(200))?;
//! dispatcher
//!     .send("http://192.168.1.101", 128, Rgb::new(255, 140, 40))
//!     .await;
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]

/// Error types
pub mod error;
/// Dispatcher trait and per-frame fan-out
pub mod dispatch;
/// WLED JSON API
pub mod wled;

// Re-exports
pub use dispatch::{dispatch_all, DispatchStats, StatsSnapshot, ZoneCommand, ZoneDispatch};
pub use error::{ControlError, Result};
pub use wled::{StateCommand, WledDispatcher};
