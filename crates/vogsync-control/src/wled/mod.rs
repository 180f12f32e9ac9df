//! WLED JSON API output
//!
//! Each zone maps to one WLED controller. A frame sets segment 0's brightness and
//! primary color with the solid effect and a short transition.

pub mod dispatcher;
pub mod protocol;

pub use dispatcher::WledDispatcher;
pub use protocol::{state_url, Segment, StateCommand, TRANSITION};
