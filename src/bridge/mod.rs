//! Physical-to-virtual gamepad bridge
//!
//! Implements a two-stage forwarding pipeline:
//!
//! 1. [`collector`] - Raw gamepad input collection via gilrs, routed by [`router`]
//! 2. [`forwarder`] - Replays the input on the virtual Xbox pad
//!
//! # Architecture
//!
//! ```text
//! Gamepad(s) ──► Collector ──► mpsc ──► Forwarder ──► VirtualXboxController ──► /dev/uinput
//!                (blocking)             (async)
//! ```
//!
//! Both stages stop on the shared cancellation token. The collector also
//! stops once the forwarder hangs up, and the forwarder destroys the virtual
//! pad on its way out.

pub mod collector;
pub mod forwarder;
pub mod input_map;
pub mod router;

pub use collector::{CollectorError, CollectorHandle, CollectorSettings, RawControllerEvent};
pub use forwarder::{Forwarder, ForwarderSettings};
pub use router::PadMode;
