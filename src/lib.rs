//! Virtual Xbox One controller on Linux uinput
//!
//! [`device`] registers the pad with the kernel, [`translator`] turns logical
//! button and axis changes into kernel records, [`virtual_controller`] wraps
//! both into a per-session object and [`bridge`] feeds it from a physical
//! gamepad.

pub mod bridge;
pub mod config;
pub mod device;
pub mod translator;
pub mod virtual_controller;

pub use device::{create_device, destroy_device, DeviceError, DeviceHandle};
pub use translator::{keycode, Axis, LogicalEvent};
pub use virtual_controller::VirtualXboxController;
