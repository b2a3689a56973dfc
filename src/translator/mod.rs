//! Event Translator
//!
//! Turns logical button/axis events into kernel records on a [`DeviceHandle`].
//! Every write is fire-and-forget: invalid handles, unknown buttons and failed
//! writes all end up as no-ops (failed writes are logged). Nothing is synced
//! implicitly; callers batch any number of changes and finish with
//! [`DeviceHandle::send_sync`].

pub mod button_map;

pub use button_map::{kernel_button, keycode, BUTTON_MAP};

use tracing::trace;

use crate::device::uinput_sys::{ABS_RX, ABS_RY, ABS_RZ, ABS_X, ABS_Y, ABS_Z, EV_ABS, EV_KEY};
use crate::device::{DeviceHandle, KernelEventRecord};

/// Axes of the virtual pad, numbered the way the kernel numbers them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    LeftStickX,
    LeftStickY,
    LeftTrigger,
    RightStickX,
    RightStickY,
    RightTrigger,
}

impl Axis {
    pub const fn code(self) -> u16 {
        match self {
            Axis::LeftStickX => ABS_X,
            Axis::LeftStickY => ABS_Y,
            Axis::LeftTrigger => ABS_Z,
            Axis::RightStickX => ABS_RX,
            Axis::RightStickY => ABS_RY,
            Axis::RightTrigger => ABS_RZ,
        }
    }
}

impl From<Axis> for u16 {
    fn from(axis: Axis) -> Self {
        axis.code()
    }
}

/// A single change requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalEvent {
    /// Caller button code (see [`keycode`]) and its new state
    Button { code: i32, pressed: bool },
    /// Kernel axis code and a magnitude already scaled into the axis range
    Axis { code: u16, magnitude: i32 },
}

/// Maps a logical event to its kernel record, `None` for unmapped buttons
///
/// Axis magnitudes are forwarded unchanged, out-of-range values included.
pub fn translate(event: LogicalEvent) -> Option<KernelEventRecord> {
    match event {
        LogicalEvent::Button { code, pressed } => kernel_button(code)
            .map(|kernel| KernelEventRecord::new(EV_KEY, kernel, i32::from(pressed))),
        LogicalEvent::Axis { code, magnitude } => {
            Some(KernelEventRecord::new(EV_ABS, code, magnitude))
        }
    }
}

impl DeviceHandle {
    pub fn send_button(&mut self, code: i32, pressed: bool) {
        self.send(LogicalEvent::Button { code, pressed });
    }

    pub fn send_axis(&mut self, code: u16, magnitude: i32) {
        self.send(LogicalEvent::Axis { code, magnitude });
    }

    /// Writes `{EV_SYN, SYN_REPORT, 0}`, publishing everything written since the last sync
    pub fn send_sync(&mut self) {
        self.write_record(&KernelEventRecord::sync());
    }

    pub fn send(&mut self, event: LogicalEvent) {
        if !self.is_valid() {
            return;
        }

        match translate(event) {
            Some(record) => self.write_record(&record),
            None => trace!("Ignoring unmapped event {:?}", event),
        }
    }
}
