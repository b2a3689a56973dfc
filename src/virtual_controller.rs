//! Stateful wrapper around one virtual pad
//!
//! Owns the [`DeviceHandle`] for a controller session and offers the
//! operations an input bridge actually needs: press/release with an immediate
//! sync, normalized stick and trigger updates, and explicit batches. Every
//! method is a no-op until [`VirtualXboxController::create`] succeeded.

use tracing::{debug, info};

use crate::device::capabilities::{STICK_CALIBRATION, TRIGGER_CALIBRATION};
use crate::device::{create_device_with_settings, DeviceError, DeviceHandle, DeviceSettings};
use crate::translator::{Axis, LogicalEvent};

/// Scales a normalized stick value (`-1.0..=1.0`) into the stick range
///
/// Truncates toward zero, so full deflection maps to ±32767.
pub fn scale_stick(value: f32) -> i32 {
    (value.clamp(-1.0, 1.0) * STICK_CALIBRATION.maximum as f32) as i32
}

/// Scales a normalized trigger value (`0.0..=1.0`) into the trigger range
pub fn scale_trigger(value: f32) -> i32 {
    (value.clamp(0.0, 1.0) * TRIGGER_CALIBRATION.maximum as f32) as i32
}

#[derive(Debug, Default)]
pub struct VirtualXboxController {
    settings: DeviceSettings,
    handle: DeviceHandle,
}

impl VirtualXboxController {
    pub fn new(settings: DeviceSettings) -> Self {
        Self {
            settings,
            handle: DeviceHandle::invalid(),
        }
    }

    /// Wraps a handle created elsewhere
    pub fn from_handle(handle: DeviceHandle) -> Self {
        Self {
            settings: DeviceSettings::default(),
            handle,
        }
    }

    /// Creates the device unless it already exists
    pub fn create(&mut self) -> Result<(), DeviceError> {
        if self.handle.is_valid() {
            debug!("Virtual controller already created");
            return Ok(());
        }

        self.handle = create_device_with_settings(&self.settings)?;
        info!("Virtual controller ready");
        Ok(())
    }

    pub fn is_created(&self) -> bool {
        self.handle.is_valid()
    }

    pub fn press(&mut self, code: i32) {
        self.handle.send_button(code, true);
        self.handle.send_sync();
    }

    pub fn release(&mut self, code: i32) {
        self.handle.send_button(code, false);
        self.handle.send_sync();
    }

    /// Writes both sticks as one update
    pub fn set_sticks(&mut self, left_x: f32, left_y: f32, right_x: f32, right_y: f32) {
        self.apply(&[
            LogicalEvent::Axis { code: Axis::LeftStickX.code(), magnitude: scale_stick(left_x) },
            LogicalEvent::Axis { code: Axis::LeftStickY.code(), magnitude: scale_stick(left_y) },
            LogicalEvent::Axis { code: Axis::RightStickX.code(), magnitude: scale_stick(right_x) },
            LogicalEvent::Axis { code: Axis::RightStickY.code(), magnitude: scale_stick(right_y) },
        ]);
    }

    pub fn set_triggers(&mut self, left: f32, right: f32) {
        self.apply(&[
            LogicalEvent::Axis { code: Axis::LeftTrigger.code(), magnitude: scale_trigger(left) },
            LogicalEvent::Axis { code: Axis::RightTrigger.code(), magnitude: scale_trigger(right) },
        ]);
    }

    /// Writes every event, then a single sync
    pub fn apply(&mut self, events: &[LogicalEvent]) {
        if !self.handle.is_valid() {
            return;
        }
        for event in events {
            self.handle.send(*event);
        }
        self.handle.send_sync();
    }

    pub fn destroy(&mut self) {
        self.handle.destroy();
    }
}
