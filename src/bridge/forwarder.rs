use std::collections::BTreeSet;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::collector::{ButtonState, JoystickType, RawControllerEvent, TriggerType};
use crate::translator::{Axis, LogicalEvent};
use crate::virtual_controller::VirtualXboxController;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForwarderSettings {
    pub invert_left_y: bool,
    pub invert_right_y: bool,
}

/// Replays collector events on the virtual pad
///
/// Sticks and triggers are written as pairs, so the forwarder keeps the last
/// value of every axis. Held buttons are tracked to release them when the
/// physical pad goes away.
#[derive(Debug)]
pub struct Forwarder {
    controller: VirtualXboxController,
    settings: ForwarderSettings,
    left_stick: (f32, f32),
    right_stick: (f32, f32),
    triggers: (f32, f32),
    held: BTreeSet<i32>,
}

impl Forwarder {
    pub fn new(controller: VirtualXboxController, settings: ForwarderSettings) -> Self {
        Self {
            controller,
            settings,
            left_stick: (0.0, 0.0),
            right_stick: (0.0, 0.0),
            triggers: (0.0, 0.0),
            held: BTreeSet::new(),
        }
    }

    pub fn handle_event(&mut self, event: RawControllerEvent) {
        match event {
            RawControllerEvent::Button { code, state, .. } => match state {
                ButtonState::Pressed => {
                    self.held.insert(code);
                    self.controller.press(code);
                }
                ButtonState::Released => {
                    self.held.remove(&code);
                    self.controller.release(code);
                }
            },
            RawControllerEvent::Stick { stick, x, y, .. } => {
                match stick {
                    JoystickType::Left => {
                        let y = if self.settings.invert_left_y { -y } else { y };
                        self.left_stick = (x, y);
                    }
                    JoystickType::Right => {
                        let y = if self.settings.invert_right_y { -y } else { y };
                        self.right_stick = (x, y);
                    }
                }
                let (lx, ly) = self.left_stick;
                let (rx, ry) = self.right_stick;
                self.controller.set_sticks(lx, ly, rx, ry);
            }
            RawControllerEvent::Trigger { trigger, value, .. } => {
                match trigger {
                    TriggerType::Left => self.triggers.0 = value,
                    TriggerType::Right => self.triggers.1 = value,
                }
                let (left, right) = self.triggers;
                self.controller.set_triggers(left, right);
            }
            RawControllerEvent::Disconnected { .. } => {
                warn!("Physical gamepad lost, releasing virtual pad");
                self.neutralize();
            }
        }
    }

    /// Releases held buttons and centres every axis in one update
    pub fn neutralize(&mut self) {
        let mut events: Vec<LogicalEvent> = self
            .held
            .iter()
            .map(|&code| LogicalEvent::Button { code, pressed: false })
            .collect();

        for axis in [
            Axis::LeftStickX,
            Axis::LeftStickY,
            Axis::RightStickX,
            Axis::RightStickY,
            Axis::LeftTrigger,
            Axis::RightTrigger,
        ] {
            events.push(LogicalEvent::Axis { code: axis.code(), magnitude: 0 });
        }

        debug!("Neutralizing virtual pad, {} buttons held", self.held.len());
        self.controller.apply(&events);

        self.held.clear();
        self.left_stick = (0.0, 0.0);
        self.right_stick = (0.0, 0.0);
        self.triggers = (0.0, 0.0);
    }

    /// Forwards until cancelled or the collector hangs up, then destroys the pad
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<RawControllerEvent>,
        cancel: CancellationToken,
    ) {
        info!("Forwarder started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Forwarder cancelled");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        info!("Collector channel closed");
                        break;
                    }
                }
            }
        }

        self.neutralize();
        self.controller.destroy();
        info!("Forwarder stopped");
    }
}
