//! Which physical pads feed the virtual one, and how their input is converted
//!
//! Nothing here touches a `Gilrs` context: pads are described by [`PadInfo`]
//! and identified by any copyable id, so the routing rules are testable
//! without hardware.
//!
//! ```text
//! Single      any one physical pad ──────────────────────────► both sticks
//! JoyConPair  left half  ─► left stick, L-side buttons ──┐
//!             right half ─► right stick, R-side buttons ─┴──► one pad, once both are present
//! ```

use chrono::{DateTime, Local};
use gilrs::{Axis, Button, EventType, Gamepad};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::collector::{apply_deadzone, ButtonState, JoystickType, RawControllerEvent, TriggerType};
use super::input_map::caller_code;
use crate::device::XBOX_ONE_IDENTITY;

/// How physical pads are combined into the virtual one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadMode {
    /// Forward one physical pad
    #[default]
    Single,
    /// Merge a left and a right Joy-Con
    JoyConPair,
}

/// Part an adopted pad plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadRole {
    Single,
    LeftHalf,
    RightHalf,
}

/// What the bridge knows about a connected pad
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PadInfo {
    /// Mapping name, which may come from an SDL mapping
    pub name: String,
    /// Name reported by the kernel
    pub os_name: String,
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
}

impl PadInfo {
    pub fn from_gamepad(gamepad: &Gamepad<'_>) -> Self {
        Self {
            name: gamepad.name().to_string(),
            os_name: gamepad.os_name().to_string(),
            vendor_id: gamepad.vendor_id(),
            product_id: gamepad.product_id(),
        }
    }

    /// Our own virtual pad, recognised by kernel name and USB ids
    ///
    /// The mapping name can't be used: an Xbox One SDL mapping renames the
    /// virtual pad like any real one.
    pub fn is_virtual(&self) -> bool {
        if self.os_name != XBOX_ONE_IDENTITY.name {
            return false;
        }
        match (self.vendor_id, self.product_id) {
            (Some(vendor), Some(product)) => {
                vendor == XBOX_ONE_IDENTITY.vendor && product == XBOX_ONE_IDENTITY.product
            }
            _ => true,
        }
    }

    /// Which half of a Joy-Con pair this pad is, if any
    ///
    /// Matches both the kernel names ("Nintendo Switch Left Joy-Con") and the
    /// mapping names ("Joy-Con (L)"). The combined "(L/R)" device is neither.
    pub fn joycon_side(&self) -> Option<PadRole> {
        [&self.os_name, &self.name]
            .into_iter()
            .find_map(|name| joycon_side_of(name))
    }
}

fn joycon_side_of(name: &str) -> Option<PadRole> {
    let name = name.to_lowercase();
    if !(name.contains("joy-con") || name.contains("joycon")) {
        return None;
    }

    if name.contains("left") || name.contains("(l)") {
        Some(PadRole::LeftHalf)
    } else if name.contains("right") || name.contains("(r)") {
        Some(PadRole::RightHalf)
    } else {
        None
    }
}

/// Index into `pads` of the pad to forward in single mode
///
/// `preferred` counts physical pads only, so index 0 is always the first real
/// controller regardless of where the virtual pad enumerates.
pub fn select_gamepad(pads: &[PadInfo], preferred: Option<usize>) -> Option<usize> {
    let mut physical = pads
        .iter()
        .enumerate()
        .filter(|(_, pad)| !pad.is_virtual())
        .map(|(idx, _)| idx);

    match preferred {
        Some(n) => physical.nth(n),
        None => physical.next(),
    }
}

/// The subset of gilrs input the converter understands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PadInput {
    Axis(Axis, f32),
    Analog(Button, f32),
    Pressed(Button),
    Released(Button),
    Repeated(Button),
}

impl PadInput {
    pub fn from_event(event: EventType) -> Option<Self> {
        match event {
            EventType::AxisChanged(axis, value, _) => Some(PadInput::Axis(axis, value)),
            EventType::ButtonChanged(button, value, _) => Some(PadInput::Analog(button, value)),
            EventType::ButtonPressed(button, _) => Some(PadInput::Pressed(button)),
            EventType::ButtonReleased(button, _) => Some(PadInput::Released(button)),
            EventType::ButtonRepeated(button, _) => Some(PadInput::Repeated(button)),
            _ => None,
        }
    }
}

/// Turns pad input into raw events, remembering the last position of each stick
#[derive(Debug, Clone)]
pub struct EventConverter {
    deadzone: f32,
    left_stick: (f32, f32),
    right_stick: (f32, f32),
}

impl EventConverter {
    pub fn new(deadzone: f32) -> Self {
        Self {
            deadzone,
            left_stick: (0.0, 0.0),
            right_stick: (0.0, 0.0),
        }
    }

    pub fn reset(&mut self) {
        self.left_stick = (0.0, 0.0);
        self.right_stick = (0.0, 0.0);
    }

    pub fn convert(
        &mut self,
        role: PadRole,
        input: PadInput,
        timestamp: DateTime<Local>,
    ) -> Option<RawControllerEvent> {
        match input {
            PadInput::Axis(Axis::LeftZ, value) => Some(RawControllerEvent::Trigger {
                trigger: TriggerType::Left,
                value,
                timestamp,
            }),
            PadInput::Axis(Axis::RightZ, value) => Some(RawControllerEvent::Trigger {
                trigger: TriggerType::Right,
                value,
                timestamp,
            }),
            PadInput::Axis(axis, value) => self.stick(role, axis, value, timestamp),
            PadInput::Analog(Button::LeftTrigger2, value) => Some(RawControllerEvent::Trigger {
                trigger: TriggerType::Left,
                value,
                timestamp,
            }),
            PadInput::Analog(Button::RightTrigger2, value) => Some(RawControllerEvent::Trigger {
                trigger: TriggerType::Right,
                value,
                timestamp,
            }),
            // Digital buttons report 0.0/1.0 here as well; pressed/released covers them
            PadInput::Analog(..) => None,
            PadInput::Pressed(button) => button_event(button, ButtonState::Pressed, timestamp),
            PadInput::Released(button) => button_event(button, ButtonState::Released, timestamp),
            PadInput::Repeated(button) => {
                debug!("Button repeat ignored: {:?}", button);
                None
            }
        }
    }

    fn stick(
        &mut self,
        role: PadRole,
        axis: Axis,
        value: f32,
        timestamp: DateTime<Local>,
    ) -> Option<RawControllerEvent> {
        let (native, is_x) = match axis {
            Axis::LeftStickX => (JoystickType::Left, true),
            Axis::LeftStickY => (JoystickType::Left, false),
            Axis::RightStickX => (JoystickType::Right, true),
            Axis::RightStickY => (JoystickType::Right, false),
            _ => {
                debug!("Ignoring unsupported axis: {:?}", axis);
                return None;
            }
        };

        // A Joy-Con half has a single stick, whichever axes it reports it on
        let stick = match role {
            PadRole::Single => native,
            PadRole::LeftHalf => JoystickType::Left,
            PadRole::RightHalf => JoystickType::Right,
        };

        let value = apply_deadzone(value, self.deadzone);
        let pair = match stick {
            JoystickType::Left => &mut self.left_stick,
            JoystickType::Right => &mut self.right_stick,
        };
        if is_x {
            pair.0 = value;
        } else {
            pair.1 = value;
        }

        let (x, y) = *pair;
        Some(RawControllerEvent::Stick {
            stick,
            x,
            y,
            timestamp,
        })
    }
}

fn button_event(
    button: Button,
    state: ButtonState,
    timestamp: DateTime<Local>,
) -> Option<RawControllerEvent> {
    match caller_code(button) {
        Some(code) => {
            debug!(
                "Button {:?} {:?} at {}",
                button,
                state,
                timestamp.format("%H:%M:%S.%3f")
            );
            Some(RawControllerEvent::Button {
                code,
                state,
                timestamp,
            })
        }
        None => {
            debug!("Unmapped button ignored: {:?}", button);
            None
        }
    }
}

/// Adopted pads plus the converter fed by them
#[derive(Debug)]
pub struct PadRouter<Id> {
    mode: PadMode,
    single: Option<Id>,
    left: Option<Id>,
    right: Option<Id>,
    converter: EventConverter,
}

impl<Id: Copy + Eq> PadRouter<Id> {
    pub fn new(mode: PadMode, deadzone: f32) -> Self {
        Self {
            mode,
            single: None,
            left: None,
            right: None,
            converter: EventConverter::new(deadzone),
        }
    }

    pub fn mode(&self) -> PadMode {
        self.mode
    }

    /// Adopts from the pads present at startup; returns what was adopted
    ///
    /// `preferred` only applies in single mode.
    pub fn adopt_initial(
        &mut self,
        pads: &[(Id, PadInfo)],
        preferred: Option<usize>,
    ) -> Vec<(Id, PadRole)> {
        match self.mode {
            PadMode::Single => {
                let infos: Vec<PadInfo> = pads.iter().map(|(_, info)| info.clone()).collect();
                match select_gamepad(&infos, preferred) {
                    Some(idx) => {
                        let id = pads[idx].0;
                        self.single = Some(id);
                        vec![(id, PadRole::Single)]
                    }
                    None => Vec::new(),
                }
            }
            PadMode::JoyConPair => pads
                .iter()
                .filter_map(|(id, info)| self.connected(*id, info).map(|role| (*id, role)))
                .collect(),
        }
    }

    /// Offers a newly connected pad; returns its role when adopted
    pub fn connected(&mut self, id: Id, info: &PadInfo) -> Option<PadRole> {
        if let Some(role) = self.role(id) {
            return Some(role);
        }
        if info.is_virtual() {
            debug!("Skipping virtual pad {}", info.os_name);
            return None;
        }

        match self.mode {
            PadMode::Single if self.single.is_none() => {
                self.single = Some(id);
                Some(PadRole::Single)
            }
            PadMode::Single => None,
            PadMode::JoyConPair => match info.joycon_side() {
                Some(PadRole::LeftHalf) if self.left.is_none() => {
                    self.left = Some(id);
                    Some(PadRole::LeftHalf)
                }
                Some(PadRole::RightHalf) if self.right.is_none() => {
                    self.right = Some(id);
                    Some(PadRole::RightHalf)
                }
                _ => None,
            },
        }
    }

    pub fn role(&self, id: Id) -> Option<PadRole> {
        if self.single == Some(id) {
            Some(PadRole::Single)
        } else if self.left == Some(id) {
            Some(PadRole::LeftHalf)
        } else if self.right == Some(id) {
            Some(PadRole::RightHalf)
        } else {
            None
        }
    }

    /// Whether every pad the mode needs is adopted
    pub fn is_complete(&self) -> bool {
        match self.mode {
            PadMode::Single => self.single.is_some(),
            PadMode::JoyConPair => self.left.is_some() && self.right.is_some(),
        }
    }

    /// Drops an adopted pad; `Disconnected` when it was one
    pub fn disconnected(&mut self, id: Id, timestamp: DateTime<Local>) -> Option<RawControllerEvent> {
        let slot = match self.role(id)? {
            PadRole::Single => &mut self.single,
            PadRole::LeftHalf => &mut self.left,
            PadRole::RightHalf => &mut self.right,
        };
        *slot = None;
        self.converter.reset();
        Some(RawControllerEvent::Disconnected { timestamp })
    }

    /// Converts input from an adopted pad; dropped until the mode is complete
    pub fn input(
        &mut self,
        id: Id,
        input: PadInput,
        timestamp: DateTime<Local>,
    ) -> Option<RawControllerEvent> {
        let role = self.role(id)?;
        if !self.is_complete() {
            return None;
        }
        self.converter.convert(role, input, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::keycode;

    fn pad(os_name: &str, name: &str, ids: Option<(u16, u16)>) -> PadInfo {
        PadInfo {
            name: name.to_string(),
            os_name: os_name.to_string(),
            vendor_id: ids.map(|(v, _)| v),
            product_id: ids.map(|(_, p)| p),
        }
    }

    fn virtual_pad() -> PadInfo {
        pad(
            XBOX_ONE_IDENTITY.name,
            "Xbox One Controller",
            Some((XBOX_ONE_IDENTITY.vendor, XBOX_ONE_IDENTITY.product)),
        )
    }

    fn left_joycon() -> PadInfo {
        pad("Nintendo Switch Left Joy-Con", "Nintendo Switch Joy-Con (L)", Some((0x057e, 0x2006)))
    }

    fn right_joycon() -> PadInfo {
        pad("Nintendo Switch Right Joy-Con", "Nintendo Switch Joy-Con (R)", Some((0x057e, 0x2007)))
    }

    fn pro_controller() -> PadInfo {
        pad("Nintendo Switch Pro Controller", "Nintendo Switch Pro Controller", Some((0x057e, 0x2009)))
    }

    fn stick_of(event: Option<RawControllerEvent>) -> (JoystickType, f32, f32) {
        match event {
            Some(RawControllerEvent::Stick { stick, x, y, .. }) => (stick, x, y),
            other => panic!("expected stick event, got {:?}", other),
        }
    }

    fn trigger_of(event: Option<RawControllerEvent>) -> (TriggerType, f32) {
        match event {
            Some(RawControllerEvent::Trigger { trigger, value, .. }) => (trigger, value),
            other => panic!("expected trigger event, got {:?}", other),
        }
    }

    fn button_of(event: Option<RawControllerEvent>) -> (i32, ButtonState) {
        match event {
            Some(RawControllerEvent::Button { code, state, .. }) => (code, state),
            other => panic!("expected button event, got {:?}", other),
        }
    }

    #[test]
    fn virtual_pad_is_recognised_by_kernel_name_despite_mapping_name() {
        assert!(virtual_pad().is_virtual());
        assert!(pad(XBOX_ONE_IDENTITY.name, XBOX_ONE_IDENTITY.name, None).is_virtual());
    }

    #[test]
    fn real_xbox_pads_are_not_virtual() {
        let real = pad(
            "Microsoft X-Box One pad",
            "Xbox One Controller",
            Some((XBOX_ONE_IDENTITY.vendor, XBOX_ONE_IDENTITY.product)),
        );
        assert!(!real.is_virtual());

        let same_name_other_ids = pad(XBOX_ONE_IDENTITY.name, "Something", Some((0x1234, 0x5678)));
        assert!(!same_name_other_ids.is_virtual());
    }

    #[test]
    fn joycon_sides_come_from_kernel_or_mapping_names() {
        assert_eq!(left_joycon().joycon_side(), Some(PadRole::LeftHalf));
        assert_eq!(right_joycon().joycon_side(), Some(PadRole::RightHalf));
        assert_eq!(pad("", "Joy-Con (R)", None).joycon_side(), Some(PadRole::RightHalf));
        assert_eq!(
            pad("Nintendo Switch Combined Joy-Cons", "Nintendo Switch Joy-Con (L/R)", None).joycon_side(),
            None
        );
        assert_eq!(pro_controller().joycon_side(), None);
    }

    #[test]
    fn selection_skips_the_virtual_pad() {
        let pads = [virtual_pad(), pro_controller()];
        assert_eq!(select_gamepad(&pads, None), Some(1));
        assert_eq!(select_gamepad(&pads, Some(0)), Some(1));
        assert_eq!(select_gamepad(&pads, Some(1)), None);
    }

    #[test]
    fn selection_honours_the_preferred_index() {
        let pads = [left_joycon(), virtual_pad(), right_joycon()];
        assert_eq!(select_gamepad(&pads, Some(1)), Some(2));
        assert_eq!(select_gamepad(&pads, Some(0)), Some(0));
        assert_eq!(select_gamepad(&[], None), None);
        assert_eq!(select_gamepad(&[virtual_pad()], None), None);
    }

    #[test]
    fn stick_events_carry_the_other_half_of_the_pair() {
        let mut converter = EventConverter::new(0.0);
        let now = Local::now();

        converter.convert(PadRole::Single, PadInput::Axis(Axis::LeftStickX, 0.5), now);
        let event = converter.convert(PadRole::Single, PadInput::Axis(Axis::LeftStickY, -0.25), now);
        assert_eq!(stick_of(event), (JoystickType::Left, 0.5, -0.25));

        let event = converter.convert(PadRole::Single, PadInput::Axis(Axis::RightStickY, 1.0), now);
        assert_eq!(stick_of(event), (JoystickType::Right, 0.0, 1.0));
    }

    #[test]
    fn stick_values_go_through_the_deadzone() {
        let mut converter = EventConverter::new(0.1);
        let now = Local::now();

        let event = converter.convert(PadRole::Single, PadInput::Axis(Axis::LeftStickX, 0.05), now);
        assert_eq!(stick_of(event), (JoystickType::Left, 0.0, 0.0));
        let event = converter.convert(PadRole::Single, PadInput::Axis(Axis::LeftStickX, 1.0), now);
        assert_eq!(stick_of(event), (JoystickType::Left, 1.0, 0.0));
    }

    #[test]
    fn triggers_come_from_z_axes_and_analog_buttons() {
        let mut converter = EventConverter::new(0.0);
        let now = Local::now();

        let event = converter.convert(PadRole::Single, PadInput::Axis(Axis::LeftZ, 0.75), now);
        assert_eq!(trigger_of(event), (TriggerType::Left, 0.75));
        let event = converter.convert(PadRole::Single, PadInput::Axis(Axis::RightZ, 0.5), now);
        assert_eq!(trigger_of(event), (TriggerType::Right, 0.5));
        let event = converter.convert(PadRole::Single, PadInput::Analog(Button::LeftTrigger2, 1.0), now);
        assert_eq!(trigger_of(event), (TriggerType::Left, 1.0));
        let event = converter.convert(PadRole::Single, PadInput::Analog(Button::RightTrigger2, 0.25), now);
        assert_eq!(trigger_of(event), (TriggerType::Right, 0.25));

        assert!(converter
            .convert(PadRole::Single, PadInput::Analog(Button::South, 1.0), now)
            .is_none());
    }

    #[test]
    fn repeats_unmapped_buttons_and_odd_axes_are_dropped() {
        let mut converter = EventConverter::new(0.0);
        let now = Local::now();

        assert!(converter.convert(PadRole::Single, PadInput::Repeated(Button::South), now).is_none());
        assert!(converter.convert(PadRole::Single, PadInput::Pressed(Button::C), now).is_none());
        assert!(converter.convert(PadRole::Single, PadInput::Axis(Axis::DPadX, 1.0), now).is_none());

        let event = converter.convert(PadRole::Single, PadInput::Released(Button::East), now);
        assert_eq!(button_of(event), (keycode::BUTTON_B, ButtonState::Released));
    }

    #[test]
    fn joycon_halves_own_one_stick_each() {
        let mut converter = EventConverter::new(0.0);
        let now = Local::now();

        let event = converter.convert(PadRole::RightHalf, PadInput::Axis(Axis::LeftStickX, 0.5), now);
        assert_eq!(stick_of(event), (JoystickType::Right, 0.5, 0.0));
        let event = converter.convert(PadRole::LeftHalf, PadInput::Axis(Axis::RightStickY, -1.0), now);
        assert_eq!(stick_of(event), (JoystickType::Left, 0.0, -1.0));
    }

    #[test]
    fn single_mode_forwards_only_the_adopted_pad() {
        let mut router = PadRouter::new(PadMode::Single, 0.0);
        let adopted = router.adopt_initial(&[(0, virtual_pad()), (1, pro_controller()), (2, left_joycon())], None);
        assert_eq!(adopted, vec![(1, PadRole::Single)]);

        let now = Local::now();
        assert!(router.input(2, PadInput::Pressed(Button::South), now).is_none());
        assert!(router.input(0, PadInput::Pressed(Button::South), now).is_none());
        let event = router.input(1, PadInput::Pressed(Button::South), now);
        assert_eq!(button_of(event), (keycode::BUTTON_A, ButtonState::Pressed));
    }

    #[test]
    fn connected_never_adopts_the_virtual_pad() {
        let mut router = PadRouter::new(PadMode::Single, 0.0);
        assert_eq!(router.connected(7, &virtual_pad()), None);
        assert!(!router.is_complete());

        assert_eq!(router.connected(8, &pro_controller()), Some(PadRole::Single));
        assert_eq!(router.connected(9, &left_joycon()), None);
        assert!(router.is_complete());
    }

    #[test]
    fn losing_the_adopted_pad_disconnects_and_resets_sticks() {
        let mut router = PadRouter::new(PadMode::Single, 0.0);
        router.connected(1, &pro_controller());
        let now = Local::now();
        router.input(1, PadInput::Axis(Axis::LeftStickX, 1.0), now);

        assert!(router.disconnected(5, now).is_none());
        assert!(matches!(
            router.disconnected(1, now),
            Some(RawControllerEvent::Disconnected { .. })
        ));
        assert_eq!(router.role(1), None);
        assert!(router.input(1, PadInput::Pressed(Button::South), now).is_none());

        // A replacement pad starts from centred sticks
        router.connected(2, &pro_controller());
        let event = router.input(2, PadInput::Axis(Axis::LeftStickY, 0.5), now);
        assert_eq!(stick_of(event), (JoystickType::Left, 0.0, 0.5));
    }

    #[test]
    fn joycon_pair_waits_for_both_halves() {
        let mut router = PadRouter::new(PadMode::JoyConPair, 0.0);
        let adopted = router.adopt_initial(&[(0, left_joycon()), (1, pro_controller())], Some(1));
        assert_eq!(adopted, vec![(0, PadRole::LeftHalf)]);

        let now = Local::now();
        assert!(router.input(0, PadInput::Pressed(Button::DPadUp), now).is_none());

        assert_eq!(router.connected(2, &right_joycon()), Some(PadRole::RightHalf));
        assert!(router.is_complete());

        let event = router.input(0, PadInput::Pressed(Button::DPadUp), now);
        assert_eq!(button_of(event), (keycode::DPAD_UP, ButtonState::Pressed));
        let event = router.input(2, PadInput::Pressed(Button::South), now);
        assert_eq!(button_of(event), (keycode::BUTTON_A, ButtonState::Pressed));
        assert!(router.input(1, PadInput::Pressed(Button::South), now).is_none());
    }

    #[test]
    fn joycon_pair_merges_both_sticks() {
        let mut router = PadRouter::new(PadMode::JoyConPair, 0.0);
        router.connected(0, &left_joycon());
        router.connected(1, &right_joycon());
        let now = Local::now();

        let event = router.input(0, PadInput::Axis(Axis::LeftStickX, -1.0), now);
        assert_eq!(stick_of(event), (JoystickType::Left, -1.0, 0.0));
        let event = router.input(1, PadInput::Axis(Axis::RightStickX, 1.0), now);
        assert_eq!(stick_of(event), (JoystickType::Right, 1.0, 0.0));
    }

    #[test]
    fn losing_either_joycon_disconnects_the_pair() {
        let mut router = PadRouter::new(PadMode::JoyConPair, 0.0);
        router.connected(0, &left_joycon());
        router.connected(1, &right_joycon());
        let now = Local::now();

        assert!(matches!(
            router.disconnected(1, now),
            Some(RawControllerEvent::Disconnected { .. })
        ));
        assert!(!router.is_complete());
        assert!(router.input(0, PadInput::Pressed(Button::DPadUp), now).is_none());

        // The right half comes back under a new id
        assert_eq!(router.connected(3, &right_joycon()), Some(PadRole::RightHalf));
        assert!(router.input(0, PadInput::Pressed(Button::DPadUp), now).is_some());
    }

    #[test]
    fn second_joycon_of_the_same_side_is_ignored() {
        let mut router = PadRouter::new(PadMode::JoyConPair, 0.0);
        assert_eq!(router.connected(0, &left_joycon()), Some(PadRole::LeftHalf));
        assert_eq!(router.connected(1, &left_joycon()), None);
        assert_eq!(router.connected(0, &left_joycon()), Some(PadRole::LeftHalf));
        assert_eq!(router.mode(), PadMode::JoyConPair);
    }
}
