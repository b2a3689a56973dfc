//! Physical pad buttons to caller key codes

use gilrs::Button;

use crate::translator::keycode;

/// Caller code for a gilrs button, `None` for buttons the virtual pad lacks
///
/// gilrs names face buttons by position; evdev aliases `BTN_NORTH` to `BTN_X`
/// and `BTN_WEST` to `BTN_Y`, so the mapping below keeps the physical layout.
pub fn caller_code(button: Button) -> Option<i32> {
    match button {
        Button::South => Some(keycode::BUTTON_A),
        Button::East => Some(keycode::BUTTON_B),
        Button::North => Some(keycode::BUTTON_X),
        Button::West => Some(keycode::BUTTON_Y),
        Button::LeftTrigger => Some(keycode::BUTTON_L1),
        Button::RightTrigger => Some(keycode::BUTTON_R1),
        Button::LeftTrigger2 => Some(keycode::BUTTON_L2),
        Button::RightTrigger2 => Some(keycode::BUTTON_R2),
        Button::Select => Some(keycode::BUTTON_SELECT),
        Button::Start => Some(keycode::BUTTON_START),
        Button::Mode => Some(keycode::BUTTON_MODE),
        Button::LeftThumb => Some(keycode::BUTTON_THUMBL),
        Button::RightThumb => Some(keycode::BUTTON_THUMBR),
        Button::DPadUp => Some(keycode::DPAD_UP),
        Button::DPadDown => Some(keycode::DPAD_DOWN),
        Button::DPadLeft => Some(keycode::DPAD_LEFT),
        Button::DPadRight => Some(keycode::DPAD_RIGHT),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::kernel_button;

    #[test]
    fn every_mapped_button_reaches_the_kernel_table() {
        let buttons = [
            Button::South,
            Button::East,
            Button::North,
            Button::West,
            Button::LeftTrigger,
            Button::RightTrigger,
            Button::LeftTrigger2,
            Button::RightTrigger2,
            Button::Select,
            Button::Start,
            Button::Mode,
            Button::LeftThumb,
            Button::RightThumb,
            Button::DPadUp,
            Button::DPadDown,
            Button::DPadLeft,
            Button::DPadRight,
        ];

        for button in buttons {
            let code = caller_code(button).unwrap();
            assert!(kernel_button(code).is_some(), "{:?} -> {}", button, code);
        }
    }

    #[test]
    fn extra_buttons_are_dropped() {
        assert_eq!(caller_code(Button::C), None);
        assert_eq!(caller_code(Button::Z), None);
        assert_eq!(caller_code(Button::Unknown), None);
    }
}
