//! Caller button vocabulary and its kernel counterpart
//!
//! Callers speak Android-style key codes; the device speaks `BTN_*`. The table
//! is the whole translation, anything not listed is dropped.

use crate::device::uinput_sys::{
    BTN_A, BTN_B, BTN_DPAD_DOWN, BTN_DPAD_LEFT, BTN_DPAD_RIGHT, BTN_DPAD_UP, BTN_MODE,
    BTN_SELECT, BTN_START, BTN_THUMBL, BTN_THUMBR, BTN_TL, BTN_TL2, BTN_TR, BTN_TR2, BTN_X,
    BTN_Y,
};

/// Caller-side button codes
pub mod keycode {
    pub const DPAD_UP: i32 = 19;
    pub const DPAD_DOWN: i32 = 20;
    pub const DPAD_LEFT: i32 = 21;
    pub const DPAD_RIGHT: i32 = 22;
    pub const BUTTON_A: i32 = 96;
    pub const BUTTON_B: i32 = 97;
    pub const BUTTON_X: i32 = 99;
    pub const BUTTON_Y: i32 = 100;
    pub const BUTTON_L1: i32 = 102;
    pub const BUTTON_R1: i32 = 103;
    pub const BUTTON_L2: i32 = 104;
    pub const BUTTON_R2: i32 = 105;
    pub const BUTTON_THUMBL: i32 = 106;
    pub const BUTTON_THUMBR: i32 = 107;
    pub const BUTTON_START: i32 = 108;
    pub const BUTTON_SELECT: i32 = 109;
    pub const BUTTON_MODE: i32 = 110;
}

/// `(caller code, kernel code)` for every supported button
pub const BUTTON_MAP: [(i32, u16); 17] = [
    (keycode::BUTTON_A, BTN_A),
    (keycode::BUTTON_B, BTN_B),
    (keycode::BUTTON_X, BTN_X),
    (keycode::BUTTON_Y, BTN_Y),
    (keycode::BUTTON_L1, BTN_TL),
    (keycode::BUTTON_R1, BTN_TR),
    (keycode::BUTTON_L2, BTN_TL2),
    (keycode::BUTTON_R2, BTN_TR2),
    (keycode::BUTTON_SELECT, BTN_SELECT),
    (keycode::BUTTON_START, BTN_START),
    (keycode::BUTTON_MODE, BTN_MODE),
    (keycode::BUTTON_THUMBL, BTN_THUMBL),
    (keycode::BUTTON_THUMBR, BTN_THUMBR),
    (keycode::DPAD_UP, BTN_DPAD_UP),
    (keycode::DPAD_DOWN, BTN_DPAD_DOWN),
    (keycode::DPAD_LEFT, BTN_DPAD_LEFT),
    (keycode::DPAD_RIGHT, BTN_DPAD_RIGHT),
];

/// Exact-match lookup; `None` for codes outside the table
pub fn kernel_button(code: i32) -> Option<u16> {
    BUTTON_MAP
        .iter()
        .find(|(caller, _)| *caller == code)
        .map(|(_, kernel)| *kernel)
}
