//! Fixed capability profile and identity of the virtual controller
//!
//! Everything here is compile-time constant: every device this crate creates
//! advertises the same buttons, axes and force-feedback classes, and presents
//! itself as the same Xbox One pad.

use std::fmt;

use super::uinput_sys::{
    InputAbsInfo, InputId, UinputAbsSetup, UinputSetup, ABS_RX, ABS_RY, ABS_RZ, ABS_X, ABS_Y,
    ABS_Z, BTN_A, BTN_B, BTN_DPAD_DOWN, BTN_DPAD_LEFT, BTN_DPAD_RIGHT, BTN_DPAD_UP, BTN_MODE,
    BTN_SELECT, BTN_START, BTN_THUMBL, BTN_THUMBR, BTN_TL, BTN_TL2, BTN_TR, BTN_TR2, BTN_X,
    BTN_Y, BUS_USB, EV_ABS, EV_FF, EV_KEY, FF_PERIODIC, FF_RUMBLE, UINPUT_MAX_NAME_SIZE,
};

/// Effect slots reserved for force feedback.
///
/// The kernel refuses `UI_DEV_CREATE` when `EV_FF` is enabled with zero slots,
/// so advertising rumble requires a non-zero value here even though no effect
/// is ever played back.
///
/// The channel never reads `EV_UINPUT` requests, so a consumer that uploads an
/// effect blocks in `EVIOCSFF` until the kernel's uinput request timeout expires.
pub const FF_EFFECTS_MAX: u32 = 16;

/// `{minimum, maximum, fuzz, flat}` of one absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisCalibration {
    pub minimum: i32,
    pub maximum: i32,
    pub fuzz: i32,
    pub flat: i32,
}

pub const STICK_CALIBRATION: AxisCalibration = AxisCalibration {
    minimum: -32768,
    maximum: 32767,
    fuzz: 250,
    flat: 1500,
};

pub const TRIGGER_CALIBRATION: AxisCalibration = AxisCalibration {
    minimum: 0,
    maximum: 255,
    fuzz: 0,
    flat: 0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisCapability {
    pub code: u16,
    pub calibration: AxisCalibration,
}

impl AxisCapability {
    pub fn to_abs_setup(&self) -> UinputAbsSetup {
        UinputAbsSetup {
            code: self.code,
            absinfo: InputAbsInfo {
                value: 0,
                minimum: self.calibration.minimum,
                maximum: self.calibration.maximum,
                fuzz: self.calibration.fuzz,
                flat: self.calibration.flat,
                resolution: 0,
            },
        }
    }
}

/// Buttons, axes and force-feedback classes the virtual device exposes.
#[derive(Debug, Clone, Copy)]
pub struct DeviceCapabilitySet {
    pub buttons: &'static [u16],
    pub dpad: &'static [u16],
    pub axes: &'static [AxisCapability],
    pub force_feedback: &'static [u16],
}

pub const XBOX_CAPABILITIES: DeviceCapabilitySet = DeviceCapabilitySet {
    buttons: &[
        BTN_A, BTN_B, BTN_X, BTN_Y, BTN_TL, BTN_TR, BTN_TL2, BTN_TR2, BTN_SELECT, BTN_START,
        BTN_MODE, BTN_THUMBL, BTN_THUMBR,
    ],
    dpad: &[BTN_DPAD_UP, BTN_DPAD_DOWN, BTN_DPAD_LEFT, BTN_DPAD_RIGHT],
    axes: &[
        AxisCapability { code: ABS_X, calibration: STICK_CALIBRATION },
        AxisCapability { code: ABS_Y, calibration: STICK_CALIBRATION },
        AxisCapability { code: ABS_RX, calibration: STICK_CALIBRATION },
        AxisCapability { code: ABS_RY, calibration: STICK_CALIBRATION },
        AxisCapability { code: ABS_Z, calibration: TRIGGER_CALIBRATION },
        AxisCapability { code: ABS_RZ, calibration: TRIGGER_CALIBRATION },
    ],
    force_feedback: &[FF_RUMBLE, FF_PERIODIC],
};

/// One step of the capability declaration sent to the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupDirective {
    /// `UI_SET_EVBIT`
    EnableEventClass(u16),
    /// `UI_SET_KEYBIT`
    EnableKey(u16),
    /// `UI_ABS_SETUP`
    SetupAxis(AxisCapability),
    /// `UI_SET_FFBIT`
    EnableForceFeedback(u16),
}

impl fmt::Display for SetupDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupDirective::EnableEventClass(ev) => write!(f, "UI_SET_EVBIT {:#04x}", ev),
            SetupDirective::EnableKey(code) => write!(f, "UI_SET_KEYBIT {:#05x}", code),
            SetupDirective::SetupAxis(axis) => write!(f, "UI_ABS_SETUP {:#04x}", axis.code),
            SetupDirective::EnableForceFeedback(code) => write!(f, "UI_SET_FFBIT {:#04x}", code),
        }
    }
}

impl DeviceCapabilitySet {
    /// Expands the set into the ordered directive list applied before instantiation:
    /// key class, every key, abs class, every axis, ff class, every effect type.
    pub fn directives(&self) -> Vec<SetupDirective> {
        let mut directives = Vec::with_capacity(
            3 + self.buttons.len() + self.dpad.len() + self.axes.len() + self.force_feedback.len(),
        );

        directives.push(SetupDirective::EnableEventClass(EV_KEY));
        directives.extend(
            self.buttons
                .iter()
                .chain(self.dpad.iter())
                .map(|&code| SetupDirective::EnableKey(code)),
        );

        directives.push(SetupDirective::EnableEventClass(EV_ABS));
        directives.extend(self.axes.iter().map(|&axis| SetupDirective::SetupAxis(axis)));

        directives.push(SetupDirective::EnableEventClass(EV_FF));
        directives.extend(
            self.force_feedback
                .iter()
                .map(|&code| SetupDirective::EnableForceFeedback(code)),
        );

        directives
    }

    pub fn supports_key(&self, code: u16) -> bool {
        self.buttons.contains(&code) || self.dpad.contains(&code)
    }

    pub fn axis(&self, code: u16) -> Option<&AxisCapability> {
        self.axes.iter().find(|axis| axis.code == code)
    }
}

/// Identity presented to the OS so consumers treat the device as a known pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub bus_type: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
    pub name: &'static str,
}

pub const XBOX_ONE_IDENTITY: DeviceIdentity = DeviceIdentity {
    bus_type: BUS_USB,
    vendor: 0x045e,
    product: 0x02dd,
    version: 0x0100,
    name: "Xbox One Controller (JoyCon Mapper)",
};

impl DeviceIdentity {
    /// Builds the zeroed `uinput_setup` record for this identity.
    ///
    /// The name is truncated so that a terminating NUL always fits.
    pub fn to_setup(&self) -> UinputSetup {
        let mut setup = UinputSetup {
            id: InputId {
                bustype: self.bus_type,
                vendor: self.vendor,
                product: self.product,
                version: self.version,
            },
            ff_effects_max: FF_EFFECTS_MAX,
            ..UinputSetup::default()
        };

        let bytes = self.name.as_bytes();
        let len = bytes.len().min(UINPUT_MAX_NAME_SIZE - 1);
        setup.name[..len].copy_from_slice(&bytes[..len]);
        setup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_follow_the_declaration_order() {
        let directives = XBOX_CAPABILITIES.directives();
        assert_eq!(directives.len(), 1 + 17 + 1 + 6 + 1 + 2);

        assert_eq!(directives[0], SetupDirective::EnableEventClass(EV_KEY));
        assert!(directives[1..18]
            .iter()
            .all(|d| matches!(d, SetupDirective::EnableKey(_))));
        assert_eq!(directives[1], SetupDirective::EnableKey(BTN_A));
        assert_eq!(directives[17], SetupDirective::EnableKey(BTN_DPAD_RIGHT));

        assert_eq!(directives[18], SetupDirective::EnableEventClass(EV_ABS));
        assert!(directives[19..25]
            .iter()
            .all(|d| matches!(d, SetupDirective::SetupAxis(_))));

        assert_eq!(directives[25], SetupDirective::EnableEventClass(EV_FF));
        assert_eq!(directives[26], SetupDirective::EnableForceFeedback(FF_RUMBLE));
        assert_eq!(directives[27], SetupDirective::EnableForceFeedback(FF_PERIODIC));
    }

    #[test]
    fn sticks_and_triggers_carry_their_calibration() {
        for code in [ABS_X, ABS_Y, ABS_RX, ABS_RY] {
            let axis = XBOX_CAPABILITIES.axis(code).unwrap();
            let info = axis.to_abs_setup().absinfo;
            assert_eq!((info.minimum, info.maximum, info.fuzz, info.flat), (-32768, 32767, 250, 1500));
        }
        for code in [ABS_Z, ABS_RZ] {
            let axis = XBOX_CAPABILITIES.axis(code).unwrap();
            let info = axis.to_abs_setup().absinfo;
            assert_eq!((info.minimum, info.maximum, info.fuzz, info.flat), (0, 255, 0, 0));
        }
    }

    #[test]
    fn identity_setup_is_nul_terminated() {
        let setup = XBOX_ONE_IDENTITY.to_setup();
        assert_eq!(setup.id.bustype, BUS_USB);
        assert_eq!(setup.id.vendor, 0x045e);
        assert_eq!(setup.id.product, 0x02dd);
        assert_eq!(setup.id.version, 0x0100);

        let name_len = XBOX_ONE_IDENTITY.name.len();
        assert_eq!(&setup.name[..name_len], XBOX_ONE_IDENTITY.name.as_bytes());
        assert_eq!(setup.name[name_len], 0);
        assert_eq!(setup.ff_effects_max, FF_EFFECTS_MAX);
    }

    #[test]
    fn every_declared_key_is_supported() {
        for code in XBOX_CAPABILITIES.buttons.iter().chain(XBOX_CAPABILITIES.dpad) {
            assert!(XBOX_CAPABILITIES.supports_key(*code));
        }
        assert!(!XBOX_CAPABILITIES.supports_key(0x100));
    }
}
