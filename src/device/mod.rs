//! Device Registrar
//!
//! Owns everything between "open `/dev/uinput`" and "device node visible to
//! every process": the fixed capability profile, the identity record, the
//! ordered setup protocol and teardown.
//!
//! ```text
//! create_device() ──► open channel ──► directives ──► UI_DEV_SETUP ──► UI_DEV_CREATE ──► DeviceHandle
//! destroy_device(&mut handle) ──► UI_DEV_DESTROY ──► close ──► invalid sentinel
//! ```
//!
//! Creation errors are reported through [`DeviceError`]; teardown never fails
//! from the caller's point of view.

pub mod capabilities;
pub mod channel;
pub mod error;
pub mod record;
pub mod registrar;
pub mod uinput_sys;

pub use capabilities::{
    AxisCalibration, AxisCapability, DeviceCapabilitySet, DeviceIdentity, SetupDirective,
    XBOX_CAPABILITIES, XBOX_ONE_IDENTITY,
};
pub use channel::{InputChannel, UinputChannel};
pub use error::DeviceError;
pub use record::KernelEventRecord;
pub use registrar::{
    create_device, create_device_on, create_device_with_settings, destroy_device, DeviceHandle,
    DeviceSettings, VirtualDevice, DEFAULT_UINPUT_PATH,
};
