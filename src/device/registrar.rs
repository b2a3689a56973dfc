//! Virtual device lifecycle with a statum state machine
//!
//! ```text
//! open ──► Configuring ──► declare_capabilities ──► bind_identity ──► instantiate ──► Live
//!              │                    │                     │                │
//!              └────────────────────┴─────────────────────┴────────────────┴──► channel closed, error
//! ```
//!
//! A [`VirtualDevice<Live>`] only exists once the kernel accepted every step.
//! Callers never hold it directly; it lives inside a [`DeviceHandle`].

use statum::{machine, state};
use std::io;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use super::capabilities::{
    DeviceCapabilitySet, DeviceIdentity, XBOX_CAPABILITIES, XBOX_ONE_IDENTITY,
};
use super::channel::{InputChannel, UinputChannel};
use super::error::DeviceError;
use super::record::KernelEventRecord;

pub const DEFAULT_UINPUT_PATH: &str = "/dev/uinput";

/// Where the control channel lives
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceSettings {
    pub uinput_path: PathBuf,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            uinput_path: PathBuf::from(DEFAULT_UINPUT_PATH),
        }
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum DeviceState {
    Configuring, // Channel open, capabilities being declared
    Live,        // Device node visible to the system
}

#[machine]
#[derive(Debug)]
pub struct VirtualDevice<S: DeviceState> {
    channel: Box<dyn InputChannel>,
    identity: DeviceIdentity,
    capabilities: DeviceCapabilitySet,
}

impl<S: DeviceState> VirtualDevice<S> {
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn capabilities(&self) -> &DeviceCapabilitySet {
        &self.capabilities
    }
}

impl VirtualDevice<Configuring> {
    /// Opens the control channel at the configured path
    pub fn open(settings: &DeviceSettings) -> Result<Self, DeviceError> {
        info!(
            "Opening virtual input channel at {}",
            settings.uinput_path.display()
        );

        match UinputChannel::open(&settings.uinput_path) {
            Ok(channel) => Ok(Self::attach(Box::new(channel))),
            Err(source) => {
                error!(
                    "Failed to open {}: {}",
                    settings.uinput_path.display(),
                    source
                );
                Err(DeviceError::ChannelUnavailable {
                    path: settings.uinput_path.clone(),
                    source,
                })
            }
        }
    }

    /// Wraps an already open channel
    pub fn attach(channel: Box<dyn InputChannel>) -> Self {
        Self::new(channel, XBOX_ONE_IDENTITY, XBOX_CAPABILITIES)
    }

    /// Applies every capability directive in order; the first rejection aborts setup
    pub fn declare_capabilities(mut self) -> Result<Self, DeviceError> {
        let directives = self.capabilities.directives();
        debug!("Declaring {} capability directives", directives.len());

        for directive in &directives {
            if let Err(source) = self.channel.apply(directive) {
                error!("{} rejected: {}", directive, source);
                self.release();
                return Err(DeviceError::directive(directive, source));
            }
            debug!("Applied {}", directive);
        }

        Ok(self)
    }

    pub fn bind_identity(mut self) -> Result<Self, DeviceError> {
        let identity = self.identity;
        debug!(
            "Binding identity {:04x}:{:04x} \"{}\"",
            identity.vendor, identity.product, identity.name
        );

        if let Err(source) = self.channel.bind_identity(&identity) {
            error!("UI_DEV_SETUP failed: {}", source);
            self.release();
            return Err(DeviceError::identity(source));
        }

        Ok(self)
    }

    pub fn instantiate(mut self) -> Result<VirtualDevice<Live>, DeviceError> {
        if let Err(source) = self.channel.instantiate() {
            error!("UI_DEV_CREATE failed: {}", source);
            self.release();
            return Err(DeviceError::CreationFailed { source });
        }

        info!("Virtual controller \"{}\" created", self.identity.name);
        Ok(self.transition())
    }

    fn release(self) {
        if let Err(e) = self.channel.close() {
            warn!("Closing control channel after failed setup: {}", e);
        }
    }
}

impl VirtualDevice<Live> {
    pub fn write_record(&mut self, record: &KernelEventRecord) -> io::Result<()> {
        self.channel.write_record(record)
    }

    /// Tears the device down, then closes the channel; failures are only logged
    pub fn destroy(mut self) {
        if let Err(e) = self.channel.teardown() {
            warn!("UI_DEV_DESTROY failed: {}", e);
        }
        if let Err(e) = self.channel.close() {
            warn!("Closing control channel failed: {}", e);
        }
        info!("Virtual controller \"{}\" destroyed", self.identity.name);
    }
}

/// Exclusive owner of one live virtual device
///
/// Not `Clone`: exactly one owner can destroy the device. After
/// [`destroy_device`] the handle is the invalid sentinel (the same value as
/// [`DeviceHandle::invalid`]) and every operation on it is a no-op. Dropping a
/// valid handle destroys the device.
#[derive(Debug, Default)]
pub struct DeviceHandle {
    device: Option<VirtualDevice<Live>>,
}

impl DeviceHandle {
    /// The sentinel handle that owns nothing
    pub fn invalid() -> Self {
        Self { device: None }
    }

    pub fn is_valid(&self) -> bool {
        self.device.is_some()
    }

    pub fn identity(&self) -> Option<&DeviceIdentity> {
        self.device.as_ref().map(|device| device.identity())
    }

    /// Same as [`destroy_device`]
    pub fn destroy(&mut self) {
        destroy_device(self);
    }

    /// Writes one record; invalid handles and write failures are swallowed
    pub(crate) fn write_record(&mut self, record: &KernelEventRecord) {
        let Some(device) = self.device.as_mut() else {
            debug!("Dropping record {:?} for invalid handle", record);
            return;
        };

        if let Err(e) = device.write_record(record) {
            warn!(
                "Write of type {:#04x} code {:#05x} value {} failed: {}",
                record.kind, record.code, record.value, e
            );
        }
    }
}

impl From<VirtualDevice<Live>> for DeviceHandle {
    fn from(device: VirtualDevice<Live>) -> Self {
        Self {
            device: Some(device),
        }
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        destroy_device(self);
    }
}

/// Creates the virtual controller on `/dev/uinput`
pub fn create_device() -> Result<DeviceHandle, DeviceError> {
    create_device_with_settings(&DeviceSettings::default())
}

pub fn create_device_with_settings(settings: &DeviceSettings) -> Result<DeviceHandle, DeviceError> {
    let device = VirtualDevice::<Configuring>::open(settings)?;
    finish_setup(device)
}

/// Runs the full setup sequence on a caller-provided channel
pub fn create_device_on(channel: Box<dyn InputChannel>) -> Result<DeviceHandle, DeviceError> {
    finish_setup(VirtualDevice::<Configuring>::attach(channel))
}

fn finish_setup(device: VirtualDevice<Configuring>) -> Result<DeviceHandle, DeviceError> {
    let live = device
        .declare_capabilities()?
        .bind_identity()?
        .instantiate()?;
    Ok(DeviceHandle::from(live))
}

/// Destroys the device behind `handle` and leaves the invalid sentinel behind
///
/// Safe to call on an already invalid handle.
pub fn destroy_device(handle: &mut DeviceHandle) {
    match handle.device.take() {
        Some(device) => device.destroy(),
        None => debug!("destroy_device called on invalid handle, nothing to do"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::capabilities::SetupDirective;
    use crate::device::channel::testing::{ChannelCall, FailPoint, RecordingChannel};
    use crate::device::uinput_sys::{EV_ABS, EV_FF, EV_KEY};

    #[test]
    fn successful_creation_runs_every_step_in_order() {
        let (channel, log) = RecordingChannel::new();
        let handle = create_device_on(channel).unwrap();
        assert!(handle.is_valid());
        assert_eq!(handle.identity(), Some(&XBOX_ONE_IDENTITY));

        let calls = log.calls();
        let expected_directives: Vec<ChannelCall> = XBOX_CAPABILITIES
            .directives()
            .into_iter()
            .map(ChannelCall::Apply)
            .collect();
        let n = expected_directives.len();

        assert_eq!(&calls[..n], expected_directives.as_slice());
        assert_eq!(calls[n], ChannelCall::BindIdentity(XBOX_ONE_IDENTITY));
        assert_eq!(calls[n + 1], ChannelCall::Instantiate);
        assert_eq!(calls.len(), n + 2);

        assert_eq!(calls[0], ChannelCall::Apply(SetupDirective::EnableEventClass(EV_KEY)));
        assert!(calls.contains(&ChannelCall::Apply(SetupDirective::EnableEventClass(EV_ABS))));
        assert!(calls.contains(&ChannelCall::Apply(SetupDirective::EnableEventClass(EV_FF))));
    }

    #[test]
    fn unopenable_channel_reports_channel_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DeviceSettings {
            uinput_path: dir.path().join("no-such-node"),
        };

        match create_device_with_settings(&settings) {
            Err(DeviceError::ChannelUnavailable { path, .. }) => {
                assert_eq!(path, settings.uinput_path)
            }
            other => panic!("expected ChannelUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn rejected_directive_aborts_and_closes() {
        let (channel, log) = RecordingChannel::failing_at(Some(FailPoint::Directive(3)));
        let err = create_device_on(channel).unwrap_err();
        assert!(matches!(err, DeviceError::SetupFailed { .. }));

        let calls = log.calls();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls.last(), Some(&ChannelCall::Close));
        assert!(!calls.contains(&ChannelCall::Instantiate));
    }

    #[test]
    fn rejected_identity_is_setup_failed_and_closes() {
        let (channel, log) = RecordingChannel::failing_at(Some(FailPoint::Identity));
        match create_device_on(channel) {
            Err(DeviceError::SetupFailed { step, .. }) => assert_eq!(step, "UI_DEV_SETUP"),
            other => panic!("expected SetupFailed, got {:?}", other),
        }

        let calls = log.calls();
        assert_eq!(calls.last(), Some(&ChannelCall::Close));
        assert!(!calls.contains(&ChannelCall::Instantiate));
    }

    #[test]
    fn rejected_instantiation_is_creation_failed_and_closes() {
        let (channel, log) = RecordingChannel::failing_at(Some(FailPoint::Instantiate));
        let err = create_device_on(channel).unwrap_err();
        assert!(matches!(err, DeviceError::CreationFailed { .. }));

        let calls = log.calls();
        let tail = &calls[calls.len() - 2..];
        assert_eq!(tail, &[ChannelCall::Instantiate, ChannelCall::Close]);
    }

    #[test]
    fn destroy_tears_down_then_closes_and_invalidates() {
        let (channel, log) = RecordingChannel::new();
        let mut handle = create_device_on(channel).unwrap();
        log.clear();

        destroy_device(&mut handle);
        assert!(!handle.is_valid());
        assert_eq!(log.calls(), vec![ChannelCall::Teardown, ChannelCall::Close]);

        destroy_device(&mut handle);
        assert_eq!(log.calls().len(), 2);
    }

    #[test]
    fn destroy_failures_still_invalidate() {
        let (channel, log) = RecordingChannel::failing_at(Some(FailPoint::Teardown));
        let mut handle = create_device_on(channel).unwrap();
        log.clear();

        handle.destroy();
        assert!(!handle.is_valid());
        assert_eq!(log.calls(), vec![ChannelCall::Teardown, ChannelCall::Close]);
    }

    #[test]
    fn destroying_the_sentinel_is_a_no_op() {
        let mut handle = DeviceHandle::invalid();
        destroy_device(&mut handle);
        assert!(!handle.is_valid());
        assert!(handle.identity().is_none());
    }

    #[test]
    fn dropping_a_live_handle_destroys_the_device() {
        let (channel, log) = RecordingChannel::new();
        let handle = create_device_on(channel).unwrap();
        log.clear();

        drop(handle);
        assert_eq!(log.calls(), vec![ChannelCall::Teardown, ChannelCall::Close]);
    }

    #[test]
    fn handle_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<DeviceHandle>();
    }
}
