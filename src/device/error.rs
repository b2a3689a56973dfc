//! Error types for virtual device creation

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::capabilities::SetupDirective;

/// Reasons a device creation attempt can fail
///
/// Every variant is terminal for the attempt: the control channel has already
/// been closed when the error reaches the caller, and no handle exists.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The control node could not be opened (missing node, permission denied)
    #[error("Control channel {path} unavailable: {source}")]
    ChannelUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A capability directive or the identity binding was rejected
    #[error("Device setup failed at {step}: {source}")]
    SetupFailed {
        step: String,
        #[source]
        source: io::Error,
    },

    /// The kernel rejected device instantiation
    #[error("Device creation failed: {source}")]
    CreationFailed {
        #[source]
        source: io::Error,
    },
}

impl DeviceError {
    pub(crate) fn directive(directive: &SetupDirective, source: io::Error) -> Self {
        DeviceError::SetupFailed {
            step: directive.to_string(),
            source,
        }
    }

    pub(crate) fn identity(source: io::Error) -> Self {
        DeviceError::SetupFailed {
            step: "UI_DEV_SETUP".to_string(),
            source,
        }
    }
}
