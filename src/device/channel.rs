//! Control channel abstraction
//!
//! [`InputChannel`] is the seam between the registrar and the kernel. The
//! production implementation, [`UinputChannel`], issues raw ioctls on an open
//! `/dev/uinput` descriptor; tests substitute a recording channel.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::capabilities::{DeviceIdentity, SetupDirective};
use super::record::KernelEventRecord;
use super::uinput_sys::{
    UI_ABS_SETUP, UI_DEV_CREATE, UI_DEV_DESTROY, UI_DEV_SETUP, UI_SET_EVBIT, UI_SET_FFBIT,
    UI_SET_KEYBIT,
};

/// Kernel operations needed to declare, run and tear down one virtual device.
pub trait InputChannel: fmt::Debug + Send {
    /// Applies one capability directive
    fn apply(&mut self, directive: &SetupDirective) -> io::Result<()>;

    /// Binds vendor/product/name (`UI_DEV_SETUP`)
    fn bind_identity(&mut self, identity: &DeviceIdentity) -> io::Result<()>;

    /// Makes the device visible to the system (`UI_DEV_CREATE`)
    fn instantiate(&mut self) -> io::Result<()>;

    /// Removes the device from the system (`UI_DEV_DESTROY`)
    fn teardown(&mut self) -> io::Result<()>;

    /// Writes one event record
    fn write_record(&mut self, record: &KernelEventRecord) -> io::Result<()>;

    /// Releases the descriptor
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// `/dev/uinput` opened write-only and non-blocking.
pub struct UinputChannel {
    file: File,
    path: PathBuf,
}

impl fmt::Debug for UinputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UinputChannel")
            .field("path", &self.path)
            .field("fd", &self.file.as_raw_fd())
            .finish()
    }
}

impl UinputChannel {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)?;

        debug!("Opened {} as fd {}", path.display(), file.as_raw_fd());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ioctl_int(&self, request: libc::c_ulong, arg: libc::c_int) -> io::Result<()> {
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), request, arg) };
        check(rc)
    }

    fn ioctl_ptr<T>(&self, request: libc::c_ulong, arg: &T) -> io::Result<()> {
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), request, arg as *const T) };
        check(rc)
    }

    fn ioctl_none(&self, request: libc::c_ulong) -> io::Result<()> {
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), request) };
        check(rc)
    }
}

fn check(rc: libc::c_int) -> io::Result<()> {
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

impl InputChannel for UinputChannel {
    fn apply(&mut self, directive: &SetupDirective) -> io::Result<()> {
        match directive {
            SetupDirective::EnableEventClass(ev) => self.ioctl_int(UI_SET_EVBIT, *ev as libc::c_int),
            SetupDirective::EnableKey(code) => self.ioctl_int(UI_SET_KEYBIT, *code as libc::c_int),
            SetupDirective::SetupAxis(axis) => self.ioctl_ptr(UI_ABS_SETUP, &axis.to_abs_setup()),
            SetupDirective::EnableForceFeedback(code) => {
                self.ioctl_int(UI_SET_FFBIT, *code as libc::c_int)
            }
        }
    }

    fn bind_identity(&mut self, identity: &DeviceIdentity) -> io::Result<()> {
        self.ioctl_ptr(UI_DEV_SETUP, &identity.to_setup())
    }

    fn instantiate(&mut self) -> io::Result<()> {
        self.ioctl_none(UI_DEV_CREATE)
    }

    fn teardown(&mut self) -> io::Result<()> {
        self.ioctl_none(UI_DEV_DESTROY)
    }

    fn write_record(&mut self, record: &KernelEventRecord) -> io::Result<()> {
        let bytes = record.as_bytes();
        let written = unsafe {
            libc::write(
                self.file.as_raw_fd(),
                bytes.as_ptr() as *const libc::c_void,
                bytes.len(),
            )
        };

        if written < 0 {
            return Err(io::Error::last_os_error());
        }
        if written as usize != bytes.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", written, bytes.len()),
            ));
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        let fd = self.file.into_raw_fd();
        check(unsafe { libc::close(fd) })
    }
}
