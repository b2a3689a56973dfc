use super::uinput_sys::{EV_SYN, SYN_REPORT};

/// Binary `struct input_event` written to the control channel.
///
/// The timestamp is always zero on our side; the kernel stamps the event when
/// it is injected.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelEventRecord {
    pub time: libc::timeval,
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl KernelEventRecord {
    pub fn new(kind: u16, code: u16, value: i32) -> Self {
        Self {
            time: libc::timeval {
                tv_sec: 0,
                tv_usec: 0,
            },
            kind,
            code,
            value,
        }
    }

    /// `{EV_SYN, SYN_REPORT, 0}`, the end-of-batch marker.
    pub fn sync() -> Self {
        Self::new(EV_SYN, SYN_REPORT, 0)
    }

    pub fn is_sync(&self) -> bool {
        self.kind == EV_SYN && self.code == SYN_REPORT
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: repr(C) plain-old-data without interior padding on the
        // supported targets; the slice lives as long as `self`.
        unsafe {
            std::slice::from_raw_parts(
                self as *const Self as *const u8,
                std::mem::size_of::<Self>(),
            )
        }
    }
}
