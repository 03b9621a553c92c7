// SPDX-License-Identifier: GPL-3.0-only

//! Camera access gate
//!
//! Capture UI stays inert until the gate reports `Granted`.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionStatus {
    /// Not asked yet
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Decides whether the process may use the camera
pub trait PermissionGate: Send {
    fn request(&self) -> PermissionStatus;
}

/// Gate for backends that need no device access
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

impl PermissionGate for AlwaysGranted {
    fn request(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }
}

/// Grants access when at least one `video*` node is readable and writable
#[derive(Debug, Clone)]
pub struct DeviceAccessGate {
    dev_dir: PathBuf,
}

impl Default for DeviceAccessGate {
    fn default() -> Self {
        Self::with_dir("/dev")
    }
}

impl DeviceAccessGate {
    /// Look for device nodes in a different directory
    pub fn with_dir(dev_dir: impl Into<PathBuf>) -> Self {
        Self {
            dev_dir: dev_dir.into(),
        }
    }

    fn is_accessible(path: &Path) -> bool {
        let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
            return false;
        };
        unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK) == 0 }
    }
}

impl PermissionGate for DeviceAccessGate {
    fn request(&self) -> PermissionStatus {
        let Ok(entries) = std::fs::read_dir(&self.dev_dir) else {
            warn!(dir = %self.dev_dir.display(), "Cannot read device directory");
            return PermissionStatus::Denied;
        };

        let mut found = 0usize;
        for entry in entries.flatten() {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with("video") {
                continue;
            }
            found += 1;

            let path = entry.path();
            if Self::is_accessible(&path) {
                info!(path = %path.display(), "Camera device accessible");
                return PermissionStatus::Granted;
            }
            debug!(path = %path.display(), "Camera device not accessible");
        }

        warn!(
            found,
            "No accessible camera device (user may need to be in the 'video' group)"
        );
        PermissionStatus::Denied
    }
}
