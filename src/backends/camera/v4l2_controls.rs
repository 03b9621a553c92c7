// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera control interface
//!
//! Just enough of the V4L2 control API for tap-to-focus: one-shot
//! autofocus and exposure metering mode.

use super::types::{BackendError, BackendResult, FocusPoint};
use std::fs::File;
use std::os::unix::io::AsRawFd;
use tracing::{debug, info, warn};

// ===== V4L2 Control Class Bases =====
const V4L2_CTRL_CLASS_CAMERA: u32 = 0x009a0000;
const V4L2_CID_CAMERA_CLASS_BASE: u32 = V4L2_CTRL_CLASS_CAMERA | 0x900;

// ===== V4L2 Control IDs (Camera Class) =====

/// Continuous auto focus enable
pub const V4L2_CID_FOCUS_AUTO: u32 = V4L2_CID_CAMERA_CLASS_BASE + 12;
/// Exposure metering mode
pub const V4L2_CID_EXPOSURE_METERING: u32 = V4L2_CID_CAMERA_CLASS_BASE + 25;
/// Start a single auto focus run (button control)
pub const V4L2_CID_AUTO_FOCUS_START: u32 = V4L2_CID_CAMERA_CLASS_BASE + 28;

// ===== V4L2 Exposure Metering Menu Values =====

/// Center-weighted metering
pub const V4L2_EXPOSURE_METERING_CENTER_WEIGHTED: i32 = 1;
/// Spot metering
pub const V4L2_EXPOSURE_METERING_SPOT: i32 = 2;

// ===== V4L2 Control Flags =====
const V4L2_CTRL_FLAG_DISABLED: u32 = 0x0001;

// ===== V4L2 ioctl Numbers =====

/// Set control value (v4l2_control: 8 bytes)
const VIDIOC_S_CTRL: libc::c_ulong = 0xC008561C;
/// Query control info (v4l2_queryctrl: 68 bytes)
const VIDIOC_QUERYCTRL: libc::c_ulong = 0xC0445624;

/// V4L2 control get/set structure
#[repr(C)]
struct V4l2Control {
    id: u32,
    value: i32,
}

/// V4L2 query control structure
#[repr(C)]
struct V4l2Queryctrl {
    id: u32,
    ctrl_type: u32,
    name: [u8; 32],
    minimum: i32,
    maximum: i32,
    step: i32,
    default_value: i32,
    flags: u32,
    reserved: [u32; 2],
}

/// Check if a control is available (exists and is not disabled)
pub fn has_control(device_path: &str, control_id: u32) -> bool {
    let Ok(file) = File::open(device_path) else {
        return false;
    };

    let mut qctrl = V4l2Queryctrl {
        id: control_id,
        ctrl_type: 0,
        name: [0; 32],
        minimum: 0,
        maximum: 0,
        step: 0,
        default_value: 0,
        flags: 0,
        reserved: [0; 2],
    };

    let result = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            VIDIOC_QUERYCTRL,
            &mut qctrl as *mut V4l2Queryctrl,
        )
    };

    result >= 0 && qctrl.flags & V4L2_CTRL_FLAG_DISABLED == 0
}

/// Set value of a control
pub fn set_control(device_path: &str, control_id: u32, value: i32) -> BackendResult<()> {
    let file = File::open(device_path)?;

    let mut ctrl = V4l2Control {
        id: control_id,
        value,
    };

    let result = unsafe { libc::ioctl(file.as_raw_fd(), VIDIOC_S_CTRL, &mut ctrl as *mut V4l2Control) };

    if result < 0 {
        let errno = std::io::Error::last_os_error();
        warn!(device_path, control_id, value, ?errno, "Failed to set V4L2 control");
        return Err(BackendError::Io(errno.to_string()));
    }

    Ok(())
}

/// Metering mode for a tap: spot near the centre, centre-weighted elsewhere
///
/// Standard V4L2 has no metering region, so off-centre taps fall back to
/// the broader mode.
pub fn metering_mode_for(point: FocusPoint) -> i32 {
    let near_center = (point.x - 0.5).abs() <= 0.15 && (point.y - 0.5).abs() <= 0.15;
    if near_center {
        V4L2_EXPOSURE_METERING_SPOT
    } else {
        V4L2_EXPOSURE_METERING_CENTER_WEIGHTED
    }
}

/// Run one focus-and-metering cycle for a tap at `point`
///
/// Returns `NotSupported` when the device has neither control.
pub fn focus_and_meter(device_path: &str, point: FocusPoint) -> BackendResult<()> {
    let mut applied = false;

    if has_control(device_path, V4L2_CID_AUTO_FOCUS_START) {
        if has_control(device_path, V4L2_CID_FOCUS_AUTO) {
            // One-shot focus only runs with continuous AF off
            set_control(device_path, V4L2_CID_FOCUS_AUTO, 0)?;
        }
        set_control(device_path, V4L2_CID_AUTO_FOCUS_START, 1)?;
        applied = true;
    } else {
        debug!(device_path, "One-shot autofocus not supported");
    }

    if has_control(device_path, V4L2_CID_EXPOSURE_METERING) {
        set_control(device_path, V4L2_CID_EXPOSURE_METERING, metering_mode_for(point))?;
        applied = true;
    }

    if applied {
        info!(device_path, x = point.x, y = point.y, "Focus and metering started");
        Ok(())
    } else {
        Err(BackendError::NotSupported(format!(
            "{} has no focus or metering controls",
            device_path
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_id_values() {
        assert_eq!(V4L2_CID_FOCUS_AUTO, 0x009a090c);
        assert_eq!(V4L2_CID_EXPOSURE_METERING, 0x009a0919);
        assert_eq!(V4L2_CID_AUTO_FOCUS_START, 0x009a091c);
    }

    #[test]
    fn test_metering_mode_for_tap() {
        assert_eq!(metering_mode_for(FocusPoint::center()), V4L2_EXPOSURE_METERING_SPOT);
        assert_eq!(
            metering_mode_for(FocusPoint::new(0.1, 0.9)),
            V4L2_EXPOSURE_METERING_CENTER_WEIGHTED
        );
    }

    #[test]
    fn test_missing_device_is_unsupported() {
        let result = focus_and_meter("/dev/does-not-exist", FocusPoint::center());
        assert!(matches!(result, Err(BackendError::NotSupported(_))));
    }
}
