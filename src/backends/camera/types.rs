// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::flash::FlashMode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraBackendType {
    /// Real devices through V4L2 + GStreamer
    #[default]
    V4l2,
    /// Synthetic test-pattern cameras
    Virtual,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::Virtual => write!(f, "virtual"),
        }
    }
}

impl std::str::FromStr for CameraBackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v4l2" => Ok(CameraBackendType::V4l2),
            "virtual" => Ok(CameraBackendType::Virtual),
            other => Err(format!("unknown backend '{}' (expected v4l2 or virtual)", other)),
        }
    }
}

/// Which way a camera faces relative to the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraFacing {
    /// Facing away from the user (also used for external webcams)
    #[default]
    Back,
    /// Facing the user
    Front,
}

impl CameraFacing {
    /// The opposite facing
    pub fn other(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }

    /// Guess facing from a device name
    ///
    /// Used when no explicit mapping is configured. Names like
    /// "Integrated Camera: front" or "user-facing" count as front.
    pub fn from_device_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if ["front", "user", "selfie"].iter().any(|k| lower.contains(k)) {
            CameraFacing::Front
        } else {
            CameraFacing::Back
        }
    }
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraFacing::Back => write!(f, "back"),
            CameraFacing::Front => write!(f, "front"),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub path: String, // Device node (e.g. /dev/video0) or virtual id
    pub facing: CameraFacing,
    pub driver: Option<String>,
}

/// Pixel format of frame data handed out by backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 4 bytes per pixel
    RGBA,
    /// 3 bytes per pixel
    RGB24,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::RGBA => 4,
            PixelFormat::RGB24 => 3,
        }
    }
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    pub stride: u32,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::RGBA,
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// Read one pixel as RGB, clamping coordinates to the frame
    pub fn pixel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride + x * self.format.bytes_per_pixel()) as usize;
        if idx + 2 < self.data.len() {
            (self.data[idx], self.data[idx + 1], self.data[idx + 2])
        } else {
            (0, 0, 0)
        }
    }

    /// Average BT.601 luminance (0.0-1.0), sampling ~10k pixels
    pub fn average_luminance(&self) -> f32 {
        let pixels = self.width as usize * self.height as usize;
        if pixels == 0 {
            return 0.0;
        }

        let sample_stride = (pixels / 10_000).max(1);
        let mut total = 0.0f64;
        let mut samples = 0usize;

        for i in (0..pixels).step_by(sample_stride) {
            let x = (i % self.width as usize) as u32;
            let y = (i / self.width as usize) as u32;
            let (r, g, b) = self.pixel_rgb(x, y);
            total += 0.299 * r as f64 / 255.0 + 0.587 * g as f64 / 255.0 + 0.114 * b as f64 / 255.0;
            samples += 1;
        }

        (total / samples.max(1) as f64) as f32
    }
}

/// Normalized point in the preview (0.0-1.0 on both axes, origin top-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusPoint {
    pub x: f32,
    pub y: f32,
}

impl FocusPoint {
    /// Create a point, clamping both coordinates into 0.0-1.0
    pub fn new(x: f32, y: f32) -> Self {
        let clamp = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.5 };
        Self {
            x: clamp(x),
            y: clamp(y),
        }
    }

    /// Map a tap in view coordinates to a normalized point
    pub fn from_view(x: f32, y: f32, view_width: f32, view_height: f32) -> Self {
        if view_width <= 0.0 || view_height <= 0.0 {
            return Self::center();
        }
        Self::new(x / view_width, y / view_height)
    }

    pub fn center() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

/// Everything a session is configured with at bind time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub facing: CameraFacing,
    pub flash_mode: FlashMode,
    pub jpeg_quality: u8,
}

/// Preview sink handed to `bind`
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;
/// Receiving end of the preview sink
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Backend error types
#[derive(Debug, Clone)]
pub enum BackendError {
    /// No device for the requested facing
    DeviceNotFound(String),
    /// Pipeline or device setup failed
    InitializationFailed(String),
    /// The session was unbound
    SessionClosed,
    /// Capture produced no usable frame
    CaptureFailed(String),
    /// The device does not support the requested control
    NotSupported(String),
    /// I/O error
    Io(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::SessionClosed => write!(f, "Camera session closed"),
            BackendError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            BackendError::NotSupported(msg) => write!(f, "Not supported: {}", msg),
            BackendError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

impl From<crate::errors::PhotoError> for BackendError {
    fn from(err: crate::errors::PhotoError) -> Self {
        BackendError::CaptureFailed(err.to_string())
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_other_alternates() {
        assert_eq!(CameraFacing::Back.other(), CameraFacing::Front);
        assert_eq!(CameraFacing::Front.other().other(), CameraFacing::Front);
    }

    #[test]
    fn test_facing_from_device_name() {
        assert_eq!(
            CameraFacing::from_device_name("Integrated Camera: Front"),
            CameraFacing::Front
        );
        assert_eq!(
            CameraFacing::from_device_name("USB2.0 HD UVC WebCam"),
            CameraFacing::Back
        );
    }

    #[test]
    fn test_focus_point_clamps() {
        let p = FocusPoint::new(-1.0, 2.0);
        assert_eq!((p.x, p.y), (0.0, 1.0));
        assert_eq!(FocusPoint::new(f32::NAN, 0.2).x, 0.5);

        let p = FocusPoint::from_view(50.0, 25.0, 100.0, 100.0);
        assert_eq!((p.x, p.y), (0.5, 0.25));
        assert_eq!(FocusPoint::from_view(1.0, 1.0, 0.0, 10.0), FocusPoint::center());
    }

    #[test]
    fn test_average_luminance() {
        let white = CameraFrame::from_rgba(4, 4, vec![255; 4 * 4 * 4]);
        assert!(white.average_luminance() > 0.99);

        let black = CameraFrame::from_rgba(4, 4, vec![0; 4 * 4 * 4]);
        assert!(black.average_luminance() < 0.01);

        let empty = CameraFrame::from_rgba(0, 0, Vec::new());
        assert_eq!(empty.average_luminance(), 0.0);
    }

    #[test]
    fn test_backend_type_parse() {
        assert_eq!("Virtual".parse::<CameraBackendType>(), Ok(CameraBackendType::Virtual));
        assert!("pipewire".parse::<CameraBackendType>().is_err());
    }
}
