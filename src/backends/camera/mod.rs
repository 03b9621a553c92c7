// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  CaptureController  │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackendManager│  ← Owns the single bound session
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraService Trait │  ← bind / has_camera / enumerate
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌──────┐  ┌─────────┐
//!   │ V4L2 │  │ Virtual │
//!   └──────┘  └─────────┘
//! ```

pub mod manager;
pub mod permission;
pub mod types;
pub mod v4l2;
pub mod v4l2_controls;

pub use manager::CameraBackendManager;
pub use permission::{AlwaysGranted, DeviceAccessGate, PermissionGate, PermissionStatus};
pub use types::*;

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A camera provider that can report availability and bind sessions
///
/// Implementations must allow `bind` to be called repeatedly; the manager
/// guarantees the previous session has been unbound first.
pub trait CameraService: Send + Sync {
    /// Enumerate cameras this service can bind
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Whether a camera with this facing exists
    fn has_camera(&self, facing: CameraFacing) -> bool {
        self.enumerate_cameras().iter().any(|c| c.facing == facing)
    }

    /// Open the camera for `config.facing` and start streaming
    ///
    /// Preview frames go to `preview` when provided. Frames that do not fit
    /// in the channel are dropped.
    fn bind(
        &self,
        config: &SessionConfig,
        preview: Option<FrameSender>,
    ) -> BackendResult<Arc<dyn CameraSession>>;

    /// The backend type identifier
    fn backend_type(&self) -> CameraBackendType;
}

/// An active, bound camera session
///
/// Calls may come from worker threads (captures run off the main context),
/// so implementations are `Send + Sync` and lock internally.
pub trait CameraSession: Send + Sync {
    /// The device this session is bound to
    fn device(&self) -> &CameraDevice;

    /// Capture one photo and write it as JPEG to `output`
    fn capture(&self, output: &Path) -> BackendResult<PathBuf>;

    /// Start focus and metering around a normalized point
    fn focus_at(&self, point: FocusPoint) -> BackendResult<()>;

    /// Turn the torch on or off
    fn set_torch(&self, enabled: bool) -> BackendResult<()>;

    /// Whether the bound camera has a controllable flash unit
    fn has_flash_unit(&self) -> bool;

    /// Stop streaming and release the device; idempotent
    fn unbind(&self);

    /// Whether `unbind` has been called
    fn is_bound(&self) -> bool;
}

/// Get a concrete service instance for a backend type
pub fn get_service(backend: CameraBackendType, config: &crate::config::Config) -> Arc<dyn CameraService> {
    match backend {
        CameraBackendType::V4l2 => Arc::new(v4l2::V4l2CameraService::new(
            config.front_camera_path.clone(),
            config.back_camera_path.clone(),
        )),
        CameraBackendType::Virtual => Arc::new(crate::backends::virtual_camera::VirtualCameraService::new()),
    }
}

/// Get the permission gate matching a backend type
pub fn get_permission_gate(backend: CameraBackendType) -> Box<dyn PermissionGate> {
    match backend {
        CameraBackendType::V4l2 => Box::new(DeviceAccessGate::default()),
        CameraBackendType::Virtual => Box::new(AlwaysGranted),
    }
}
