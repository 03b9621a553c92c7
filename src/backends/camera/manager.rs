// SPDX-License-Identifier: GPL-3.0-only

//! Camera session lifecycle manager
//!
//! The manager owns the one session that may be bound at any time and
//! always unbinds it before binding a replacement.

use super::types::*;
use super::{CameraService, CameraSession};
use std::sync::Arc;
use tracing::{info, warn};

/// Camera session manager
pub struct CameraBackendManager {
    service: Arc<dyn CameraService>,
    session: Option<Arc<dyn CameraSession>>,
    bind_count: u64,
}

impl CameraBackendManager {
    pub fn new(service: Arc<dyn CameraService>) -> Self {
        info!(backend = %service.backend_type(), "Creating camera backend manager");
        Self {
            service,
            session: None,
            bind_count: 0,
        }
    }

    /// Get the backend type
    pub fn backend_type(&self) -> CameraBackendType {
        self.service.backend_type()
    }

    /// Whether a camera with this facing exists
    pub fn has_camera(&self, facing: CameraFacing) -> bool {
        self.service.has_camera(facing)
    }

    /// Enumerate available cameras
    pub fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        let cameras = self.service.enumerate_cameras();
        if cameras.is_empty() {
            Err(BackendError::DeviceNotFound("No cameras found".to_string()))
        } else {
            Ok(cameras)
        }
    }

    /// Unbind the current session (if any) and bind a new one
    ///
    /// On failure no session is left bound.
    pub fn rebind(
        &mut self,
        config: &SessionConfig,
        preview: Option<FrameSender>,
    ) -> BackendResult<Arc<dyn CameraSession>> {
        self.shutdown();

        self.bind_count += 1;
        info!(
            facing = %config.facing,
            flash = ?config.flash_mode,
            bind = self.bind_count,
            "Binding camera session"
        );

        match self.service.bind(config, preview) {
            Ok(session) => {
                info!(device = %session.device().name, "Camera session bound");
                self.session = Some(Arc::clone(&session));
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "Failed to bind camera session");
                Err(e)
            }
        }
    }

    /// Unbind the current session
    pub fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            info!(device = %session.device().name, "Unbinding camera session");
            session.unbind();
        }
    }

    /// The bound session, if any
    pub fn session(&self) -> Option<&Arc<dyn CameraSession>> {
        self.session.as_ref()
    }

    /// Number of bind attempts so far
    pub fn bind_count(&self) -> u64 {
        self.bind_count
    }
}

impl Drop for CameraBackendManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
