// SPDX-License-Identifier: GPL-3.0-only

//! Camera handlers
//!
//! Permission, session binding, camera switching, flash mode and focus.

use crate::app::state::CaptureController;
use crate::backends::camera::types::{BackendError, CameraFacing, FocusPoint, SessionConfig};
use crate::backends::camera::PermissionStatus;
use crate::flash::FlashMode;
use crate::storage;
use tracing::{debug, info, warn};

impl CaptureController {
    // =========================================================================
    // Permission & Binding
    // =========================================================================

    pub(crate) fn handle_permission_resolved(&mut self, status: PermissionStatus) {
        if status == self.state.permission {
            debug!(?status, "Permission unchanged");
            return;
        }
        self.state.permission = status;

        if !status.is_granted() {
            info!(?status, "Camera permission not granted");
            self.shutdown();
            self.show_notice("Camera permission needed");
            return;
        }

        info!("Camera permission granted");
        self.show_notice("Camera permission granted");

        if let Err(e) = storage::ensure_photo_directory(&self.config) {
            warn!(error = %e, "Failed to create photo directory");
        }

        self.select_available_facing();
        self.bind_camera();
        self.refresh_gallery_thumbnail();
    }

    pub(crate) fn handle_retry_bind(&mut self) {
        if !self.state.bind_failed && self.backend.session().is_some() {
            debug!("Camera already bound, retry ignored");
            return;
        }
        info!("Retrying camera bind");
        self.select_available_facing();
        self.bind_camera();
    }

    /// Fall back to the other facing when the configured one is missing
    fn select_available_facing(&mut self) {
        let facing = self.state.facing;
        if !self.backend.has_camera(facing) && self.backend.has_camera(facing.other()) {
            info!(from = %facing, to = %facing.other(), "Configured camera missing, using the other one");
            self.state.facing = facing.other();
        }
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            facing: self.state.facing,
            flash_mode: if self.config.flash_control {
                self.state.flash_mode
            } else {
                FlashMode::Off
            },
            jpeg_quality: self.config.jpeg_quality,
        }
    }

    /// Unbind the current session and bind one matching the current state
    pub(crate) fn bind_camera(&mut self) {
        let config = self.session_config();
        match self.backend.rebind(&config, self.preview.clone()) {
            Ok(session) => {
                self.state.bind_failed = false;
                self.stats.binds += 1;
                info!(
                    device = %session.device().name,
                    facing = %config.facing,
                    flash = config.flash_mode.label(),
                    "Camera ready"
                );
            }
            Err(e) => {
                warn!(error = %e, facing = %config.facing, "Camera bind failed");
                self.state.bind_failed = true;
                self.show_notice(format!("Camera unavailable: {}", e));
            }
        }
    }

    // =========================================================================
    // Camera Controls
    // =========================================================================

    pub(crate) fn handle_switch_camera(&mut self) {
        let current = self.state.facing;
        let target = if current == CameraFacing::Back && self.backend.has_camera(CameraFacing::Front) {
            CameraFacing::Front
        } else if self.backend.has_camera(CameraFacing::Back) {
            CameraFacing::Back
        } else {
            current
        };

        info!(from = %current, to = %target, "Switching camera");
        self.state.facing = target;
        self.bind_camera();
    }

    /// Apply a flash mode
    ///
    /// Choosing Auto always rebinds, even when Auto is already selected, so
    /// the next capture runs on a session configured for it. Off and On toggle
    /// the torch on the live session, except when leaving Auto: that also
    /// rebinds, because a session bound for Auto keeps its auto decision
    /// until it is replaced.
    pub(crate) fn handle_set_flash_mode(&mut self, mode: FlashMode) {
        let no_flash_unit = self
            .backend
            .session()
            .is_some_and(|session| !session.has_flash_unit());
        if !self.config.flash_control || no_flash_unit {
            debug!(mode = mode.label(), "Flash request rejected");
            self.show_notice("Flash not available");
            return;
        }

        let previous = self.state.flash_mode;
        if previous == mode && mode != FlashMode::Auto {
            debug!(mode = mode.label(), "Flash mode unchanged");
            return;
        }
        self.state.flash_mode = mode;
        info!(from = previous.label(), to = mode.label(), "Flash mode changed");

        let Some(session) = self.backend.session().cloned() else {
            debug!("No session bound, flash mode applies on next bind");
            return;
        };

        if mode == FlashMode::Auto || previous == FlashMode::Auto {
            self.bind_camera();
            return;
        }

        if let Err(e) = session.set_torch(mode == FlashMode::On) {
            warn!(error = %e, "Failed to set torch");
        }
    }

    pub(crate) fn handle_focus_tap(&mut self, point: FocusPoint) {
        if !self.config.tap_to_focus {
            debug!("Tap to focus disabled");
            return;
        }
        let Some(session) = self.backend.session().cloned() else {
            debug!("No session bound, focus tap ignored");
            return;
        };

        match session.focus_at(point) {
            Ok(()) => debug!(x = point.x, y = point.y, "Focus requested"),
            Err(BackendError::NotSupported(reason)) => debug!(%reason, "Focus not supported"),
            Err(e) => warn!(error = %e, "Focus request failed"),
        }
    }
}
