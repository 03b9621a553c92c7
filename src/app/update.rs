// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` routes every message to a focused handler in `handlers`.
//! Until camera permission is granted only the permission result itself is
//! handled; everything else is dropped so the UI stays inert.

use crate::app::state::{CaptureController, Message};
use tracing::debug;

impl CaptureController {
    /// Main message handler
    pub fn update(&mut self, message: Message) {
        if !self.state.permission.is_granted() {
            match message {
                Message::PermissionResolved(status) => self.handle_permission_resolved(status),
                // Work started before a denial still has to be accounted for
                Message::PhotoSaved { output, result, burst } => {
                    self.handle_photo_saved(output, result, burst)
                }
                Message::ThumbnailLoaded { seq, thumbnail } => {
                    self.handle_thumbnail_loaded(seq, thumbnail)
                }
                other => debug!(message = ?other, "Ignoring message without camera permission"),
            }
            return;
        }

        match message {
            // ===== Permission & Lifecycle =====
            Message::PermissionResolved(status) => self.handle_permission_resolved(status),
            Message::RetryBind => self.handle_retry_bind(),

            // ===== Camera Controls =====
            Message::SwitchCamera => self.handle_switch_camera(),
            Message::SetFlashMode(mode) => self.handle_set_flash_mode(mode),
            Message::CycleFlashMode => self.handle_set_flash_mode(self.state.flash_mode.next()),
            Message::FocusTap(point) => self.handle_focus_tap(point),

            // ===== Capture =====
            Message::ShutterPressed => self.handle_shutter_pressed(),
            Message::ShutterReleased => self.handle_shutter_released(),
            Message::Capture => self.handle_capture(),
            Message::BurstTick(generation) => self.handle_burst_tick(generation),
            Message::PhotoSaved { output, result, burst } => {
                self.handle_photo_saved(output, result, burst)
            }

            // ===== Gallery =====
            Message::RefreshGalleryThumbnail => self.refresh_gallery_thumbnail(),
            Message::ThumbnailLoaded { seq, thumbnail } => {
                self.handle_thumbnail_loaded(seq, thumbnail)
            }
        }
    }
}
