// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera backend
//!
//! Devices are discovered by scanning `/dev/video*` and streamed through a
//! GStreamer pipeline. Photos are taken from the newest preview frame, with
//! the sysfs flash LED lighting the scene when the flash mode asks for it.

mod enumeration;
mod pipeline;

pub use enumeration::{FacingOverrides, enumerate_v4l2_cameras};
pub use pipeline::{LatestFrame, V4l2Pipeline, pipeline_description, wait_for_frame};

use super::types::*;
use super::v4l2_controls;
use super::{CameraService, CameraSession};
use crate::constants::{flash, timing};
use crate::flash::{FlashHardware, FlashMode};
use crate::pipelines::photo::PhotoPipeline;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

/// V4L2 camera service
pub struct V4l2CameraService {
    overrides: FacingOverrides,
}

impl V4l2CameraService {
    /// Create a service, optionally pinning device nodes to facings
    pub fn new(front_path: Option<String>, back_path: Option<String>) -> Self {
        Self {
            overrides: FacingOverrides {
                front: front_path,
                back: back_path,
            },
        }
    }
}

impl CameraService for V4l2CameraService {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        enumerate_v4l2_cameras(&self.overrides)
    }

    fn bind(
        &self,
        config: &SessionConfig,
        preview: Option<FrameSender>,
    ) -> BackendResult<Arc<dyn CameraSession>> {
        let device = self
            .enumerate_cameras()
            .into_iter()
            .find(|c| c.facing == config.facing)
            .ok_or_else(|| BackendError::DeviceNotFound(format!("no {} camera", config.facing)))?;

        let session = V4l2Session::open(device, *config, preview)?;
        Ok(Arc::new(session))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }
}

/// A bound V4L2 device
pub struct V4l2Session {
    device: CameraDevice,
    config: SessionConfig,
    pipeline: Mutex<Option<V4l2Pipeline>>,
    frames: LatestFrame,
    flash: FlashHardware,
    torch_on: AtomicBool,
    bound: AtomicBool,
    photo: PhotoPipeline,
}

impl V4l2Session {
    fn open(
        device: CameraDevice,
        config: SessionConfig,
        preview: Option<FrameSender>,
    ) -> BackendResult<Self> {
        let pipeline = V4l2Pipeline::new(&device, preview)?;

        // Phone flash LEDs sit next to the rear sensor
        let flash = if device.facing == CameraFacing::Back {
            FlashHardware::detect()
        } else {
            FlashHardware::default()
        };
        if let Some(err) = &flash.permission_error {
            warn!(error = %err, "Flash unavailable");
        }

        let torch_on = torch_at_bind(&flash, config.flash_mode);
        let session = Self {
            device,
            config,
            frames: pipeline.frames(),
            pipeline: Mutex::new(Some(pipeline)),
            flash,
            torch_on: AtomicBool::new(torch_on),
            bound: AtomicBool::new(true),
            photo: PhotoPipeline::new(config.jpeg_quality),
        };

        info!(
            device = %session.device.name,
            facing = %session.device.facing,
            flash_mode = session.config.flash_mode.label(),
            "V4L2 session bound"
        );
        Ok(session)
    }

    fn next_frame(
        &self,
        after: Option<Instant>,
        timeout: std::time::Duration,
    ) -> BackendResult<CameraFrame> {
        wait_for_frame(&self.frames, after, timeout)
            .ok_or_else(|| BackendError::CaptureFailed("no frame from camera".to_string()))
    }

    /// Fire the flash for one lit frame, falling back to `unlit`
    fn flash_frame(&self, unlit: CameraFrame) -> CameraFrame {
        if let Err(e) = self.flash.set_all(true, flash::TORCH_INTENSITY) {
            warn!(error = %e, "Flash did not fire");
            return unlit;
        }
        let fired_at = Instant::now();
        let lit = self.next_frame(Some(fired_at), flash::LIT_FRAME_TIMEOUT);
        if let Err(e) = self.flash.set_all(false, 0.0) {
            warn!(error = %e, "Failed to turn flash off");
        }
        lit.unwrap_or(unlit)
    }
}

/// Light the torch for a session bound with flash On
///
/// An LED write failure only costs the torch; the session still binds.
fn torch_at_bind(leds: &FlashHardware, mode: FlashMode) -> bool {
    if mode != FlashMode::On || !leds.has_devices() {
        return false;
    }
    match leds.set_all(true, flash::TORCH_INTENSITY) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Torch did not turn on, binding without it");
            false
        }
    }
}

impl CameraSession for V4l2Session {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn capture(&self, output: &Path) -> BackendResult<PathBuf> {
        if !self.is_bound() {
            return Err(BackendError::SessionClosed);
        }

        let frame = self.next_frame(None, timing::FIRST_FRAME_TIMEOUT)?;

        let fire = self.config.flash_mode == FlashMode::Auto
            && self.has_flash_unit()
            && !self.torch_on.load(Ordering::SeqCst)
            && frame.average_luminance() < flash::AUTO_FLASH_LUMINANCE;

        let frame = if fire {
            debug!(luminance = frame.average_luminance(), "Auto flash firing");
            self.flash_frame(frame)
        } else {
            frame
        };

        Ok(self.photo.save_frame(&frame, output)?)
    }

    fn focus_at(&self, point: FocusPoint) -> BackendResult<()> {
        if !self.is_bound() {
            return Err(BackendError::SessionClosed);
        }
        v4l2_controls::focus_and_meter(&self.device.path, point)
    }

    fn set_torch(&self, enabled: bool) -> BackendResult<()> {
        if !self.has_flash_unit() {
            return Err(BackendError::NotSupported("no flash unit".to_string()));
        }
        self.flash.set_all(enabled, flash::TORCH_INTENSITY)?;
        self.torch_on.store(enabled, Ordering::SeqCst);
        debug!(enabled, "Torch set");
        Ok(())
    }

    fn has_flash_unit(&self) -> bool {
        self.flash.has_devices()
    }

    fn unbind(&self) {
        if !self.bound.swap(false, Ordering::SeqCst) {
            return;
        }
        if self.torch_on.swap(false, Ordering::SeqCst)
            && let Err(e) = self.flash.set_all(false, 0.0)
        {
            warn!(error = %e, "Failed to turn torch off on unbind");
        }
        if let Ok(mut guard) = self.pipeline.lock()
            && let Some(mut pipeline) = guard.take()
        {
            pipeline.stop();
        }
        info!(device = %self.device.name, "V4L2 session unbound");
    }

    fn is_bound(&self) -> bool {
        self.bound.load(Ordering::SeqCst)
    }
}

impl Drop for V4l2Session {
    fn drop(&mut self) {
        self.unbind();
    }
}
