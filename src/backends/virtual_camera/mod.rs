// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! Synthetic cameras that render a moving test pattern. They stand in for
//! real hardware on machines without a webcam and in tests.
//!
//! # Rendering
//!
//! ```text
//! diagonal gradient (scrolls with time)
//!        │
//!        ▼
//! facing tint ── front cameras are warmer
//!        │
//!        ▼
//! torch boost ── flash on or auto-fired for a capture
//!        │
//!        ▼
//! focus marker ── crosshair at the last tap
//! ```

use crate::backends::camera::types::*;
use crate::backends::camera::{CameraService, CameraSession};
use crate::constants::{flash, virtual_camera};
use crate::flash::FlashMode;
use crate::pipelines::photo::PhotoPipeline;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Per-camera description for the virtual service
#[derive(Debug, Clone, Copy)]
struct VirtualCamera {
    facing: CameraFacing,
    has_flash: bool,
    /// Base brightness of the pattern (0.0-1.0)
    brightness: f32,
}

/// Virtual camera service
pub struct VirtualCameraService {
    cameras: Vec<VirtualCamera>,
}

impl Default for VirtualCameraService {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualCameraService {
    /// A back camera with flash and a front camera without
    pub fn new() -> Self {
        Self::with_facings(&[CameraFacing::Back, CameraFacing::Front])
    }

    /// One camera per facing; only back cameras get a flash
    pub fn with_facings(facings: &[CameraFacing]) -> Self {
        let cameras = facings
            .iter()
            .map(|&facing| VirtualCamera {
                facing,
                has_flash: facing == CameraFacing::Back,
                brightness: 0.6,
            })
            .collect();
        Self { cameras }
    }

    /// Use a dark scene, so auto flash fires on capture
    pub fn dark(mut self) -> Self {
        for camera in &mut self.cameras {
            camera.brightness = 0.1;
        }
        self
    }

    fn device_for(camera: &VirtualCamera) -> CameraDevice {
        CameraDevice {
            name: format!("Virtual {} camera", camera.facing),
            path: format!("virtual:{}", camera.facing),
            facing: camera.facing,
            driver: Some("virtual".to_string()),
        }
    }
}

impl CameraService for VirtualCameraService {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.cameras.iter().map(Self::device_for).collect()
    }

    fn bind(
        &self,
        config: &SessionConfig,
        preview: Option<FrameSender>,
    ) -> BackendResult<Arc<dyn CameraSession>> {
        let camera = self
            .cameras
            .iter()
            .find(|c| c.facing == config.facing)
            .copied()
            .ok_or_else(|| BackendError::DeviceNotFound(format!("no {} camera", config.facing)))?;

        let session = Arc::new(VirtualSession::new(camera, *config));
        if let Some(preview) = preview {
            session.start_preview(preview);
        }
        info!(facing = %camera.facing, "Virtual camera bound");
        Ok(session)
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }
}

/// Session state shared with the preview thread
struct Shared {
    camera: VirtualCamera,
    started: Instant,
    torch: AtomicBool,
    bound: AtomicBool,
    focus: Mutex<Option<FocusPoint>>,
}

impl Shared {
    fn render(&self, lit: bool) -> CameraFrame {
        let focus = self.focus.lock().ok().and_then(|guard| *guard);
        let phase = (self.started.elapsed().as_millis() / 20) as u32;
        render_pattern(
            virtual_camera::WIDTH,
            virtual_camera::HEIGHT,
            phase,
            self.camera,
            lit || self.torch.load(Ordering::SeqCst),
            focus,
        )
    }
}

/// A bound virtual camera
pub struct VirtualSession {
    device: CameraDevice,
    config: SessionConfig,
    shared: Arc<Shared>,
    preview_thread: Mutex<Option<JoinHandle<()>>>,
    photo: PhotoPipeline,
}

impl VirtualSession {
    fn new(camera: VirtualCamera, config: SessionConfig) -> Self {
        let shared = Arc::new(Shared {
            camera,
            started: Instant::now(),
            torch: AtomicBool::new(config.flash_mode == FlashMode::On && camera.has_flash),
            bound: AtomicBool::new(true),
            focus: Mutex::new(None),
        });
        Self {
            device: VirtualCameraService::device_for(&camera),
            config,
            shared,
            preview_thread: Mutex::new(None),
            photo: PhotoPipeline::new(config.jpeg_quality),
        }
    }

    fn start_preview(&self, mut preview: FrameSender) {
        let shared = Arc::clone(&self.shared);
        let handle = std::thread::spawn(move || {
            let mut frames = 0u64;
            while shared.bound.load(Ordering::SeqCst) {
                let frame = shared.render(false);
                match preview.try_send(frame) {
                    Ok(()) => frames += 1,
                    Err(e) if e.is_disconnected() => break,
                    Err(_) => {}
                }
                std::thread::sleep(virtual_camera::FRAME_DURATION);
            }
            debug!(frames, "Virtual preview thread exiting");
        });
        if let Ok(mut guard) = self.preview_thread.lock() {
            *guard = Some(handle);
        }
    }
}

impl CameraSession for VirtualSession {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn capture(&self, output: &Path) -> BackendResult<PathBuf> {
        if !self.is_bound() {
            return Err(BackendError::SessionClosed);
        }

        let frame = self.shared.render(false);
        let fire = self.config.flash_mode == FlashMode::Auto
            && self.has_flash_unit()
            && frame.average_luminance() < flash::AUTO_FLASH_LUMINANCE;
        let frame = if fire {
            debug!("Auto flash firing");
            self.shared.render(true)
        } else {
            frame
        };

        Ok(self.photo.save_frame(&frame, output)?)
    }

    fn focus_at(&self, point: FocusPoint) -> BackendResult<()> {
        if !self.is_bound() {
            return Err(BackendError::SessionClosed);
        }
        if let Ok(mut guard) = self.shared.focus.lock() {
            *guard = Some(point);
        }
        debug!(x = point.x, y = point.y, "Virtual focus");
        Ok(())
    }

    fn set_torch(&self, enabled: bool) -> BackendResult<()> {
        if !self.has_flash_unit() {
            return Err(BackendError::NotSupported("no flash unit".to_string()));
        }
        self.shared.torch.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn has_flash_unit(&self) -> bool {
        self.shared.camera.has_flash
    }

    fn unbind(&self) {
        if !self.shared.bound.swap(false, Ordering::SeqCst) {
            return;
        }
        let handle = self.preview_thread.lock().ok().and_then(|mut guard| guard.take());
        if let Some(handle) = handle
            && handle.join().is_err()
        {
            warn!("Virtual preview thread panicked");
        }
        info!(facing = %self.device.facing, "Virtual camera unbound");
    }

    fn is_bound(&self) -> bool {
        self.shared.bound.load(Ordering::SeqCst)
    }
}

impl Drop for VirtualSession {
    fn drop(&mut self) {
        self.unbind();
    }
}

fn render_pattern(
    width: u32,
    height: u32,
    phase: u32,
    camera: VirtualCamera,
    lit: bool,
    focus: Option<FocusPoint>,
) -> CameraFrame {
    let gain = if lit {
        (camera.brightness + 0.4).min(1.0)
    } else {
        camera.brightness
    };
    let (tint_r, tint_b) = match camera.facing {
        CameraFacing::Back => (0.9, 1.0),
        CameraFacing::Front => (1.0, 0.8),
    };

    let mut data = vec![0u8; (width * height * 4) as usize];
    for y in 0..height {
        for x in 0..width {
            let t = ((x + y + phase) % (width + height)) as f32 / (width + height) as f32;
            let base = 255.0 * gain;
            let idx = ((y * width + x) * 4) as usize;
            data[idx] = (base * tint_r * (0.5 + 0.5 * t)) as u8;
            data[idx + 1] = (base * (1.0 - 0.5 * t)) as u8;
            data[idx + 2] = (base * tint_b * 0.75) as u8;
            data[idx + 3] = 255;
        }
    }

    if let Some(point) = focus {
        draw_crosshair(&mut data, width, height, point);
    }

    CameraFrame::from_rgba(width, height, data)
}

fn draw_crosshair(data: &mut [u8], width: u32, height: u32, point: FocusPoint) {
    if width == 0 || height == 0 {
        return;
    }
    let cx = ((point.x * (width - 1) as f32) as i64).clamp(0, width as i64 - 1);
    let cy = ((point.y * (height - 1) as f32) as i64).clamp(0, height as i64 - 1);
    let arm = 12i64;

    let mut paint = |x: i64, y: i64| {
        if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
            return;
        }
        let idx = ((y as u32 * width + x as u32) * 4) as usize;
        data[idx..idx + 3].copy_from_slice(&[255, 220, 0]);
    };
    for d in -arm..=arm {
        paint(cx + d, cy);
        paint(cx, cy + d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_config(facing: CameraFacing, flash_mode: FlashMode) -> SessionConfig {
        SessionConfig {
            facing,
            flash_mode,
            jpeg_quality: 80,
        }
    }

    #[test]
    fn test_enumerates_both_facings() {
        let service = VirtualCameraService::new();
        assert!(service.has_camera(CameraFacing::Back));
        assert!(service.has_camera(CameraFacing::Front));

        let back_only = VirtualCameraService::with_facings(&[CameraFacing::Back]);
        assert!(!back_only.has_camera(CameraFacing::Front));
    }

    #[test]
    fn test_bind_missing_facing_fails() {
        let service = VirtualCameraService::with_facings(&[CameraFacing::Back]);
        let result = service.bind(&session_config(CameraFacing::Front, FlashMode::Off), None);
        assert!(matches!(result, Err(BackendError::DeviceNotFound(_))));
    }

    #[test]
    fn test_capture_writes_jpeg_and_unbind_closes() {
        let dir = tempfile::tempdir().unwrap();
        let service = VirtualCameraService::new();
        let session = service
            .bind(&session_config(CameraFacing::Back, FlashMode::Off), None)
            .unwrap();

        let out = dir.path().join("shot.jpg");
        session.capture(&out).unwrap();
        let img = image::open(&out).unwrap();
        assert_eq!(img.width(), virtual_camera::WIDTH);

        session.unbind();
        session.unbind();
        assert!(!session.is_bound());
        assert!(matches!(
            session.capture(&dir.path().join("late.jpg")),
            Err(BackendError::SessionClosed)
        ));
    }

    #[test]
    fn test_front_camera_has_no_flash() {
        let service = VirtualCameraService::new();
        let session = service
            .bind(&session_config(CameraFacing::Front, FlashMode::Off), None)
            .unwrap();
        assert!(!session.has_flash_unit());
        assert!(matches!(
            session.set_torch(true),
            Err(BackendError::NotSupported(_))
        ));
    }

    #[test]
    fn test_torch_brightens_pattern() {
        let camera = VirtualCamera {
            facing: CameraFacing::Back,
            has_flash: true,
            brightness: 0.1,
        };
        let dark = render_pattern(32, 24, 0, camera, false, None);
        let lit = render_pattern(32, 24, 0, camera, true, None);
        assert!(dark.average_luminance() < flash::AUTO_FLASH_LUMINANCE);
        assert!(lit.average_luminance() > dark.average_luminance());
    }

    #[test]
    fn test_auto_flash_lights_dark_capture() {
        let dir = tempfile::tempdir().unwrap();
        let service = VirtualCameraService::new().dark();
        let mean = |mode: FlashMode, name: &str| {
            let session = service
                .bind(&session_config(CameraFacing::Back, mode), None)
                .unwrap();
            let out = session.capture(&dir.path().join(name)).unwrap();
            session.unbind();
            let img = image::open(out).unwrap().to_luma8();
            img.pixels().map(|p| p.0[0] as u64).sum::<u64>() / img.pixels().len() as u64
        };

        assert!(mean(FlashMode::Auto, "auto.jpg") > mean(FlashMode::Off, "off.jpg"));
    }

    #[test]
    fn test_focus_marker_drawn() {
        let camera = VirtualCamera {
            facing: CameraFacing::Back,
            has_flash: true,
            brightness: 0.1,
        };
        let frame = render_pattern(64, 48, 0, camera, false, Some(FocusPoint::center()));
        let (r, g, _) = frame.pixel_rgb(31, 23);
        assert_eq!((r, g), (255, 220));
    }

    #[test]
    fn test_preview_frames_delivered() {
        let (tx, mut rx) = futures::channel::mpsc::channel(4);
        let service = VirtualCameraService::new();
        let session = service
            .bind(&session_config(CameraFacing::Back, FlashMode::Off), Some(tx))
            .unwrap();

        let frame = futures::executor::block_on(futures::StreamExt::next(&mut rx));
        assert!(frame.is_some());
        session.unbind();
    }
}
