// SPDX-License-Identifier: MPL-2.0

//! Shared test helpers: a recording camera service and controller builders

#![allow(dead_code)]

use shutter::backends::camera::{
    AlwaysGranted, BackendError, BackendResult, CameraBackendType, CameraDevice, CameraFacing,
    CameraService, CameraSession, FocusPoint, FrameSender, PermissionGate, PermissionStatus,
    SessionConfig,
};
use shutter::{CaptureController, Config};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Everything the mock service observed
#[derive(Debug, Default)]
pub struct MockLog {
    pub binds: Vec<SessionConfig>,
    pub unbinds: usize,
    pub live_sessions: usize,
    pub max_live_sessions: usize,
    pub captures: Vec<PathBuf>,
    pub focus_points: Vec<FocusPoint>,
    pub torch: Vec<bool>,
}

/// Camera service that records calls and writes tiny JPEGs
pub struct MockCameraService {
    facings: Vec<CameraFacing>,
    flash_unit: bool,
    pub fail_bind: Arc<AtomicBool>,
    pub fail_capture: Arc<AtomicBool>,
    pub log: Arc<Mutex<MockLog>>,
}

impl MockCameraService {
    pub fn new(facings: &[CameraFacing]) -> Arc<Self> {
        Arc::new(Self::build(facings, true))
    }

    pub fn without_flash(facings: &[CameraFacing]) -> Arc<Self> {
        Arc::new(Self::build(facings, false))
    }

    fn build(facings: &[CameraFacing], flash_unit: bool) -> Self {
        Self {
            facings: facings.to_vec(),
            flash_unit,
            fail_bind: Arc::new(AtomicBool::new(false)),
            fail_capture: Arc::new(AtomicBool::new(false)),
            log: Arc::new(Mutex::new(MockLog::default())),
        }
    }

    pub fn bind_count(&self) -> usize {
        self.log.lock().unwrap().binds.len()
    }

    pub fn last_bind(&self) -> Option<SessionConfig> {
        self.log.lock().unwrap().binds.last().copied()
    }

    pub fn captures(&self) -> Vec<PathBuf> {
        self.log.lock().unwrap().captures.clone()
    }
}

impl CameraService for MockCameraService {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.facings
            .iter()
            .map(|&facing| CameraDevice {
                name: format!("Mock {} camera", facing),
                path: format!("mock:{}", facing),
                facing,
                driver: None,
            })
            .collect()
    }

    fn bind(
        &self,
        config: &SessionConfig,
        _preview: Option<FrameSender>,
    ) -> BackendResult<Arc<dyn CameraSession>> {
        if self.fail_bind.load(Ordering::SeqCst) {
            return Err(BackendError::InitializationFailed("device busy".to_string()));
        }
        let device = self
            .enumerate_cameras()
            .into_iter()
            .find(|c| c.facing == config.facing)
            .ok_or_else(|| BackendError::DeviceNotFound(config.facing.to_string()))?;

        {
            let mut log = self.log.lock().unwrap();
            log.binds.push(*config);
            log.live_sessions += 1;
            log.max_live_sessions = log.max_live_sessions.max(log.live_sessions);
        }

        Ok(Arc::new(MockSession {
            device,
            flash_unit: self.flash_unit,
            bound: AtomicBool::new(true),
            fail_capture: Arc::clone(&self.fail_capture),
            log: Arc::clone(&self.log),
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }
}

struct MockSession {
    device: CameraDevice,
    flash_unit: bool,
    bound: AtomicBool,
    fail_capture: Arc<AtomicBool>,
    log: Arc<Mutex<MockLog>>,
}

impl CameraSession for MockSession {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn capture(&self, output: &Path) -> BackendResult<PathBuf> {
        if !self.is_bound() {
            return Err(BackendError::SessionClosed);
        }
        if self.fail_capture.load(Ordering::SeqCst) {
            return Err(BackendError::CaptureFailed("sensor error".to_string()));
        }
        image::RgbImage::from_pixel(8, 6, image::Rgb([90, 120, 150]))
            .save(output)
            .map_err(|e| BackendError::Io(e.to_string()))?;
        self.log.lock().unwrap().captures.push(output.to_path_buf());
        Ok(output.to_path_buf())
    }

    fn focus_at(&self, point: FocusPoint) -> BackendResult<()> {
        self.log.lock().unwrap().focus_points.push(point);
        Ok(())
    }

    fn set_torch(&self, enabled: bool) -> BackendResult<()> {
        if !self.flash_unit {
            return Err(BackendError::NotSupported("no flash unit".to_string()));
        }
        self.log.lock().unwrap().torch.push(enabled);
        Ok(())
    }

    fn has_flash_unit(&self) -> bool {
        self.flash_unit
    }

    fn unbind(&self) {
        if self.bound.swap(false, Ordering::SeqCst) {
            let mut log = self.log.lock().unwrap();
            log.unbinds += 1;
            log.live_sessions -= 1;
        }
    }

    fn is_bound(&self) -> bool {
        self.bound.load(Ordering::SeqCst)
    }
}

/// Gate that always refuses
pub struct DenyAll;

impl PermissionGate for DenyAll {
    fn request(&self) -> PermissionStatus {
        PermissionStatus::Denied
    }
}

/// Config writing photos into `dir`, with notices that outlive the test
pub fn test_config(dir: &Path) -> Config {
    Config {
        photo_dir: Some(dir.to_path_buf()),
        notice_duration_ms: 600_000,
        ..Config::default()
    }
}

/// Started controller over `mock` with permission granted
pub fn started_controller(mock: &Arc<MockCameraService>, config: Config) -> CaptureController {
    let service: Arc<dyn CameraService> = mock.clone();
    let mut controller = CaptureController::new(config, service, Box::new(AlwaysGranted));
    controller.start();
    controller
}
