// SPDX-License-Identifier: GPL-3.0-only

//! Controller state types
//!
//! - `Message`: everything the UI and background tasks can tell the controller
//! - `CaptureState`: camera selection, flash mode, burst flag, permission
//! - `CaptureController`: owns the state, the bound session and the message queue

use crate::backends::camera::types::{CameraFacing, FocusPoint, FrameSender};
use crate::backends::camera::{CameraBackendManager, PermissionGate, PermissionStatus};
use crate::config::Config;
use crate::flash::FlashMode;
use crate::pipelines::photo::BurstTimer;
use crate::storage::Thumbnail;
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Messages handled on the controller's sequencing context
#[derive(Debug, Clone)]
pub enum Message {
    // ===== Permission & Lifecycle =====
    /// Result of the camera permission request
    PermissionResolved(PermissionStatus),
    /// Try binding the camera again after a failure
    RetryBind,

    // ===== Camera Controls =====
    /// Toggle between the front and back camera
    SwitchCamera,
    /// Select a flash mode
    SetFlashMode(FlashMode),
    /// Step to the next flash mode (Off -> On -> Auto)
    CycleFlashMode,
    /// Focus and meter at a normalized preview point
    FocusTap(FocusPoint),

    // ===== Capture =====
    /// Shutter held down: start a burst
    ShutterPressed,
    /// Shutter let go: end the burst
    ShutterReleased,
    /// Take a single photo
    Capture,
    /// Burst timer tick tagged with its burst generation
    BurstTick(u64),
    /// A capture finished on a worker thread
    PhotoSaved {
        /// Path the capture was asked to write
        output: PathBuf,
        result: Result<PathBuf, String>,
        burst: bool,
    },

    // ===== Gallery =====
    /// Reload the gallery thumbnail from disk
    RefreshGalleryThumbnail,
    /// Thumbnail decode finished (`seq` orders overlapping requests)
    ThumbnailLoaded {
        seq: u64,
        thumbnail: Option<Thumbnail>,
    },
}

/// Capture session state owned by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureState {
    pub facing: CameraFacing,
    pub flash_mode: FlashMode,
    pub burst_active: bool,
    pub permission: PermissionStatus,
    /// Last bind attempt failed; `RetryBind` tries again
    pub bind_failed: bool,
}

/// Transient user-visible message
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub created_at: Instant,
}

impl Notice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: Instant::now(),
        }
    }
}

/// Counters surfaced by the CLI and the tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureStats {
    /// Successful session binds
    pub binds: u64,
    /// Captures handed to the session
    pub capture_requests: u64,
    pub saved: u64,
    pub failures: u64,
    /// Gallery thumbnail reloads started
    pub thumbnail_refreshes: u64,
}

/// The capture controller
///
/// All state changes happen in [`CaptureController::update`], called by
/// whoever drains the message queue. Slow work (capture, thumbnail decode,
/// burst timing) runs on tokio tasks that report back with a [`Message`].
pub struct CaptureController {
    pub(crate) config: Config,
    pub(crate) state: CaptureState,
    pub(crate) backend: CameraBackendManager,
    pub(crate) permission_gate: Box<dyn PermissionGate>,
    pub(crate) preview: Option<FrameSender>,
    pub(crate) photo_dir: PathBuf,

    pub(crate) tx: mpsc::UnboundedSender<Message>,
    pub(crate) rx: mpsc::UnboundedReceiver<Message>,

    // ===== Burst =====
    pub(crate) burst_timer: Option<BurstTimer>,
    pub(crate) burst_generation: u64,
    /// Burst captures requested since the last burst-end refresh
    pub(crate) burst_requested: u64,
    /// Burst captures not yet reported back
    pub(crate) burst_in_flight: u64,

    // ===== Background work =====
    /// Output paths of captures still being written
    pub(crate) reserved_paths: HashSet<PathBuf>,
    /// Spawned tasks that have not reported back
    pub(crate) pending_tasks: u64,
    pub(crate) thumbnail_seq: u64,

    // ===== Presentation =====
    pub(crate) thumbnail: Option<Thumbnail>,
    pub(crate) notice: Option<Notice>,
    pub(crate) stats: CaptureStats,
}
