// SPDX-License-Identifier: MPL-2.0

//! Capture controller
//!
//! The controller mediates between UI events (shutter, tap, camera switch)
//! and the camera service. It is driven by messages, like an Elm-style
//! application model.
//!
//! # Architecture
//!
//! - `state`: `Message`, `CaptureState`, `CaptureController`
//! - `update`: the message dispatcher
//! - `handlers::camera`: permission, binding, camera switch, flash, focus
//! - `handlers::capture`: shutter, burst ticks, single capture, save results
//! - `handlers::system`: gallery thumbnail and notices
//!
//! # Sequencing
//!
//! ```text
//!  UI events ──┐
//!              ├──► mpsc queue ──► update() ──► state
//!  tasks ──────┘                      │
//!    ▲                                ▼
//!    └──── capture / thumbnail / burst timer (tokio)
//! ```
//!
//! Whoever drains the queue ([`CaptureController::process_pending`],
//! [`CaptureController::process_for`] or [`CaptureController::settle`]) is
//! the only place state changes.

mod handlers;
mod state;
mod update;

pub use state::{CaptureController, CaptureState, CaptureStats, Message, Notice};

use crate::backends::camera::{
    CameraBackendManager, CameraService, FrameSender, PermissionGate,
};
use crate::config::Config;
use crate::storage::{self, Thumbnail};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

impl CaptureController {
    /// Create a controller; nothing is bound until [`start`](Self::start)
    pub fn new(
        config: Config,
        service: Arc<dyn CameraService>,
        permission_gate: Box<dyn PermissionGate>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let photo_dir = storage::photo_directory(&config);
        let state = CaptureState {
            facing: config.default_facing,
            flash_mode: config.default_flash_mode,
            ..CaptureState::default()
        };

        info!(
            backend = %service.backend_type(),
            photo_dir = %photo_dir.display(),
            "Creating capture controller"
        );

        Self {
            config,
            state,
            backend: CameraBackendManager::new(service),
            permission_gate,
            preview: None,
            photo_dir,
            tx,
            rx,
            burst_timer: None,
            burst_generation: 0,
            burst_requested: 0,
            burst_in_flight: 0,
            reserved_paths: HashSet::new(),
            pending_tasks: 0,
            thumbnail_seq: 0,
            thumbnail: None,
            notice: None,
            stats: CaptureStats::default(),
        }
    }

    /// Send preview frames of every bound session to `sender`
    pub fn with_preview(mut self, sender: FrameSender) -> Self {
        self.preview = Some(sender);
        self
    }

    /// Handle for queueing messages from other tasks
    pub fn sender(&self) -> mpsc::UnboundedSender<Message> {
        self.tx.clone()
    }

    /// Request permission, then bind and load the gallery thumbnail
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        let status = self.permission_gate.request();
        self.update(Message::PermissionResolved(status));
    }

    /// Cancel any burst and unbind the camera
    pub fn shutdown(&mut self) {
        if let Some(timer) = self.burst_timer.take() {
            timer.cancel();
        }
        self.state.burst_active = false;
        self.backend.shutdown();
    }

    // =========================================================================
    // Queue draining
    // =========================================================================

    /// Handle every message already queued; returns how many were handled
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.update(message);
            handled += 1;
        }
        handled
    }

    /// Wait for the next message and handle it
    pub async fn process_next(&mut self) {
        let next = self.rx.recv().await;
        if let Some(message) = next {
            self.update(message);
        }
    }

    /// Handle messages as they arrive for `duration`
    pub async fn process_for(&mut self, duration: Duration) {
        let deadline = tokio::time::Instant::now() + duration;
        loop {
            let next = tokio::time::timeout_at(deadline, self.rx.recv()).await;
            match next {
                Ok(Some(message)) => self.update(message),
                Ok(None) | Err(_) => break,
            }
        }
    }

    /// Handle messages until no background work is outstanding
    ///
    /// Returns `false` if `timeout` passed first. A running burst counts as
    /// outstanding work.
    pub async fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            self.process_pending();
            if self.is_idle() {
                return true;
            }
            let next = tokio::time::timeout_at(deadline, self.rx.recv()).await;
            match next {
                Ok(Some(message)) => self.update(message),
                Ok(None) | Err(_) => return false,
            }
        }
    }

    /// No burst running and no capture or thumbnail task outstanding
    pub fn is_idle(&self) -> bool {
        !self.state.burst_active && self.pending_tasks == 0
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    /// The current notice, unless it has expired
    pub fn notice(&self) -> Option<&Notice> {
        self.notice
            .as_ref()
            .filter(|n| n.created_at.elapsed() < self.config.notice_duration())
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    pub fn photo_dir(&self) -> &Path {
        &self.photo_dir
    }

    /// Name of the bound camera, if any
    pub fn camera_name(&self) -> Option<String> {
        self.backend.session().map(|s| s.device().name.clone())
    }

    /// Whether the bound camera has a flash unit
    pub fn has_flash_unit(&self) -> bool {
        self.backend
            .session()
            .map(|s| s.has_flash_unit())
            .unwrap_or(false)
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
