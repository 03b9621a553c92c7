// SPDX-License-Identifier: GPL-3.0-only

//! Capture operations handlers
//!
//! Handles the shutter press/release burst, single captures and the results
//! reported back by capture workers.

use crate::app::state::{CaptureController, Message};
use crate::pipelines::photo::BurstTimer;
use crate::storage;
use std::path::PathBuf;
use tracing::{debug, info, warn};

impl CaptureController {
    // =========================================================================
    // Burst
    // =========================================================================

    pub(crate) fn handle_shutter_pressed(&mut self) {
        if self.state.burst_active {
            debug!("Burst already active");
            return;
        }
        if self.backend.session().is_none() {
            debug!("No session bound, shutter ignored");
            return;
        }

        self.state.burst_active = true;
        self.burst_generation += 1;
        let generation = self.burst_generation;
        let interval = self.config.burst_interval();

        let tx = self.tx.clone();
        self.burst_timer = Some(BurstTimer::start(generation, interval, move |generation| {
            tx.send(Message::BurstTick(generation)).is_ok()
        }));

        info!(
            generation,
            interval_ms = interval.as_millis() as u64,
            "Burst started"
        );
    }

    pub(crate) fn handle_shutter_released(&mut self) {
        if !self.state.burst_active {
            debug!("Shutter released without active burst");
            return;
        }

        self.state.burst_active = false;
        if let Some(timer) = self.burst_timer.take() {
            timer.cancel();
        }
        info!(
            generation = self.burst_generation,
            requested = self.burst_requested,
            in_flight = self.burst_in_flight,
            "Burst ended"
        );

        self.finish_burst_if_done();
    }

    pub(crate) fn handle_burst_tick(&mut self, generation: u64) {
        if !self.state.burst_active || generation != self.burst_generation {
            debug!(
                generation,
                current = self.burst_generation,
                "Discarding stale burst tick"
            );
            return;
        }
        self.request_capture(true);
    }

    /// Refresh the thumbnail once the released burst has fully landed
    fn finish_burst_if_done(&mut self) {
        if self.state.burst_active || self.burst_in_flight > 0 || self.burst_requested == 0 {
            return;
        }
        self.burst_requested = 0;
        if self.config.refresh_after_burst {
            self.refresh_gallery_thumbnail();
        } else {
            debug!("Burst finished, thumbnail refresh disabled");
        }
    }

    // =========================================================================
    // Capture
    // =========================================================================

    pub(crate) fn handle_capture(&mut self) {
        self.request_capture(false);
    }

    /// Hand one capture to a worker thread; the result comes back as `PhotoSaved`
    fn request_capture(&mut self, burst: bool) {
        let Some(session) = self.backend.session().cloned() else {
            debug!(burst, "No session bound, capture ignored");
            return;
        };

        let output = storage::next_photo_path(&self.photo_dir, &self.reserved_paths);
        self.reserved_paths.insert(output.clone());
        self.stats.capture_requests += 1;
        self.pending_tasks += 1;
        if burst {
            self.burst_requested += 1;
            self.burst_in_flight += 1;
        }

        debug!(path = %output.display(), burst, "Capturing photo");

        let tx = self.tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = session.capture(&output).map_err(|e| e.to_string());
            let _ = tx.send(Message::PhotoSaved {
                output,
                result,
                burst,
            });
        });
    }

    pub(crate) fn handle_photo_saved(
        &mut self,
        output: PathBuf,
        result: Result<PathBuf, String>,
        burst: bool,
    ) {
        self.pending_tasks = self.pending_tasks.saturating_sub(1);
        self.reserved_paths.remove(&output);

        match result {
            Ok(path) => {
                self.stats.saved += 1;
                info!(path = %path.display(), burst, "Photo captured");
                if !burst {
                    self.refresh_gallery_thumbnail();
                }
            }
            Err(e) => {
                self.stats.failures += 1;
                warn!(error = %e, burst, "Photo capture failed");
                self.show_notice(format!("Photo capture error: {}", e));
            }
        }

        if burst {
            self.burst_in_flight = self.burst_in_flight.saturating_sub(1);
            self.finish_burst_if_done();
        }
    }
}
