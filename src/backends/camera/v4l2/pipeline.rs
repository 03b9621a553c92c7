// SPDX-License-Identifier: MPL-2.0

//! GStreamer pipeline for V4L2 capture
//!
//! ```text
//! v4l2src → decodebin → videoconvert → RGBA appsink
//!                                          │
//!                         ┌────────────────┴───────────────┐
//!                         ▼                                ▼
//!                  latest frame slot                preview channel
//!                  (photo capture)                  (try_send, drops)
//! ```

use super::super::types::*;
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Slot holding the newest decoded frame
pub type LatestFrame = Arc<Mutex<Option<CameraFrame>>>;

/// Running capture pipeline for one device
pub struct V4l2Pipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    latest: LatestFrame,
    stopped: bool,
}

/// GStreamer launch line for a device node
pub fn pipeline_description(device_path: &str) -> String {
    format!(
        "v4l2src device={} ! decodebin ! videoconvert ! video/x-raw,format={} ! appsink name=sink",
        device_path,
        pipeline::OUTPUT_FORMAT
    )
}

impl V4l2Pipeline {
    /// Build and start a pipeline streaming from `device`
    pub fn new(device: &CameraDevice, preview: Option<FrameSender>) -> BackendResult<Self> {
        info!(device = %device.name, path = %device.path, "Creating V4L2 pipeline");

        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let description = pipeline_description(&device.path);
        debug!(%description, "Launching pipeline");
        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| BackendError::InitializationFailed("Not a pipeline".to_string()))?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| BackendError::InitializationFailed("Failed to cast appsink".to_string()))?;

        appsink.set_property("emit-signals", true);
        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        let latest: LatestFrame = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&latest);
        let frame_counter = AtomicU64::new(0);

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = frame_counter.fetch_add(1, Ordering::Relaxed);

                    let sample = appsink.pull_sample().map_err(|e| {
                        error!(frame = frame_num, error = ?e, "Failed to pull sample");
                        gstreamer::FlowError::Eos
                    })?;
                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let video_info =
                        VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let frame = CameraFrame {
                        width: video_info.width(),
                        height: video_info.height(),
                        data: Arc::from(map.as_slice()),
                        format: PixelFormat::RGBA,
                        stride: video_info.stride()[0] as u32,
                        captured_at: Instant::now(),
                    };

                    if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                        debug!(
                            frame = frame_num,
                            width = frame.width,
                            height = frame.height,
                            "Frame received"
                        );
                    }

                    if let Some(sender) = &preview {
                        let mut sender = sender.clone();
                        if sender.try_send(frame.clone()).is_err() && frame_num % 30 == 0 {
                            debug!(frame = frame_num, "Preview frame dropped (channel full)");
                        }
                    }

                    if let Ok(mut guard) = slot.lock() {
                        *guard = Some(frame);
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        pipeline.set_state(gstreamer::State::Playing).map_err(|e| {
            BackendError::InitializationFailed(format!("Failed to start pipeline: {}", e))
        })?;

        let (result, state, _) = pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        if let Err(e) = result {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(BackendError::InitializationFailed(format!(
                "Pipeline did not start: {:?}",
                e
            )));
        }
        if state != gstreamer::State::Playing {
            warn!(?state, "Pipeline is not in PLAYING state yet");
        }

        info!(path = %device.path, "V4L2 pipeline started");
        Ok(Self {
            pipeline,
            appsink,
            latest,
            stopped: false,
        })
    }

    /// Shared slot the pipeline writes each new frame into
    pub fn frames(&self) -> LatestFrame {
        Arc::clone(&self.latest)
    }

    /// Stop streaming and release the device
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        info!("Stopping V4L2 pipeline");

        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = %e, "Failed to stop pipeline");
            return;
        }
        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        debug!(?result, ?state, "V4L2 pipeline stopped");
    }
}

/// Wait for a frame captured after `after` (any frame when `None`)
pub fn wait_for_frame(
    slot: &LatestFrame,
    after: Option<Instant>,
    timeout: Duration,
) -> Option<CameraFrame> {
    let deadline = Instant::now() + timeout;
    loop {
        let newest = slot.lock().ok().and_then(|guard| guard.clone());
        if let Some(frame) = newest
            && after.is_none_or(|t| frame.captured_at > t)
        {
            return Some(frame);
        }
        if Instant::now() >= deadline {
            return None;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

impl Drop for V4l2Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_for_frame_honours_after() {
        let slot: LatestFrame = Arc::new(Mutex::new(None));
        assert!(wait_for_frame(&slot, None, Duration::from_millis(20)).is_none());

        let frame = CameraFrame::from_rgba(2, 2, vec![0; 16]);
        let stamped = frame.captured_at;
        *slot.lock().unwrap() = Some(frame);

        assert!(wait_for_frame(&slot, None, Duration::from_millis(20)).is_some());
        assert!(wait_for_frame(&slot, Some(stamped), Duration::from_millis(20)).is_none());
    }

    #[test]
    fn test_pipeline_description() {
        let desc = pipeline_description("/dev/video2");
        assert!(desc.starts_with("v4l2src device=/dev/video2 "));
        assert!(desc.contains("format=RGBA"));
        assert!(desc.ends_with("appsink name=sink"));
    }
}
