// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application name, used for the photo folder and the config directory
pub const APP_NAME: &str = "shutter";

/// Burst capture constants
pub mod burst {
    use super::Duration;

    /// Interval between burst captures while the shutter is held
    pub const INTERVAL: Duration = Duration::from_millis(500);

    /// Lower bound accepted from configuration
    pub const MIN_INTERVAL: Duration = Duration::from_millis(50);
}

/// Photo file constants
pub mod photo {
    /// Extension of every photo written by the app
    pub const EXTENSION: &str = "jpg";

    /// chrono format producing `yyyy-MM-dd-HH-mm-ss-SSS`
    pub const FILENAME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%3f";

    /// Default JPEG quality (1-100)
    pub const DEFAULT_JPEG_QUALITY: u8 = 92;

    /// Longest edge of the decoded gallery thumbnail
    pub const THUMBNAIL_MAX_EDGE: u32 = 160;
}

/// Flash constants
pub mod flash {
    use super::Duration;

    /// Average luminance (0.0-1.0) below which auto flash fires
    pub const AUTO_FLASH_LUMINANCE: f32 = 0.25;

    /// How long to wait for a lit frame after the torch comes on
    pub const LIT_FRAME_TIMEOUT: Duration = Duration::from_millis(600);

    /// Torch intensity used for capture flash and torch mode (0.0-1.0)
    pub const TORCH_INTENSITY: f32 = 1.0;
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Maximum buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Output pixel format for appsink
    pub const OUTPUT_FORMAT: &str = "RGBA";
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Default lifetime of a transient notice
    pub const NOTICE_DURATION: Duration = Duration::from_millis(2000);

    /// Wait for the first frame before a capture gives up
    pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(3);
}

/// Virtual camera constants
pub mod virtual_camera {
    use super::Duration;

    /// Test pattern size (4:3, matching the capture aspect ratio)
    pub const WIDTH: u32 = 640;
    pub const HEIGHT: u32 = 480;

    /// Preview frame period (~30fps)
    pub const FRAME_DURATION: Duration = Duration::from_millis(33);
}
