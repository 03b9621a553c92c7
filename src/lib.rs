// SPDX-License-Identifier: MPL-2.0

//! Shutter - a single-screen camera application
//!
//! Live preview, single and burst photo capture, front/back switching,
//! flash modes, tap-to-focus and a gallery thumbnail of the newest photo.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: The capture controller and its message handlers
//! - [`backends`]: Camera service abstraction (V4L2, virtual)
//! - [`pipelines`]: Photo encoding and burst pacing
//! - [`flash`]: Flash modes and sysfs flash LEDs
//! - [`storage`]: Photo naming, gallery lookup and thumbnails
//! - [`config`]: User configuration handling
//! - [`terminal`]: Interactive terminal front end
//!
//! # Example
//!
//! ```no_run
//! use shutter::backends::camera::{AlwaysGranted, get_service};
//! use shutter::{CaptureController, Config, Message};
//!
//! # async fn demo() {
//! let config = Config::default();
//! let service = get_service(config.backend, &config);
//! let mut controller = CaptureController::new(config, service, Box::new(AlwaysGranted));
//! controller.start();
//! controller.sender().send(Message::Capture).ok();
//! controller.settle(std::time::Duration::from_secs(5)).await;
//! # }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flash;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{CaptureController, CaptureState, CaptureStats, Message, Notice};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use flash::FlashMode;
