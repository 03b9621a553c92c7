// SPDX-License-Identifier: MPL-2.0

//! Capture pipelines
//!
//! - [`photo`]: frame encoding, photo files and burst pacing

pub mod photo;
