// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use shutter::constants::{burst, flash, photo};
use std::time::Duration;

#[test]
fn test_burst_interval() {
    assert_eq!(burst::INTERVAL, Duration::from_millis(500));
    assert!(burst::MIN_INTERVAL < burst::INTERVAL);
}

#[test]
fn test_photo_constants() {
    assert_eq!(photo::EXTENSION, "jpg");
    assert!((1..=100).contains(&photo::DEFAULT_JPEG_QUALITY));
    assert!(photo::THUMBNAIL_MAX_EDGE > 0);
}

#[test]
fn test_auto_flash_threshold_in_range() {
    assert!(flash::AUTO_FLASH_LUMINANCE > 0.0 && flash::AUTO_FLASH_LUMINANCE < 1.0);
    assert!(flash::TORCH_INTENSITY <= 1.0);
}
