// SPDX-License-Identifier: GPL-3.0-only

//! Flash mode and hardware flash LED control via Linux sysfs
//!
//! Discovers flash LEDs exposed at `/sys/class/leds/*:flash` and drives them
//! in torch mode through the `brightness` file.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default sysfs LED class directory
pub const SYSFS_LEDS_DIR: &str = "/sys/class/leds";

/// Flash operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlashMode {
    /// Flash never fires
    #[default]
    Off,
    /// Light stays on (torch) and every capture is lit
    On,
    /// Capture decides from scene brightness
    Auto,
}

impl FlashMode {
    /// Cycle to the next mode: Off -> On -> Auto -> Off
    pub fn next(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Auto,
            FlashMode::Auto => FlashMode::Off,
        }
    }

    /// Short label for status bars
    pub fn label(&self) -> &'static str {
        match self {
            FlashMode::Off => "off",
            FlashMode::On => "on",
            FlashMode::Auto => "auto",
        }
    }
}

/// A flash LED device discovered via sysfs
#[derive(Debug, Clone)]
pub struct FlashDevice {
    /// Sysfs path, e.g. `/sys/class/leds/white:flash`
    path: PathBuf,
    /// Maximum brightness value (from `max_brightness` file)
    max_brightness: u32,
    /// Human-readable name (directory basename)
    name: String,
}

impl FlashDevice {
    /// Get the device name (e.g. "white:flash")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set raw brightness value (0 = off, max_brightness = full)
    pub fn set_brightness(&self, value: u32) -> io::Result<()> {
        let clamped = value.min(self.max_brightness);
        std::fs::write(self.path.join("brightness"), clamped.to_string())
    }

    /// Turn off the LED
    pub fn off(&self) -> io::Result<()> {
        self.set_brightness(0)
    }

    /// Turn on at a fraction of max brightness (0.0 = off, 1.0 = full)
    pub fn torch(&self, intensity: f32) -> io::Result<()> {
        let clamped = intensity.clamp(0.0, 1.0);
        let value = (clamped * self.max_brightness as f32).round() as u32;
        self.set_brightness(value)
    }
}

/// Result of hardware flash detection
///
/// Separates "hardware exists" from "we can control it" so the UI can show
/// a permission hint instead of silently hiding flash.
#[derive(Debug, Default)]
pub struct FlashHardware {
    /// Devices we can actually control (writable)
    pub devices: Vec<FlashDevice>,
    /// User-facing error if hardware was found but not writable
    pub permission_error: Option<String>,
}

impl FlashHardware {
    /// Scan the default sysfs directory
    pub fn detect() -> FlashHardware {
        Self::detect_in(Path::new(SYSFS_LEDS_DIR))
    }

    /// Scan `leds_dir` for `*:flash` entries
    pub fn detect_in(leds_dir: &Path) -> FlashHardware {
        let Ok(entries) = std::fs::read_dir(leds_dir) else {
            warn!(dir = %leds_dir.display(), "Cannot read LED directory, flash discovery skipped");
            return FlashHardware::default();
        };

        let mut devices = Vec::new();
        let mut unwritable = Vec::new();

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name_str) = name.to_str() else {
                continue;
            };

            // Match entries like "white:flash", "yellow:flash"
            if !name_str.ends_with(":flash") {
                continue;
            }

            let led_path = entry.path();
            let max_brightness_path = led_path.join("max_brightness");

            let max_brightness = match std::fs::read_to_string(&max_brightness_path) {
                Ok(s) => match s.trim().parse::<u32>() {
                    Ok(v) if v > 0 => v,
                    _ => {
                        warn!(path = %max_brightness_path.display(), "Invalid max_brightness value");
                        continue;
                    }
                },
                Err(e) => {
                    warn!(path = %max_brightness_path.display(), error = %e, "Cannot read max_brightness");
                    continue;
                }
            };

            let brightness_path = led_path.join("brightness");
            match std::fs::OpenOptions::new().write(true).open(&brightness_path) {
                Ok(_) => {
                    info!(name = name_str, max_brightness, "Discovered flash LED");
                    devices.push(FlashDevice {
                        path: led_path,
                        max_brightness,
                        name: name_str.to_string(),
                    });
                }
                Err(_) => {
                    warn!(path = %brightness_path.display(), "Flash LED found but not writable");
                    unwritable.push(name_str.to_string());
                }
            }
        }

        // Deterministic ordering (white before yellow)
        devices.sort_by(|a, b| a.name.cmp(&b.name));

        let permission_error = if devices.is_empty() && !unwritable.is_empty() {
            Some(format!(
                "Flash LEDs detected ({}) but cannot be controlled; add your user to the LED group",
                unwritable.join(", ")
            ))
        } else {
            None
        };

        FlashHardware {
            devices,
            permission_error,
        }
    }

    /// Whether any controllable flash devices were found
    pub fn has_devices(&self) -> bool {
        !self.devices.is_empty()
    }

    /// Switch every device on or off, returning the first error
    pub fn set_all(&self, enabled: bool, intensity: f32) -> io::Result<()> {
        let mut first_error = None;
        for dev in &self.devices {
            let result = if enabled { dev.torch(intensity) } else { dev.off() };
            if let Err(e) = result {
                warn!(device = %dev.name, enabled, error = %e, "Failed to drive flash LED");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_led(dir: &Path, name: &str, max: &str) -> PathBuf {
        let led = dir.join(name);
        std::fs::create_dir_all(&led).unwrap();
        std::fs::write(led.join("max_brightness"), max).unwrap();
        std::fs::write(led.join("brightness"), "0").unwrap();
        led
    }

    #[test]
    fn test_flash_mode_cycle() {
        assert_eq!(FlashMode::Off.next(), FlashMode::On);
        assert_eq!(FlashMode::On.next(), FlashMode::Auto);
        assert_eq!(FlashMode::Auto.next(), FlashMode::Off);
    }

    #[test]
    fn test_detect_only_flash_entries() {
        let dir = tempfile::tempdir().unwrap();
        fake_led(dir.path(), "yellow:flash", "255");
        fake_led(dir.path(), "white:flash", "100\n");
        fake_led(dir.path(), "input0::capslock", "1");
        fake_led(dir.path(), "red:flash", "0");

        let hw = FlashHardware::detect_in(dir.path());
        let names: Vec<_> = hw.devices.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["white:flash", "yellow:flash"]);
        assert!(hw.permission_error.is_none());
    }

    #[test]
    fn test_torch_writes_scaled_brightness() {
        let dir = tempfile::tempdir().unwrap();
        let led = fake_led(dir.path(), "white:flash", "200");

        let hw = FlashHardware::detect_in(dir.path());
        hw.set_all(true, 0.5).unwrap();
        assert_eq!(std::fs::read_to_string(led.join("brightness")).unwrap(), "100");

        hw.set_all(false, 1.0).unwrap();
        assert_eq!(std::fs::read_to_string(led.join("brightness")).unwrap(), "0");
    }

    #[test]
    fn test_missing_dir_yields_no_devices() {
        let hw = FlashHardware::detect_in(Path::new("/nonexistent/leds"));
        assert!(!hw.has_devices());
    }
}
