// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera discovery
//!
//! Scans `/dev/video*`, keeps capture-capable nodes and assigns each a
//! facing, either from the configured device paths or from its name.

use super::super::types::{CameraDevice, CameraFacing};
use std::path::Path;
use tracing::{debug, info};
use v4l::Device;
use v4l::capability::Flags;

/// Configured device paths that pin a facing
#[derive(Debug, Clone, Default)]
pub struct FacingOverrides {
    pub front: Option<String>,
    pub back: Option<String>,
}

impl FacingOverrides {
    /// Facing for a device, preferring the configured paths
    pub fn facing_for(&self, path: &str, name: &str) -> CameraFacing {
        if self.front.as_deref() == Some(path) {
            CameraFacing::Front
        } else if self.back.as_deref() == Some(path) {
            CameraFacing::Back
        } else {
            CameraFacing::from_device_name(name)
        }
    }
}

/// Enumerate capture devices under `/dev`
pub fn enumerate_v4l2_cameras(overrides: &FacingOverrides) -> Vec<CameraDevice> {
    enumerate_in(Path::new("/dev"), overrides)
}

fn enumerate_in(dev_dir: &Path, overrides: &FacingOverrides) -> Vec<CameraDevice> {
    let mut nodes: Vec<(u32, String)> = std::fs::read_dir(dev_dir)
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let index = video_index(&name)?;
            Some((index, entry.path().to_string_lossy().to_string()))
        })
        .collect();
    nodes.sort();

    let mut cameras: Vec<CameraDevice> = Vec::new();
    let mut seen_buses: Vec<(String, String)> = Vec::new();

    for (_, path) in nodes {
        let Ok(dev) = Device::with_path(&path) else {
            debug!(path, "Cannot open video node");
            continue;
        };
        let Ok(caps) = dev.query_caps() else {
            debug!(path, "Cannot query video node capabilities");
            continue;
        };
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            continue;
        }

        // UVC exposes a metadata node next to each capture node
        let bus_key = (caps.bus.clone(), caps.card.clone());
        if seen_buses.contains(&bus_key) {
            debug!(path, card = %caps.card, "Skipping secondary node");
            continue;
        }
        seen_buses.push(bus_key);

        let facing = overrides.facing_for(&path, &caps.card);
        info!(path, name = %caps.card, %facing, "Found V4L2 camera");
        cameras.push(CameraDevice {
            name: caps.card,
            path,
            facing,
            driver: Some(caps.driver),
        });
    }

    cameras
}

/// Index of a `videoN` node name
fn video_index(file_name: &str) -> Option<u32> {
    file_name.strip_prefix("video")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_index() {
        assert_eq!(video_index("video0"), Some(0));
        assert_eq!(video_index("video12"), Some(12));
        assert_eq!(video_index("video"), None);
        assert_eq!(video_index("media0"), None);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let overrides = FacingOverrides {
            front: Some("/dev/video2".to_string()),
            back: None,
        };
        assert_eq!(
            overrides.facing_for("/dev/video2", "USB Camera"),
            CameraFacing::Front
        );
        assert_eq!(
            overrides.facing_for("/dev/video0", "Front Sensor"),
            CameraFacing::Front
        );
        assert_eq!(
            overrides.facing_for("/dev/video0", "USB Camera"),
            CameraFacing::Back
        );
    }

    #[test]
    fn test_enumerate_ignores_non_video_nodes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("null"), b"").unwrap();
        std::fs::write(dir.path().join("media0"), b"").unwrap();
        // Regular files are not V4L2 devices
        std::fs::write(dir.path().join("video0"), b"").unwrap();

        assert!(enumerate_in(dir.path(), &FacingOverrides::default()).is_empty());
    }
}
