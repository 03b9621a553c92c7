// SPDX-License-Identifier: MPL-2.0

//! Photo capture pipeline
//!
//! ```text
//! Camera Session → Frame → Encoding → Disk I/O
//!       ↓
//! Preview continues uninterrupted
//! ```
//!
//! Sessions call [`PhotoPipeline::save_frame`] from the worker thread the
//! controller hands each capture to. Burst pacing lives in [`burst`].

pub mod burst;
pub mod encoding;

pub use burst::BurstTimer;
pub use encoding::{EncodedImage, PhotoEncoder};

use crate::backends::camera::types::CameraFrame;
use crate::errors::PhotoError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Encode-and-write pipeline for still photos
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
}

impl PhotoPipeline {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            encoder: PhotoEncoder::new(jpeg_quality),
        }
    }

    /// Encode `frame` and write it to `output`
    ///
    /// The file is written under a temporary name and renamed into place, so
    /// a thumbnail scan never sees a half-written photo.
    pub fn save_frame(&self, frame: &CameraFrame, output: &Path) -> Result<PathBuf, PhotoError> {
        let encoded = self.encoder.encode(frame)?;
        write_atomically(output, &encoded.data)?;

        info!(
            path = %output.display(),
            width = encoded.width,
            height = encoded.height,
            "Photo saved"
        );
        Ok(output.to_path_buf())
    }
}

fn write_atomically(output: &Path, data: &[u8]) -> Result<(), PhotoError> {
    let parent = output
        .parent()
        .ok_or_else(|| PhotoError::SaveFailed(format!("no parent for {}", output.display())))?;
    std::fs::create_dir_all(parent)?;

    let file_name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp_path = parent.join(format!(".{}.part", file_name));

    debug!(tmp = %tmp_path.display(), "Writing photo");
    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, output).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        PhotoError::SaveFailed(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_frame_writes_decodable_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("photo.jpg");
        let frame = CameraFrame::from_rgba(16, 12, vec![200; 16 * 12 * 4]);

        let saved = PhotoPipeline::default().save_frame(&frame, &output).unwrap();
        assert_eq!(saved, output);

        let img = image::open(&output).unwrap();
        assert_eq!((img.width(), img.height()), (16, 12));

        // No leftover temp file
        let leftovers: Vec<_> = std::fs::read_dir(output.parent().unwrap())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_empty_frame_fails() {
        let dir = tempfile::tempdir().unwrap();
        let frame = CameraFrame::from_rgba(0, 0, Vec::new());
        let result = PhotoPipeline::default().save_frame(&frame, &dir.path().join("x.jpg"));
        assert!(matches!(result, Err(PhotoError::NoFrameAvailable)));
    }
}
