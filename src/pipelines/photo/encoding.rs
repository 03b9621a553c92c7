// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding
//!
//! Converts camera frames to RGB and encodes them as JPEG. Encoding is
//! synchronous; callers run it on a worker thread.

use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::constants::photo::DEFAULT_JPEG_QUALITY;
use crate::errors::PhotoError;
use image::RgbImage;
use tracing::debug;

/// Encoded image data ready for saving
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// JPEG photo encoder
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    quality: u8,
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl PhotoEncoder {
    /// Create an encoder; quality is clamped into 1-100
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode a frame as JPEG
    pub fn encode(&self, frame: &CameraFrame) -> Result<EncodedImage, PhotoError> {
        let image = frame_to_rgb(frame)?;
        let (width, height) = image.dimensions();

        let mut buffer = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, self.quality);
        encoder.encode(
            image.as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgb8,
        )?;

        debug!(width, height, size = buffer.len(), quality = self.quality, "JPEG encoded");

        Ok(EncodedImage {
            data: buffer,
            width,
            height,
        })
    }
}

/// Repack a frame (any stride) into a tight RGB image
pub fn frame_to_rgb(frame: &CameraFrame) -> Result<RgbImage, PhotoError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PhotoError::NoFrameAvailable);
    }

    let bpp = frame.format.bytes_per_pixel() as usize;
    let stride = frame.stride as usize;
    let row_bytes = frame.width as usize * bpp;
    let needed = stride * (frame.height as usize - 1) + row_bytes;
    if frame.data.len() < needed {
        return Err(PhotoError::EncodingFailed(format!(
            "frame buffer too small: {} < {}",
            frame.data.len(),
            needed
        )));
    }

    let mut rgb = Vec::with_capacity(frame.width as usize * frame.height as usize * 3);
    for y in 0..frame.height as usize {
        let row = &frame.data[y * stride..y * stride + row_bytes];
        match frame.format {
            PixelFormat::RGB24 => rgb.extend_from_slice(row),
            PixelFormat::RGBA => {
                for px in row.chunks_exact(4) {
                    rgb.extend_from_slice(&px[..3]);
                }
            }
        }
    }

    RgbImage::from_raw(frame.width, frame.height, rgb)
        .ok_or_else(|| PhotoError::EncodingFailed("Failed to create image".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(PhotoEncoder::new(0).quality(), 1);
        assert_eq!(PhotoEncoder::new(255).quality(), 100);
    }

    #[test]
    fn test_frame_to_rgb_honours_stride() {
        // 2x2 RGBA with 4 bytes of row padding
        let mut data = Vec::new();
        data.extend_from_slice(&[1, 2, 3, 255, 4, 5, 6, 255, 0, 0, 0, 0]);
        data.extend_from_slice(&[7, 8, 9, 255, 10, 11, 12, 255, 0, 0, 0, 0]);
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::RGBA,
            stride: 12,
            captured_at: std::time::Instant::now(),
        };

        let rgb = frame_to_rgb(&frame).unwrap();
        assert_eq!(rgb.as_raw(), &vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_frame_to_rgb_passes_rgb24_through() {
        let frame = CameraFrame {
            width: 2,
            height: 1,
            data: Arc::from(vec![1u8, 2, 3, 4, 5, 6].into_boxed_slice()),
            format: PixelFormat::RGB24,
            stride: 6,
            captured_at: std::time::Instant::now(),
        };

        let rgb = frame_to_rgb(&frame).unwrap();
        assert_eq!(rgb.as_raw(), &vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let frame = CameraFrame::from_rgba(4, 4, vec![0; 8]);
        assert!(matches!(
            frame_to_rgb(&frame),
            Err(PhotoError::EncodingFailed(_))
        ));
    }

    #[test]
    fn test_encode_produces_jpeg() {
        let frame = CameraFrame::from_rgba(8, 6, vec![128; 8 * 6 * 4]);
        let encoded = PhotoEncoder::default().encode(&frame).unwrap();
        assert_eq!((encoded.width, encoded.height), (8, 6));
        // JPEG SOI marker
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);
    }
}
