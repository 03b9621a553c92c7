// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for photo files and the gallery thumbnail

use crate::config::Config;
use crate::constants::{APP_NAME, photo};
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Decoded gallery thumbnail
#[derive(Clone)]
pub struct Thumbnail {
    /// Photo the thumbnail was made from
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA pixels
    pub rgba: Arc<Vec<u8>>,
}

impl std::fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thumbnail")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Directory photos are written to (not created)
pub fn photo_directory(config: &Config) -> PathBuf {
    if let Some(dir) = &config.photo_dir {
        return dir.clone();
    }
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(APP_NAME)
}

/// Ensure the photo directory exists, creating it if necessary
pub fn ensure_photo_directory(config: &Config) -> std::io::Result<PathBuf> {
    let dir = photo_directory(config);
    std::fs::create_dir_all(&dir)?;
    debug!(path = %dir.display(), "Photo directory ready");
    Ok(dir)
}

/// Photo filename for a timestamp: `yyyy-MM-dd-HH-mm-ss-SSS.jpg`
pub fn photo_filename(now: DateTime<Local>) -> String {
    format!("{}.{}", now.format(photo::FILENAME_FORMAT), photo::EXTENSION)
}

/// Fresh output path in `dir` for a capture happening now
///
/// `reserved` holds paths of captures still being written.
pub fn next_photo_path(dir: &Path, reserved: &HashSet<PathBuf>) -> PathBuf {
    unique_photo_path(dir, Local::now(), reserved)
}

/// Output path for `now`, suffixed `-1`, `-2`, … if the name is taken
pub fn unique_photo_path(dir: &Path, now: DateTime<Local>, reserved: &HashSet<PathBuf>) -> PathBuf {
    let stem = now.format(photo::FILENAME_FORMAT).to_string();
    let taken = |p: &Path| p.exists() || reserved.contains(p);

    let candidate = dir.join(format!("{}.{}", stem, photo::EXTENSION));
    if !taken(&candidate) {
        return candidate;
    }

    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{}-{}.{}", stem, n, photo::EXTENSION));
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Most recently modified readable `.jpg` file in `dir`
///
/// The extension match is exact: `.JPG` files from other apps are skipped.
///
/// Ties on modification time are broken by file name so the result is stable.
pub fn latest_photo(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;

    entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            let is_jpg = path
                .extension()
                .map(|ext| ext == photo::EXTENSION)
                .unwrap_or(false);
            if !is_jpg {
                return None;
            }
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            // Readability check
            std::fs::File::open(&path).ok()?;
            let modified = metadata.modified().ok()?;
            Some((modified, path))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, path)| path)
}

/// Decode `path` and downscale so the longest edge is at most `max_edge`
pub async fn load_thumbnail(path: PathBuf, max_edge: u32) -> Option<Thumbnail> {
    tokio::task::spawn_blocking(move || {
        let img = match image::open(&path) {
            Ok(img) => img,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to decode thumbnail");
                return None;
            }
        };
        let thumb = img.thumbnail(max_edge, max_edge).to_rgba8();
        let (width, height) = thumb.dimensions();

        debug!(path = %path.display(), width, height, "Thumbnail decoded");
        Some(Thumbnail {
            path,
            width,
            height,
            rgba: Arc::new(thumb.into_raw()),
        })
    })
    .await
    .ok()?
}

/// Load the thumbnail of the latest photo in `photos_dir`
pub async fn load_latest_thumbnail(photos_dir: PathBuf) -> Option<Thumbnail> {
    let latest = tokio::task::spawn_blocking(move || latest_photo(&photos_dir))
        .await
        .ok()??;
    debug!(path = %latest.display(), "Loading latest thumbnail");
    load_thumbnail(latest, photo::THUMBNAIL_MAX_EDGE).await
}
