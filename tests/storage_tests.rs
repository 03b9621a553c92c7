// SPDX-License-Identifier: MPL-2.0

//! Gallery lookup and thumbnail tests

use shutter::storage::{latest_photo, load_latest_thumbnail, next_photo_path};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::time::{Duration, SystemTime};

fn write_jpeg(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 100, 50]))
        .save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap();
}

fn set_age(path: &Path, seconds_ago: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(seconds_ago))
        .unwrap();
}

#[test]
fn test_latest_photo_picks_newest_by_mtime() {
    let dir = tempfile::tempdir().unwrap();
    let old = dir.path().join("zzz-old.jpg");
    let new = dir.path().join("aaa-new.jpg");
    write_jpeg(&old, 4, 4);
    write_jpeg(&new, 4, 4);
    set_age(&old, 3600);
    set_age(&new, 10);

    // Name order says otherwise; modification time wins
    assert_eq!(latest_photo(dir.path()), Some(new));
}

#[test]
fn test_latest_photo_ignores_other_files() {
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("shot.jpg");
    write_jpeg(&photo, 4, 4);
    set_age(&photo, 3600);

    std::fs::write(dir.path().join("notes.txt"), b"newer").unwrap();
    std::fs::write(dir.path().join("raw.png"), b"newer").unwrap();
    std::fs::create_dir(dir.path().join("folder.jpg")).unwrap();

    assert_eq!(latest_photo(dir.path()), Some(photo));
}

#[test]
fn test_latest_photo_requires_lowercase_extension() {
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("shot.jpg");
    write_jpeg(&photo, 4, 4);
    set_age(&photo, 3600);

    // Newer, but not ours
    write_jpeg(&dir.path().join("IMG_0001.JPG"), 4, 4);

    assert_eq!(latest_photo(dir.path()), Some(photo));
}

#[test]
fn test_latest_photo_uppercase_only_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    write_jpeg(&dir.path().join("IMG_0001.JPG"), 4, 4);

    assert!(latest_photo(dir.path()).is_none());
}

#[test]
fn test_latest_photo_empty_dir() {
    let dir = tempfile::tempdir().unwrap();
    assert!(latest_photo(dir.path()).is_none());
}

#[test]
fn test_next_photo_path_naming() {
    let dir = tempfile::tempdir().unwrap();
    let path = next_photo_path(dir.path(), &HashSet::new());

    assert_eq!(path.parent(), Some(dir.path()));
    let name = path.file_name().unwrap().to_str().unwrap();
    // yyyy-MM-dd-HH-mm-ss-SSS.jpg
    assert_eq!(name.len(), 27, "{}", name);
    assert!(name.ends_with(".jpg"));
    let fields: Vec<&str> = name.trim_end_matches(".jpg").split('-').collect();
    let widths: Vec<usize> = fields.iter().map(|f| f.len()).collect();
    assert_eq!(widths, vec![4, 2, 2, 2, 2, 2, 3]);
    assert!(fields.iter().all(|f| f.chars().all(|c| c.is_ascii_digit())));
}

#[tokio::test]
async fn test_load_latest_thumbnail_downscales() {
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("big.jpg");
    write_jpeg(&photo, 640, 480);

    let thumb = load_latest_thumbnail(dir.path().to_path_buf())
        .await
        .expect("thumbnail");

    assert_eq!(thumb.path, photo);
    assert_eq!((thumb.width, thumb.height), (160, 120));
    assert_eq!(thumb.rgba.len(), 160 * 120 * 4);
}

#[tokio::test]
async fn test_load_latest_thumbnail_skips_undecodable() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

    assert!(load_latest_thumbnail(dir.path().to_path_buf()).await.is_none());
}
