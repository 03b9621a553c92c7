// SPDX-License-Identifier: GPL-3.0-only

//! Gallery thumbnail and notice handlers

use crate::app::state::{CaptureController, Message, Notice};
use crate::storage::{self, Thumbnail};
use tracing::{debug, info};

impl CaptureController {
    /// Decode the newest photo off the sequencing context
    pub(crate) fn refresh_gallery_thumbnail(&mut self) {
        self.thumbnail_seq += 1;
        self.pending_tasks += 1;
        self.stats.thumbnail_refreshes += 1;
        let seq = self.thumbnail_seq;
        let dir = self.photo_dir.clone();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let thumbnail = storage::load_latest_thumbnail(dir).await;
            let _ = tx.send(Message::ThumbnailLoaded { seq, thumbnail });
        });
    }

    pub(crate) fn handle_thumbnail_loaded(&mut self, seq: u64, thumbnail: Option<Thumbnail>) {
        self.pending_tasks = self.pending_tasks.saturating_sub(1);
        if seq != self.thumbnail_seq {
            debug!(seq, latest = self.thumbnail_seq, "Dropping outdated thumbnail");
            return;
        }
        match &thumbnail {
            Some(thumb) => debug!(path = %thumb.path.display(), "Gallery thumbnail updated"),
            None => debug!("No photos for gallery thumbnail"),
        }
        self.thumbnail = thumbnail;
    }

    pub(crate) fn show_notice(&mut self, text: impl Into<String>) {
        let notice = Notice::new(text);
        info!(notice = %notice.text, "Notice");
        self.notice = Some(notice);
    }
}
