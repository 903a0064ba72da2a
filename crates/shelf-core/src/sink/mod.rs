//! Forwarding selected products to a chat as photo posts.
//!
//! Posting is strictly sequential with a fixed pause between requests, and a
//! failed post never stops the rest of the batch.

use std::{future::Future, time::Duration};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;

mod record;
mod telegram;

pub use record::{ColumnMapping, ProductRecord, escape_html};
pub use telegram::TelegramSender;

/// One outgoing photo message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoPost {
    pub photo: String,
    pub caption: String,
}

/// Something that can post a photo with a caption and return the id of the
/// created message.
pub trait PhotoSender {
    fn send_photo(&self, post: &PhotoPost) -> impl Future<Output = Result<i64>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentItem {
    pub name: String,
    pub message_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub name: String,
    pub reason: String,
}

/// Per-item outcome of a [`broadcast`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub sent: Vec<SentItem>,
    /// Records without an image, never sent.
    pub skipped: Vec<String>,
    pub failed: Vec<FailedItem>,
}

impl DeliveryReport {
    /// Batch-level outcome: true when no request failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.sent.len() + self.failed.len()
    }
}

/// Post `records` one by one through `sender`, waiting `delay` between two
/// requests.
pub async fn broadcast<S: PhotoSender>(
    sender: &S,
    records: &[ProductRecord],
    delay: Duration,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for record in records {
        let Some(photo) = record.photo() else {
            warn!(name = %record.name, "skipping product without image_url");
            report.skipped.push(record.name.clone());
            continue;
        };

        if report.attempted() > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let post = PhotoPost {
            photo: photo.to_string(),
            caption: record.caption(),
        };
        debug!(name = %record.name, photo = %post.photo, "sending photo");

        match sender.send_photo(&post).await {
            Ok(message_id) => {
                info!(name = %record.name, message_id, "sent");
                report.sent.push(SentItem {
                    name: record.name.clone(),
                    message_id,
                });
            }
            Err(e) => {
                warn!(name = %record.name, error = %e, "send failed, continuing");
                report.failed.push(FailedItem {
                    name: record.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        sent = report.sent.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "broadcast finished"
    );
    report
}
