//! The metadata cache. Video rows hold the catalog’s title and
//! thumbnail along with when they were fetched; stale rows are
//! refreshed lazily whenever videos are listed.
//!
//! Refreshing is best-effort. A failed lookup or write is logged and
//! the last known metadata (possibly none) is served instead, so the
//! listing never fails because of the catalog. Concurrent refreshes of
//! the same video may both hit the catalog; the last write wins.

use std::convert::TryFrom;
use std::time::Duration;

use log::{debug, o, warn};
use time::OffsetDateTime;

use crate::environment::Environment;
use crate::errors::BackendError;
use crate::video::{Metadata, Video, VideoId};

/// Whether a video’s metadata must be fetched again: it has never been
/// fetched, has no title, or is older than `max_age`.
pub fn is_stale(video: &Video, now: OffsetDateTime, max_age: Duration) -> bool {
    // ages past the representable range never expire
    let max_age = time::Duration::seconds(i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX));

    match (&video.metadata.title, video.fetched_at) {
        (Some(_), Some(fetched_at)) => now - fetched_at > max_age,
        _ => true,
    }
}

/// Makes sure `video` carries fresh metadata, refreshing it from the
/// catalog if it’s stale. Never fails; see the module documentation.
pub async fn ensure_fresh(environment: &Environment, video: Video, now: OffsetDateTime) -> Video {
    if !is_stale(&video, now, environment.config.max_metadata_age) {
        return video;
    }

    let logger = environment
        .logger
        .new(o!("video_id" => video.id.to_string()));

    debug!(logger, "Refreshing metadata...");

    match refresh(environment, &video.id, now).await {
        Ok((metadata, stored)) => {
            if let Err(e) = stored {
                warn!(logger, "Failed to store refreshed metadata"; "error" => %e);
            }

            Video {
                metadata,
                fetched_at: Some(now),
                ..video
            }
        }
        Err(e) => {
            warn!(logger, "Failed to refresh metadata"; "error" => %e);
            video
        }
    }
}

/// Looks the video up and writes the result back. The outer error is
/// the lookup’s; the inner one is the write’s, which doesn’t invalidate
/// the metadata just fetched.
async fn refresh(
    environment: &Environment,
    id: &VideoId,
    now: OffsetDateTime,
) -> Result<(Metadata, Result<(), BackendError>), BackendError> {
    let entry = environment.catalog.lookup(id).await?;

    let metadata = Metadata {
        thumbnail_url: entry.thumbnail_url().map(str::to_owned),
        title: Some(entry.title),
    };

    let stored = environment.db.update_metadata(id, &metadata, now).await;

    Ok((metadata, stored))
}

/// Creates a bare video row if none exists yet. Metadata is fetched on
/// the next listing, not here.
pub async fn register(environment: &Environment, id: &VideoId) -> Result<(), BackendError> {
    environment.db.register_video(id).await
}
