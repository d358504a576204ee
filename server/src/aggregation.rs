//! Operations composed from the metadata cache, the vote ledger and
//! the recommendation log.

use futures::stream::{self, StreamExt};
use log::{debug, o};
use time::OffsetDateTime;

use crate::environment::Environment;
use crate::errors::BackendError;
use crate::metadata;
use crate::recommendation;
use crate::session::SessionId;
use crate::video::{Video, VideoId, VideoView};
use crate::vote;

/// Lists every video in registration order with its metadata and the
/// tally seen by `session`, refreshing stale metadata on the way.
pub async fn list_videos(
    environment: &Environment,
    session: &SessionId,
) -> Result<Vec<VideoView>, BackendError> {
    let videos = environment.db.retrieve_videos().await?;
    debug!(environment.logger, "Listing videos..."; "count" => videos.len());

    let now = OffsetDateTime::now_utc();
    let videos: Vec<Video> = stream::iter(videos)
        .map(|video| metadata::ensure_fresh(environment, video, now))
        .buffered(environment.config.refresh_concurrency)
        .collect()
        .await;

    let ids: Vec<VideoId> = videos.iter().map(|v| v.id.clone()).collect();
    let mut tallies = vote::tallies_for(environment, session, &ids).await?;

    let views = videos
        .into_iter()
        .map(|video| {
            let tally = tallies.remove(&video.id).unwrap_or_default();
            VideoView::new(video.id, video.metadata, tally)
        })
        .collect();

    Ok(views)
}

/// Validates and registers a submitted video, then logs the
/// submission against the session. Both steps are safe to retry.
pub async fn submit_video(
    environment: &Environment,
    session: &SessionId,
    raw_id: impl Into<String>,
) -> Result<VideoId, BackendError> {
    let id = VideoId::parse(raw_id)?;

    let logger = environment
        .logger
        .new(o!("video_id" => id.to_string(), "session_id" => session.to_string()));

    debug!(logger, "Registering video...");
    metadata::register(environment, &id).await?;

    debug!(logger, "Recording recommendation...");
    recommendation::record(environment, session, &id).await?;

    Ok(id)
}

/// The session’s score: the current like count of every distinct video
/// it has recommended. Dislikes aren’t subtracted.
pub async fn session_score(
    environment: &Environment,
    session: &SessionId,
) -> Result<i64, BackendError> {
    let ids = recommendation::recommended_by(environment, session).await?;
    let tallies = vote::tallies_for(environment, session, &ids).await?;

    Ok(tallies.values().map(|t| t.likes).sum())
}
