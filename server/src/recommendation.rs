//! The recommendation log: which session submitted which video. It’s
//! append-only and keeps duplicates.

use crate::environment::Environment;
use crate::errors::BackendError;
use crate::session::SessionId;
use crate::video::VideoId;

/// Appends a timestamped entry for the submission.
pub async fn record(
    environment: &Environment,
    session: &SessionId,
    id: &VideoId,
) -> Result<(), BackendError> {
    environment.db.create_recommendation(session, id).await
}

/// Returns the distinct videos ever recommended by the session.
pub async fn recommended_by(
    environment: &Environment,
    session: &SessionId,
) -> Result<Vec<VideoId>, BackendError> {
    environment.db.retrieve_recommended(session).await
}
