//! The vote ledger: at most one vote per session and video, with
//! aggregate counts computed by storage.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::environment::Environment;
use crate::errors::BackendError;
use crate::session::SessionId;
use crate::video::{Tally, VideoId};

/// A single session’s opinion of a video.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Vote {
    Like,
    Dislike,
}

impl Vote {
    /// The value stored in the `votes.vote` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Vote::Like => "like",
            Vote::Dislike => "dislike",
        }
    }
}

impl FromStr for Vote {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Vote::Like),
            "dislike" => Ok(Vote::Dislike),
            _ => Err(BackendError::InvalidVote(s.to_owned())),
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records `vote` as the session’s opinion of the video, replacing any
/// earlier vote, and returns the video’s updated tally.
///
/// The session’s own flags always reflect `vote` itself; only the
/// counts come from storage, since other sessions may vote at the same
/// time.
pub async fn cast(
    environment: &Environment,
    session: &SessionId,
    id: &VideoId,
    vote: Vote,
) -> Result<Tally, BackendError> {
    let (likes, dislikes) = environment.db.cast_vote(session, id, vote).await?;

    Ok(Tally {
        likes,
        dislikes,
        session_like: vote == Vote::Like,
        session_dislike: vote == Vote::Dislike,
    })
}

/// Returns the tally of every video in `ids` as seen by `session`.
/// Videos nobody voted on get an empty tally.
pub async fn tallies_for(
    environment: &Environment,
    session: &SessionId,
    ids: &[VideoId],
) -> Result<HashMap<VideoId, Tally>, BackendError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut tallies = environment.db.retrieve_tallies(session, ids).await?;

    for id in ids {
        tallies.entry(id.clone()).or_default();
    }

    Ok(tallies)
}
