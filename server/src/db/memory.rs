use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use futures::future::{self, BoxFuture, FutureExt};
use time::OffsetDateTime;

use crate::db::Db;
use crate::errors::BackendError;
use crate::session::SessionId;
use crate::video::{Metadata, Tally, Video, VideoId};
use crate::vote::Vote;

/// A `Db` that keeps everything in memory. It serves as the test
/// double for the PostgreSQL implementation, so it follows the same
/// conflict rules: registration is insert-or-ignore and votes are
/// keyed by `(session, video)`.
#[derive(Default)]
pub struct MemoryDb {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    videos: Vec<Video>,
    votes: HashMap<(SessionId, VideoId), Vote>,
    recommendations: Vec<Recommendation>,
}

struct Recommendation {
    session: SessionId,
    id: VideoId,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a video row as is.
    pub fn put_video(&self, video: Video) {
        let mut state = self.state.write().unwrap();

        match state.videos.iter_mut().find(|v| v.id == video.id) {
            Some(existing) => *existing = video,
            None => state.videos.push(video),
        }
    }

    pub fn video(&self, id: &VideoId) -> Option<Video> {
        let state = self.state.read().unwrap();

        state.videos.iter().find(|v| &v.id == id).cloned()
    }

    pub fn video_count(&self) -> usize {
        self.state.read().unwrap().videos.len()
    }

    pub fn vote_count(&self) -> usize {
        self.state.read().unwrap().votes.len()
    }

    pub fn vote(&self, session: &SessionId, id: &VideoId) -> Option<Vote> {
        let state = self.state.read().unwrap();

        state.votes.get(&(*session, id.clone())).copied()
    }

    pub fn recommendation_count(&self) -> usize {
        self.state.read().unwrap().recommendations.len()
    }
}

impl State {
    fn counts(&self, id: &VideoId) -> (i64, i64) {
        self.votes
            .iter()
            .filter(|((_, video), _)| video == id)
            .fold((0, 0), |(likes, dislikes), (_, vote)| match vote {
                Vote::Like => (likes + 1, dislikes),
                Vote::Dislike => (likes, dislikes + 1),
            })
    }
}

impl Db for MemoryDb {
    fn retrieve_videos(&self) -> BoxFuture<Result<Vec<Video>, BackendError>> {
        let videos = self.state.read().unwrap().videos.clone();

        future::ok(videos).boxed()
    }

    fn register_video(&self, id: &VideoId) -> BoxFuture<Result<(), BackendError>> {
        let mut state = self.state.write().unwrap();

        if !state.videos.iter().any(|v| &v.id == id) {
            state.videos.push(Video::bare(id.clone()));
        }

        future::ok(()).boxed()
    }

    fn update_metadata(
        &self,
        id: &VideoId,
        metadata: &Metadata,
        fetched_at: OffsetDateTime,
    ) -> BoxFuture<Result<(), BackendError>> {
        let mut state = self.state.write().unwrap();

        if let Some(video) = state.videos.iter_mut().find(|v| &v.id == id) {
            video.metadata = metadata.clone();
            video.fetched_at = Some(fetched_at);
        }

        future::ok(()).boxed()
    }

    fn cast_vote(
        &self,
        session: &SessionId,
        id: &VideoId,
        vote: Vote,
    ) -> BoxFuture<Result<(i64, i64), BackendError>> {
        let mut state = self.state.write().unwrap();

        state.votes.insert((*session, id.clone()), vote);

        future::ok(state.counts(id)).boxed()
    }

    fn retrieve_tallies(
        &self,
        session: &SessionId,
        ids: &[VideoId],
    ) -> BoxFuture<Result<HashMap<VideoId, Tally>, BackendError>> {
        let state = self.state.read().unwrap();
        let mut tallies: HashMap<VideoId, Tally> = HashMap::new();

        for ((voter, id), vote) in state.votes.iter() {
            if !ids.contains(id) {
                continue;
            }

            let tally = tallies.entry(id.clone()).or_default();
            let own = voter == session;

            match vote {
                Vote::Like => {
                    tally.likes += 1;
                    tally.session_like |= own;
                }
                Vote::Dislike => {
                    tally.dislikes += 1;
                    tally.session_dislike |= own;
                }
            }
        }

        future::ok(tallies).boxed()
    }

    fn create_recommendation(
        &self,
        session: &SessionId,
        id: &VideoId,
    ) -> BoxFuture<Result<(), BackendError>> {
        let mut state = self.state.write().unwrap();

        state.recommendations.push(Recommendation {
            session: *session,
            id: id.clone(),
        });

        future::ok(()).boxed()
    }

    fn retrieve_recommended(
        &self,
        session: &SessionId,
    ) -> BoxFuture<Result<Vec<VideoId>, BackendError>> {
        let state = self.state.read().unwrap();

        let ids: BTreeSet<VideoId> = state
            .recommendations
            .iter()
            .filter(|r| &r.session == session)
            .map(|r| r.id.clone())
            .collect();

        future::ok(ids.into_iter().collect()).boxed()
    }
}
