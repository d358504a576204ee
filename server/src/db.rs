use std::collections::HashMap;

use futures::future::BoxFuture;
use time::OffsetDateTime;

use crate::errors::BackendError;
use crate::session::SessionId;
use crate::video::{Metadata, Tally, Video, VideoId};
use crate::vote::Vote;

mod memory;

/// The storage handle shared by every component. Each method is a
/// single complete unit that’s safe to retry.
pub trait Db {
    /// Returns every video in registration order.
    fn retrieve_videos(&self) -> BoxFuture<Result<Vec<Video>, BackendError>>;

    /// Creates a bare video row unless one already exists.
    fn register_video(&self, id: &VideoId) -> BoxFuture<Result<(), BackendError>>;

    /// Overwrites the cached metadata of a video along with its fetch
    /// time.
    fn update_metadata(
        &self,
        id: &VideoId,
        metadata: &Metadata,
        fetched_at: OffsetDateTime,
    ) -> BoxFuture<Result<(), BackendError>>;

    /// Inserts or overwrites the session’s vote for a video, then
    /// returns the video’s `(likes, dislikes)`.
    fn cast_vote(
        &self,
        session: &SessionId,
        id: &VideoId,
        vote: Vote,
    ) -> BoxFuture<Result<(i64, i64), BackendError>>;

    /// Returns the tallies of the given videos as seen by `session`.
    /// Videos without votes are absent from the result.
    fn retrieve_tallies(
        &self,
        session: &SessionId,
        ids: &[VideoId],
    ) -> BoxFuture<Result<HashMap<VideoId, Tally>, BackendError>>;

    /// Appends an entry to the recommendation log.
    fn create_recommendation(
        &self,
        session: &SessionId,
        id: &VideoId,
    ) -> BoxFuture<Result<(), BackendError>>;

    /// Returns the distinct videos ever recommended by `session`.
    fn retrieve_recommended(
        &self,
        session: &SessionId,
    ) -> BoxFuture<Result<Vec<VideoId>, BackendError>>;
}

pub use self::memory::MemoryDb;
pub use self::postgres::*;

mod postgres {
    use std::collections::HashMap;

    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::{
        self,
        postgres::{PgPool, PgRow},
    };
    use time::OffsetDateTime;
    use uuid::Uuid;

    use crate::errors::BackendError;
    use crate::session::SessionId;
    use crate::video::{Metadata, Tally, Video, VideoId};
    use crate::vote::Vote;

    pub struct PgDb {
        pool: PgPool,
    }

    impl PgDb {
        pub fn new(pool: PgPool) -> Self {
            PgDb { pool }
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Db for PgDb {
        fn retrieve_videos(&self) -> BoxFuture<Result<Vec<Video>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/retrieve_videos.sql"));

                let videos = query
                    .try_map(|row: PgRow| {
                        let id = try_get_video_id(&row, "id")?;
                        let title: Option<String> = try_get(&row, "title")?;
                        let thumbnail_url: Option<String> = try_get(&row, "thumbnail_url")?;
                        let fetched_at: Option<OffsetDateTime> = try_get(&row, "fetched_at")?;

                        Ok(Video {
                            id,
                            metadata: Metadata {
                                title,
                                thumbnail_url,
                            },
                            fetched_at,
                        })
                    })
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(videos)
            }
            .boxed()
        }

        fn register_video(&self, id: &VideoId) -> BoxFuture<Result<(), BackendError>> {
            let id = id.clone();

            async move {
                let query = sqlx::query(include_str!("queries/register_video.sql"));

                query
                    .bind(id.as_str())
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn update_metadata(
            &self,
            id: &VideoId,
            metadata: &Metadata,
            fetched_at: OffsetDateTime,
        ) -> BoxFuture<Result<(), BackendError>> {
            let id = id.clone();
            let metadata = metadata.clone();

            async move {
                let query = sqlx::query(include_str!("queries/update_metadata.sql"));

                query
                    .bind(id.as_str())
                    .bind(metadata.title)
                    .bind(metadata.thumbnail_url)
                    .bind(fetched_at)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn cast_vote(
            &self,
            session: &SessionId,
            id: &VideoId,
            vote: Vote,
        ) -> BoxFuture<Result<(i64, i64), BackendError>> {
            let session = *session.as_uuid();
            let id = id.clone();

            async move {
                let upsert = sqlx::query(include_str!("queries/upsert_vote.sql"));

                upsert
                    .bind(session)
                    .bind(id.as_str())
                    .bind(vote.as_str())
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                let count = sqlx::query_as::<_, (i64, i64)>(include_str!("queries/count_votes.sql"));

                let counts = count
                    .bind(id.as_str())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(counts)
            }
            .boxed()
        }

        fn retrieve_tallies(
            &self,
            session: &SessionId,
            ids: &[VideoId],
        ) -> BoxFuture<Result<HashMap<VideoId, Tally>, BackendError>> {
            let session: Uuid = *session.as_uuid();
            let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_owned()).collect();

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_tallies.sql"));

                let tallies = query
                    .bind(session)
                    .bind(ids)
                    .try_map(|row: PgRow| {
                        let id = try_get_video_id(&row, "video_id")?;
                        let tally = Tally {
                            likes: try_get(&row, "likes")?,
                            dislikes: try_get(&row, "dislikes")?,
                            session_like: try_get(&row, "session_like")?,
                            session_dislike: try_get(&row, "session_dislike")?,
                        };

                        Ok((id, tally))
                    })
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(tallies.into_iter().collect())
            }
            .boxed()
        }

        fn create_recommendation(
            &self,
            session: &SessionId,
            id: &VideoId,
        ) -> BoxFuture<Result<(), BackendError>> {
            let session = *session.as_uuid();
            let id = id.clone();

            async move {
                let query = sqlx::query(include_str!("queries/create_recommendation.sql"));

                query
                    .bind(session)
                    .bind(id.as_str())
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn retrieve_recommended(
            &self,
            session: &SessionId,
        ) -> BoxFuture<Result<Vec<VideoId>, BackendError>> {
            let session = *session.as_uuid();

            async move {
                let query = sqlx::query(include_str!("queries/retrieve_recommended.sql"));

                let ids = query
                    .bind(session)
                    .try_map(|row: PgRow| try_get_video_id(&row, "video_id"))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(ids)
            }
            .boxed()
        }
    }

    fn try_get<'a, T: sqlx::Type<sqlx::Postgres> + sqlx::decode::Decode<'a, sqlx::Postgres>>(
        row: &'a PgRow,
        column: &str,
    ) -> Result<T, sqlx::Error> {
        use sqlx::Row;

        row.try_get(column)
    }

    fn try_get_video_id(row: &PgRow, column: &str) -> Result<VideoId, sqlx::Error> {
        let raw: String = try_get(row, column)?;

        // rows may have been written by something other than this service
        VideoId::parse(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
    }

    fn map_sqlx_error(error: sqlx::Error) -> BackendError {
        BackendError::Sqlx { source: error }
    }
}
