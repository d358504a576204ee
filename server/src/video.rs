use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

use crate::errors::BackendError;

/// The length of every video identifier.
pub const VIDEO_ID_LENGTH: usize = 11;

/// A validated video identifier: exactly 11 characters from
/// `[A-Za-z0-9_-]`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, BackendError> {
        let raw = raw.into();

        if is_valid_video_id(&raw) {
            Ok(VideoId(raw))
        } else {
            Err(BackendError::InvalidVideoId(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_valid_video_id(raw: &str) -> bool {
    raw.len() == VIDEO_ID_LENGTH
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Cached catalog metadata for a video.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// A video row as stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Video {
    pub id: VideoId,
    pub metadata: Metadata,

    /// When the metadata was last fetched from the catalog, if ever.
    pub fetched_at: Option<OffsetDateTime>,
}

impl Video {
    /// A freshly registered video without any metadata.
    pub fn bare(id: VideoId) -> Self {
        Video {
            id,
            metadata: Metadata::default(),
            fetched_at: None,
        }
    }
}

/// Aggregated votes for a single video, as seen by one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub likes: i64,
    pub dislikes: i64,
    pub session_like: bool,
    pub session_dislike: bool,
}

/// The merged read model returned by the listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    pub id: VideoId,
    pub title: String,
    pub thumbnail_url: String,
    #[serde(flatten)]
    pub tally: Tally,
}

impl VideoView {
    pub fn new(id: VideoId, metadata: Metadata, tally: Tally) -> Self {
        VideoView {
            id,
            title: metadata.title.unwrap_or_default(),
            thumbnail_url: metadata.thumbnail_url.unwrap_or_default(),
            tally,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn accepts_youtube_ids() {
        for id in &["dQw4w9WgXcQ", "a-b_c-d_e-f", "___________", "00000000000"] {
            assert_eq!(VideoId::parse(*id).unwrap().as_str(), *id);
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        for id in &["short", "", "dQw4w9WgXcQQ", "dQw4w9WgXc!", "dQw4w9 gXcQ", "dQw4w9WgXcé"] {
            match VideoId::parse(*id) {
                Err(BackendError::InvalidVideoId(raw)) => assert_eq!(raw, *id),
                other => panic!("expected {:?} to be rejected, got {:?}", id, other),
            }
        }
    }

    #[test]
    fn view_defaults_missing_metadata_to_empty_strings() {
        let id = VideoId::parse("dQw4w9WgXcQ").unwrap();
        let view = VideoView::new(id, Metadata::default(), Tally::default());

        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": "dQw4w9WgXcQ",
                "title": "",
                "thumbnailUrl": "",
                "likes": 0,
                "dislikes": 0,
                "sessionLike": false,
                "sessionDislike": false,
            })
        );
    }

    proptest! {
        #[test]
        fn any_url_safe_eleven_characters_are_valid(id in "[A-Za-z0-9_-]{11}") {
            prop_assert!(VideoId::parse(id).is_ok());
        }

        #[test]
        fn other_lengths_are_invalid(id in "[A-Za-z0-9_-]{0,10}|[A-Za-z0-9_-]{12,20}") {
            prop_assert!(VideoId::parse(id).is_err());
        }
    }
}
