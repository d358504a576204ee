use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use url::Url;

use crate::errors::BackendError;
use crate::video::VideoId;

/// The YouTube Data API endpoint used unless configured otherwise.
pub const DEFAULT_YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// What the catalog knows about a video.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub title: String,

    #[serde(default)]
    pub thumbnails: Thumbnails,
}

/// The thumbnail variants the catalog offers. Only the two the
/// service chooses between are kept.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Thumbnails {
    pub high: Option<Thumbnail>,
    pub default: Option<Thumbnail>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Thumbnail {
    pub url: String,
}

impl CatalogEntry {
    /// The high-resolution thumbnail if there is one, otherwise the
    /// default one.
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnails
            .high
            .as_ref()
            .or_else(|| self.thumbnails.default.as_ref())
            .map(|t| t.url.as_str())
    }
}

/// The external source of video metadata.
pub trait Catalog: Send + Sync {
    /// Looks up a video by its identifier. Unknown videos produce
    /// `BackendError::VideoNotFound`.
    fn lookup(&self, id: &VideoId) -> BoxFuture<Result<CatalogEntry, BackendError>>;
}

/// A catalog backed by the YouTube Data API.
pub struct YoutubeCatalog {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl YoutubeCatalog {
    /// Creates a new instance. `base_url` must include the trailing
    /// slash.
    pub fn new(base_url: Url, api_key: String, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| BackendError::CatalogRequest { source })?;

        Ok(YoutubeCatalog {
            client,
            base_url,
            api_key,
        })
    }

    fn videos_url(&self, id: &VideoId) -> Result<Url, BackendError> {
        let mut url = self
            .base_url
            .join("videos")
            .map_err(|source| BackendError::CatalogUrl { source })?;

        url.query_pairs_mut()
            .append_pair("part", "snippet")
            .append_pair("id", id.as_str())
            .append_pair("key", &self.api_key);

        Ok(url)
    }
}

impl Catalog for YoutubeCatalog {
    fn lookup(&self, id: &VideoId) -> BoxFuture<Result<CatalogEntry, BackendError>> {
        let id = id.clone();

        async move {
            let url = self.videos_url(&id)?;

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|source| BackendError::CatalogRequest { source })?;

            let status = response.status();

            if !status.is_success() {
                return Err(BackendError::CatalogStatus {
                    status: status.as_u16(),
                });
            }

            let list: VideoListResponse = response
                .json()
                .await
                .map_err(|source| BackendError::CatalogRequest { source })?;

            list.into_entry(&id)
        }
        .boxed()
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
struct VideoResource {
    snippet: CatalogEntry,
}

impl VideoListResponse {
    fn into_entry(self, id: &VideoId) -> Result<CatalogEntry, BackendError> {
        self.items
            .into_iter()
            .next()
            .map(|item| item.snippet)
            .ok_or_else(|| BackendError::VideoNotFound(id.to_string()))
    }
}
