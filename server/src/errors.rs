use thiserror::Error;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an SQL error.
    #[error("SQLx error: {source}")]
    Sqlx { source: sqlx::Error },

    /// Represents a video identifier that isn’t 11 URL-safe characters.
    #[error("invalid video ID: {0:?}")]
    InvalidVideoId(String),

    /// Represents a vote other than `like` or `dislike`.
    #[error("invalid vote: {0:?}")]
    InvalidVote(String),

    /// Represents a request body that couldn’t be parsed.
    #[error("malformed request: {0}")]
    MalformedRequest(#[source] serde_json::Error),

    /// Represents a failure to reach the catalog or read its response.
    #[error("catalog request failed: {source}")]
    CatalogRequest { source: reqwest::Error },

    /// Represents a catalog response with an unsuccessful status.
    #[error("catalog returned status {status}")]
    CatalogStatus { status: u16 },

    /// Represents a video the catalog doesn’t know about.
    #[error("video not found in catalog: {0}")]
    VideoNotFound(String),

    /// Represents a failure to build a catalog URL.
    #[error("unable to build catalog URL: {source}")]
    CatalogUrl { source: url::ParseError },
}

impl BackendError {
    /// Whether the error was caused by the client’s input rather than
    /// by the server or its collaborators.
    pub fn is_validation(&self) -> bool {
        use BackendError::*;

        matches!(
            self,
            InvalidVideoId(..) | InvalidVote(..) | MalformedRequest(..)
        )
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(source: sqlx::Error) -> Self {
        BackendError::Sqlx { source }
    }
}
