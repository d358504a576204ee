//! Test doubles for the collaborators of the core: a catalog that
//! answers from a table, and helpers to assemble an `Environment`
//! around the in-memory `Db`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{self, BoxFuture, FutureExt};
use time::OffsetDateTime;

use crate::catalog::{Catalog, CatalogEntry, Thumbnail, Thumbnails};
use crate::db::Db;
use crate::environment::{Config, Environment};
use crate::errors::BackendError;
use crate::video::{Metadata, Video, VideoId};

/// A catalog that knows only the entries inserted into it and counts
/// every lookup.
#[derive(Default)]
pub struct StubCatalog {
    entries: Mutex<HashMap<VideoId, CatalogEntry>>,
    lookups: AtomicUsize,
}

impl StubCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: &VideoId, title: &str, high: Option<&str>, default: Option<&str>) {
        let thumbnail = |url: &str| Thumbnail {
            url: url.to_owned(),
        };

        let entry = CatalogEntry {
            title: title.to_owned(),
            thumbnails: Thumbnails {
                high: high.map(thumbnail),
                default: default.map(thumbnail),
            },
        };

        self.entries.lock().unwrap().insert(id.clone(), entry);
    }

    /// How many lookups have been made so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl Catalog for StubCatalog {
    fn lookup(&self, id: &VideoId) -> BoxFuture<Result<CatalogEntry, BackendError>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let result = self
            .entries
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::VideoNotFound(id.to_string()));

        future::ready(result).boxed()
    }
}

/// An environment with a silent logger and the default configuration.
pub fn environment(db: Arc<dyn Db + Send + Sync>, catalog: Arc<dyn Catalog>) -> Environment {
    Environment::new(Arc::new(log::discard()), db, catalog, Config::default())
}

/// A video whose metadata was fetched at `fetched_at`.
pub fn video_with_title(id: VideoId, title: &str, fetched_at: OffsetDateTime) -> Video {
    Video {
        id,
        metadata: Metadata {
            title: Some(title.to_owned()),
            thumbnail_url: None,
        },
        fetched_at: Some(fetched_at),
    }
}
