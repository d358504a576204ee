use std::sync::Arc;
use std::time::Duration;

use log::Logger;

use crate::catalog::Catalog;
use crate::config::parse_variable_or;
use crate::db::Db;

/// Everything a request handler needs, cheap to clone.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub db: Arc<dyn Db + Send + Sync>,
    pub catalog: Arc<dyn Catalog>,
    pub config: Config,
}

impl Environment {
    pub fn new(
        logger: Arc<Logger>,
        db: Arc<dyn Db + Send + Sync>,
        catalog: Arc<dyn Catalog>,
        config: Config,
    ) -> Self {
        Self {
            logger,
            db,
            catalog,
            config,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// How long fetched metadata stays fresh.
    pub(crate) max_metadata_age: Duration,

    /// How many catalog lookups a single listing may run at once.
    pub(crate) refresh_concurrency: usize,
}

impl Config {
    pub const DEFAULT_MAX_METADATA_AGE: Duration = Duration::from_secs(24 * 60 * 60);
    pub const DEFAULT_REFRESH_CONCURRENCY: usize = 4;

    pub fn new(max_metadata_age: Duration, refresh_concurrency: usize) -> Self {
        Self {
            max_metadata_age,
            refresh_concurrency: refresh_concurrency.max(1),
        }
    }

    pub fn from_env() -> Self {
        let max_age = parse_variable_or(
            "BACKEND_METADATA_MAX_AGE_SECONDS",
            Self::DEFAULT_MAX_METADATA_AGE.as_secs(),
        );
        let concurrency = parse_variable_or(
            "BACKEND_REFRESH_CONCURRENCY",
            Self::DEFAULT_REFRESH_CONCURRENCY,
        );

        Config::new(Duration::from_secs(max_age), concurrency)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(
            Self::DEFAULT_MAX_METADATA_AGE,
            Self::DEFAULT_REFRESH_CONCURRENCY,
        )
    }
}
