use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use tracing::debug;

use crate::app::error::{Result, RillError};
use crate::config::TranslationConfig;
use crate::constants::APP_NAME;
use crate::fetcher::http_fetcher::{HttpFetcher, DEFAULT_TIMEOUT};
use crate::fetcher::parallel::{ParallelFetcher, DEFAULT_WORKERS};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::store::sqlite::SqliteStore;
use crate::translation::{HttpTranslator, Translator};

pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub parallel_fetcher: ParallelFetcher,
    pub normalizer: Normalizer,
    /// Present only when a translation endpoint is configured.
    pub translator: Option<Arc<dyn Translator + Send + Sync>>,
    client: Client,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        Self::with_workers(db_path, DEFAULT_WORKERS)
    }

    pub fn with_workers(db_path: Option<PathBuf>, workers: usize) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };
        debug!("opening database at {}", db_path.display());
        Self::build(Arc::new(SqliteStore::new(&db_path)?), workers)
    }

    pub fn in_memory() -> Result<Self> {
        Self::build(Arc::new(SqliteStore::in_memory()?), DEFAULT_WORKERS)
    }

    fn build(store: Arc<SqliteStore>, workers: usize) -> Result<Self> {
        let http = HttpFetcher::new(DEFAULT_TIMEOUT)?;
        let client = http.client().clone();
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(http);
        let parallel_fetcher = ParallelFetcher::with_workers(fetcher.clone(), workers);

        Ok(Self {
            store,
            fetcher,
            parallel_fetcher,
            normalizer: Normalizer::new(),
            translator: None,
            client,
        })
    }

    /// Enable title translation against the configured endpoint.
    pub fn with_translation(mut self, config: &TranslationConfig) -> Self {
        if let Some(endpoint) = &config.endpoint {
            let translator = HttpTranslator::new(self.client.clone(), endpoint.as_str());
            self.translator = Some(Arc::new(translator));
        }
        self
    }

    /// `<data dir>/rill`, created on demand. Holds the database and the log.
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| RillError::Config("Could not find data directory".into()))?;
        let dir = data_dir.join(APP_NAME);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn default_db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join(format!("{}.db", APP_NAME)))
    }
}
