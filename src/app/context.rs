use std::path::PathBuf;
use std::sync::Arc;

use crate::api::HttpApiClient;
use crate::app::error::{Result, SubwatchError};
use crate::cache::MokaCache;
use crate::config::Config;
use crate::poller::{Poller, PollerConfig};
use crate::service::{Credentials, DataService};
use crate::store::SqliteStore;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub cache: Arc<MokaCache>,
    pub client: Arc<HttpApiClient>,
    pub service: Arc<DataService>,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store)
    }

    fn with_store(config: Config, store: Arc<SqliteStore>) -> Result<Self> {
        let cache = Arc::new(MokaCache::new(config.cache.max_capacity));
        let client = Arc::new(HttpApiClient::new(&config.reddit)?);
        let service = Arc::new(DataService::new(
            client.clone(),
            store.clone(),
            cache.clone(),
            Credentials::from_config(&config.reddit),
        ));

        Ok(Self {
            config,
            store,
            cache,
            client,
            service,
        })
    }

    /// Build a poller for `subreddit` sharing this context's service.
    pub fn poller(&self, subreddit: &str) -> Result<Poller> {
        let config = PollerConfig::from_config(&self.config.polling)
            .map_err(|e| SubwatchError::Config(e.to_string()))?;
        Poller::new(self.service.clone(), subreddit, config)
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| SubwatchError::Config("Could not find data directory".into()))?;
        let subwatch_dir = data_dir.join("subwatch");
        std::fs::create_dir_all(&subwatch_dir)?;
        Ok(subwatch_dir.join("subwatch.db"))
    }
}
