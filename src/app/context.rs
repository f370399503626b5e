use std::path::PathBuf;
use std::sync::Arc;

use crate::aggregator::OfferAggregator;
use crate::app::error::{Result, VitrineError};
use crate::clicks::ClickTracker;
use crate::config::Config;
use crate::extractor::ProductExtractor;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::importer::BulkImporter;
use crate::pipeline::Acquirer;
use crate::store::SqliteStore;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub acquirer: Acquirer,
    pub aggregator: OfferAggregator<SqliteStore>,
    pub clicks: ClickTracker<SqliteStore>,
    pub importer: BulkImporter<SqliteStore>,
}

impl AppContext {
    /// Open the configured database (or the default one) and wire the services.
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match config.database.path.clone() {
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
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetcher)?);
        let acquirer = Acquirer::new(fetcher, ProductExtractor::new(config.extractor.clone()));
        let aggregator = OfferAggregator::new(Arc::clone(&store), acquirer.clone());
        let clicks = ClickTracker::new(Arc::clone(&store));
        let importer = BulkImporter::new(aggregator.clone());

        Ok(Self {
            config,
            store,
            acquirer,
            aggregator,
            clicks,
            importer,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| VitrineError::Config("Could not find data directory".into()))?;
        let vitrine_dir = data_dir.join("vitrine");
        std::fs::create_dir_all(&vitrine_dir)?;
        Ok(vitrine_dir.join("vitrine.db"))
    }
}
