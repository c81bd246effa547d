use crate::{
    app::AppError,
    catalog::JsonCatalogStore,
    config::Config,
    semantic::{Embedder, EmbeddingModel, RecommendationResult, RecommendationService},
};
use serde::Serialize;
use std::sync::Arc;

/// Application context built once at startup and shared read-only by
/// every request until shutdown.
pub struct AppContext {
    /// Loaded configuration
    config: Config,
    /// Catalog, embedder and embedding cache
    service: RecommendationService,
}

impl AppContext {
    pub fn new(config: Config, service: RecommendationService) -> Self {
        Self { config, service }
    }

    /// Load the model and catalog described by `config`.
    ///
    /// A model that fails to load is fatal. A missing catalog is not: the
    /// context comes up with an empty catalog and answers every query with
    /// no recommendations.
    pub fn bootstrap(config: Config) -> Result<Self, AppError> {
        log::info!("initializing embedding model '{}'", config.model);
        let model = EmbeddingModel::new(
            &config.model,
            config.base_path().to_path_buf(),
            Some(config.download_timeout()),
        )?;

        Self::with_embedder(config, Arc::new(model))
    }

    /// Same as `bootstrap` with an already constructed embedder.
    pub fn with_embedder(config: Config, embedder: Arc<dyn Embedder>) -> Result<Self, AppError> {
        let catalog = JsonCatalogStore::new(&config.catalog_path).load();
        if catalog.is_empty() {
            log::warn!("catalog is empty, every query will return no recommendations");
        }

        let service = RecommendationService::new(catalog, embedder, config.top_k);

        if config.warm_cache {
            let started = std::time::Instant::now();
            service.warm_up()?;
            log::info!("embedding cache warmed in {:?}", started.elapsed());
        }

        Ok(Self::new(config, service))
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn recommend(&self, query: &str) -> Result<RecommendationResult, AppError> {
        self.service.recommend(query).map_err(Into::into)
    }

    pub fn stats(&self) -> AppStats {
        let embedder = self.service.embedder();
        AppStats {
            catalog_size: self.service.catalog().len(),
            catalog_version: self.service.catalog().version().to_string(),
            model: embedder.name().to_string(),
            dimensions: embedder.dimensions(),
            cache_warm: self.service.is_warm(),
            top_k: self.service.top_k(),
        }
    }
}

/// Application statistics
#[derive(Debug, Clone, Serialize)]
pub struct AppStats {
    pub catalog_size: usize,
    pub catalog_version: String,
    pub model: String,
    pub dimensions: usize,
    pub cache_warm: bool,
    pub top_k: usize,
}
