//! Newsletter recommendation service.
//!
//! Coordinates the pieces of a recommendation:
//! - Embeds the query
//! - Fetches (or builds) the cached catalog vectors
//! - Ranks the catalog and keeps the top results

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogItem};
use crate::semantic::cache::EmbeddingCache;
use crate::semantic::embeddings::{Embedder, EmbeddingError};
use crate::semantic::ranker::{self, RankError};

/// Number of recommendations returned when not configured otherwise
pub const DEFAULT_TOP_K: usize = 3;

/// Errors that can occur while producing recommendations.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Ranking error: {0}")]
    Rank(#[from] RankError),
}

/// A catalog item together with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub title: String,
    pub description: String,
    pub score: f64,
}

impl ScoredItem {
    fn new(item: &CatalogItem, score: f32) -> Self {
        Self {
            title: item.title.clone(),
            description: item.description.clone(),
            score: f64::from(score),
        }
    }
}

/// Best matches for a query, highest score first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub recommendations: Vec<ScoredItem>,
}

impl RecommendationResult {
    pub fn len(&self) -> usize {
        self.recommendations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// Recommends catalog items for free-text queries.
///
/// Read-only after construction; `recommend` may run concurrently from
/// many threads.
pub struct RecommendationService {
    catalog: Catalog,
    embedder: Arc<dyn Embedder>,
    cache: EmbeddingCache,
    top_k: usize,
}

impl RecommendationService {
    pub fn new(catalog: Catalog, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            catalog,
            embedder,
            cache: EmbeddingCache::new(),
            top_k,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Embed the catalog ahead of the first request.
    pub fn warm_up(&self) -> Result<(), RecommendError> {
        self.cache.get_or_embed(&self.catalog, self.embedder.as_ref())?;
        Ok(())
    }

    pub fn is_warm(&self) -> bool {
        self.cache.is_warm(&self.catalog, self.embedder.as_ref())
    }

    /// Top matches for `query`, at most `top_k` of them.
    ///
    /// An empty catalog yields an empty result without touching the model.
    pub fn recommend(&self, query: &str) -> Result<RecommendationResult, RecommendError> {
        if self.catalog.is_empty() {
            log::debug!("empty catalog, nothing to recommend for {query:?}");
            return Ok(RecommendationResult::default());
        }

        let started = std::time::Instant::now();
        let query_vector = self.embedder.embed(query)?;
        let catalog_vectors = self.cache.get_or_embed(&self.catalog, self.embedder.as_ref())?;

        let ranked = ranker::top_k(&query_vector, catalog_vectors.as_slice(), self.top_k)?;

        let recommendations = ranked
            .into_iter()
            .filter_map(|r| {
                self.catalog
                    .get(r.index)
                    .map(|item| ScoredItem::new(item, r.score))
            })
            .collect();

        log::debug!("recommended for {query:?} in {:?}", started.elapsed());

        Ok(RecommendationResult { recommendations })
    }
}
