//! Catalog embedding cache.
//!
//! The catalog is fixed for the life of the process, so its description
//! vectors only need computing once. Entries are keyed by catalog version
//! and model name; a different key replaces the entry.

use std::sync::{Arc, RwLock};

use crate::catalog::Catalog;
use crate::semantic::embeddings::{Embedder, EmbeddingError};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    catalog_version: String,
    model: String,
}

struct CachedVectors {
    key: CacheKey,
    vectors: Arc<Vec<Vec<f32>>>,
}

/// Holds the description vectors of the current catalog.
#[derive(Default)]
pub struct EmbeddingCache {
    entry: RwLock<Option<CachedVectors>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached vectors for `catalog`, embedding it on a miss.
    ///
    /// Concurrent misses may embed the catalog more than once; the first
    /// writer wins and later results are discarded.
    pub fn get_or_embed(
        &self,
        catalog: &Catalog,
        embedder: &dyn Embedder,
    ) -> Result<Arc<Vec<Vec<f32>>>, EmbeddingError> {
        let key = CacheKey {
            catalog_version: catalog.version().to_string(),
            model: embedder.name().to_string(),
        };

        if let Some(vectors) = self.lookup(&key) {
            return Ok(vectors);
        }

        let started = std::time::Instant::now();
        let vectors = Arc::new(embedder.embed_batch(&catalog.descriptions())?);
        if vectors.len() != catalog.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: catalog.len(),
                got: vectors.len(),
            });
        }
        log::info!(
            "embedded {} catalog descriptions in {:?}",
            vectors.len(),
            started.elapsed()
        );

        let mut guard = self
            .entry
            .write()
            .map_err(|e| EmbeddingError::EmbeddingFailed(format!("cache lock poisoned: {e}")))?;

        match guard.as_ref() {
            Some(existing) if existing.key == key => Ok(existing.vectors.clone()),
            _ => {
                *guard = Some(CachedVectors {
                    key,
                    vectors: vectors.clone(),
                });
                Ok(vectors)
            }
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<Arc<Vec<Vec<f32>>>> {
        let guard = self.entry.read().ok()?;
        guard
            .as_ref()
            .filter(|cached| &cached.key == key)
            .map(|cached| cached.vectors.clone())
    }

    /// Whether vectors for this catalog and model are already cached.
    pub fn is_warm(&self, catalog: &Catalog, embedder: &dyn Embedder) -> bool {
        self.lookup(&CacheKey {
            catalog_version: catalog.version().to_string(),
            model: embedder.name().to_string(),
        })
        .is_some()
    }
}
