//! Semantic recommendation pipeline.
//!
//! # Architecture
//!
//! - `embeddings`: Embedding provider trait and the fastembed model
//! - `ranker`: Cosine similarity scoring and stable top-K selection
//! - `cache`: Catalog vectors cached per catalog version and model
//! - `service`: High-level recommendation service

pub mod embeddings;
mod cache;
pub mod ranker;
mod service;

pub use embeddings::{Embedder, EmbeddingError, EmbeddingModel};
pub use service::{RecommendError, RecommendationResult, RecommendationService, DEFAULT_TOP_K};

/// Default embedding model name
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";
