use crate::{
    config::ConfigError,
    semantic::{EmbeddingError, RecommendError},
};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("embedding model unavailable: {0}")]
    Model(#[from] EmbeddingError),

    #[error("recommendation failed: {0}")]
    Recommend(#[from] RecommendError),

    #[error("recommendation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}
