//! Test doubles for the embedding provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::semantic::{Embedder, EmbeddingError};

/// Words sharing a topic land on the same axis; unknown words are spread
/// over the trailing axes; stop words are ignored. Empty text embeds to
/// the zero vector.
const TOPICS: &[&[&str]] = &[
    &["cat", "cats", "dog", "dogs", "feline", "kitten", "pet", "pets", "puppy"],
    &["space", "rocket", "rockets", "orbit", "nasa", "astronomy", "planets"],
    &["cooking", "recipe", "recipes", "food", "baking", "kitchen"],
    &["rust", "programming", "code", "software", "compilers"],
    &["money", "markets", "stocks", "investing", "finance"],
];

const STOP_WORDS: &[&str] = &["a", "an", "and", "the", "of", "for", "about"];

const UNKNOWN_AXES: usize = 3;

/// Deterministic keyword embedder.
pub struct KeywordEmbedder {
    batch_calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            batch_calls: AtomicUsize::new(0),
        }
    }

    /// How many times `embed_batch` ran.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions()];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
        {
            if STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            let axis = TOPICS
                .iter()
                .position(|topic| topic.contains(&word.as_str()))
                .unwrap_or_else(|| {
                    let spread = word.bytes().map(usize::from).sum::<usize>() % UNKNOWN_AXES;
                    TOPICS.len() + spread
                });
            vector[axis] += 1.0;
        }

        vector
    }
}

impl Embedder for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword-test"
    }

    fn dimensions(&self) -> usize {
        TOPICS.len() + UNKNOWN_AXES
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vectorize(text))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}

/// Embedder whose model is never available.
pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn name(&self) -> &str {
        "failing-test"
    }

    fn dimensions(&self) -> usize {
        0
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::EmbeddingFailed("model unavailable".to_string()))
    }

    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::EmbeddingFailed("model unavailable".to_string()))
    }
}

/// Embedder that returns vectors of the wrong length for catalog batches.
pub struct MismatchedEmbedder;

impl Embedder for MismatchedEmbedder {
    fn name(&self) -> &str {
        "mismatched-test"
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(vec![1.0, 0.0])
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }
}

/// Keyword embedder that takes `delay` to embed a query.
pub struct SlowEmbedder {
    inner: KeywordEmbedder,
    delay: Duration,
}

impl SlowEmbedder {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: KeywordEmbedder::new(),
            delay,
        }
    }
}

impl Embedder for SlowEmbedder {
    fn name(&self) -> &str {
        "slow-test"
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        std::thread::sleep(self.delay);
        self.inner.embed(text)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.inner.embed_batch(texts)
    }
}
