//! Cosine similarity ranking.
//!
//! Scores every catalog vector against the query and orders them by
//! descending score. Equal scores keep their catalog order.

use std::cmp::Ordering;

/// A catalog position with its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    /// Position in the catalog
    pub index: usize,
    /// Cosine similarity in [-1.0, 1.0]
    pub score: f32,
}

/// Errors that can occur while ranking.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RankError {
    #[error("Dimension mismatch at catalog position {index}: expected {expected}, got {got}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },
}

/// Compute L2 norm of a vector.
fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity with a precomputed query norm.
///
/// A zero-norm vector on either side scores 0.0. Tiny but non-zero
/// vectors are still compared by direction.
fn cosine_with_norm(query: &[f32], query_norm: f32, target: &[f32]) -> f32 {
    if query_norm == 0.0 {
        return 0.0;
    }
    let target_norm = l2_norm(target);
    if target_norm == 0.0 {
        return 0.0;
    }

    let dot_product: f32 = query.iter().zip(target.iter()).map(|(a, b)| a * b).sum();
    let score = dot_product / (query_norm * target_norm);
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Cosine similarity between two vectors. Zero-norm input scores 0.0.
#[cfg(test)]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    cosine_with_norm(a, l2_norm(a), b)
}

/// Rank every catalog vector against the query.
///
/// Returns one entry per catalog vector, sorted by descending score.
/// The sort is stable so ties keep catalog order.
pub fn rank<V: AsRef<[f32]>>(query: &[f32], catalog: &[V]) -> Result<Vec<Ranked>, RankError> {
    let query_norm = l2_norm(query);

    let mut ranked = catalog
        .iter()
        .enumerate()
        .map(|(index, vector)| {
            let vector = vector.as_ref();
            if vector.len() != query.len() {
                return Err(RankError::DimensionMismatch {
                    index,
                    expected: query.len(),
                    got: vector.len(),
                });
            }
            Ok(Ranked {
                index,
                score: cosine_with_norm(query, query_norm, vector),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    Ok(ranked)
}

/// Rank and keep the best `k`. Returns everything when the catalog is smaller.
pub fn top_k<V: AsRef<[f32]>>(
    query: &[f32],
    catalog: &[V],
    k: usize,
) -> Result<Vec<Ranked>, RankError> {
    let mut ranked = rank(query, catalog)?;
    ranked.truncate(k);
    Ok(ranked)
}
