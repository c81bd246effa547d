//! End-to-end behaviour of the recommendation pipeline.
//!
//! Most tests use the deterministic keyword embedder. Tests against the
//! real model require a download and are marked #[ignore].
//! Run with: cargo test -- --ignored

use std::sync::Arc;

use crate::app::{AppContext, AppError};
use crate::catalog::{Catalog, CatalogItem};
use crate::config::Config;
use crate::semantic::{
    EmbeddingModel, RecommendError, RecommendationService, DEFAULT_TOP_K,
};
use crate::tests::support::{FailingEmbedder, KeywordEmbedder, MismatchedEmbedder};

fn service(items: &[(&str, &str)]) -> RecommendationService {
    let items = items
        .iter()
        .map(|(title, description)| CatalogItem::new(*title, *description))
        .collect();
    RecommendationService::new(
        Catalog::new(items),
        Arc::new(KeywordEmbedder::new()),
        DEFAULT_TOP_K,
    )
}

fn titles(service: &RecommendationService, query: &str) -> Vec<String> {
    service
        .recommend(query)
        .unwrap()
        .recommendations
        .into_iter()
        .map(|r| r.title)
        .collect()
}

const NEWSLETTERS: &[(&str, &str)] = &[
    ("Pet Weekly", "cats and dogs"),
    ("Launch Pad", "space rockets and orbit news"),
    ("Kitchen Notes", "cooking recipes"),
    ("This Week in Rust", "rust programming"),
    ("Market Wrap", "stocks and investing"),
];

#[test]
fn test_result_length_is_min_of_k_and_catalog() {
    for size in 0..=NEWSLETTERS.len() {
        let service = service(&NEWSLETTERS[..size]);
        let result = service.recommend("feline pets").unwrap();
        assert_eq!(result.len(), size.min(3), "catalog size {size}");
    }
}

#[test]
fn test_scores_are_non_increasing() {
    let service = service(NEWSLETTERS);
    for query in ["feline pets", "rockets", "rust code and recipes", "", "zzz"] {
        let result = service.recommend(query).unwrap();
        assert!(
            result
                .recommendations
                .windows(2)
                .all(|w| w[0].score >= w[1].score),
            "unsorted for {query:?}"
        );
    }
}

#[test]
fn test_equal_scores_keep_catalog_order() {
    let service = service(&[
        ("Stars", "space"),
        ("A", "cats"),
        ("B", "dogs"),
        ("C", "pets"),
        ("D", "puppy"),
    ]);

    let result = service.recommend("kitten").unwrap();
    let names: Vec<&str> = result.recommendations.iter().map(|r| r.title.as_str()).collect();

    assert_eq!(names, vec!["A", "B", "C"]);
    assert!(result.recommendations.iter().all(|r| (r.score - 1.0).abs() < 1e-6));
}

#[test]
fn test_empty_catalog_for_any_query() {
    let service = RecommendationService::new(
        Catalog::empty(),
        Arc::new(KeywordEmbedder::new()),
        DEFAULT_TOP_K,
    );

    for query in ["feline pets", "", "   "] {
        assert!(service.recommend(query).unwrap().is_empty());
    }
}

#[test]
fn test_exact_description_scores_highest() {
    let service = service(NEWSLETTERS);

    for (title, description) in NEWSLETTERS {
        let result = service.recommend(description).unwrap();
        let best = &result.recommendations[0];
        assert_eq!(best.title, *title);
        assert!((best.score - 1.0).abs() < 1e-6);
    }
}

#[test]
fn test_feline_pets_prefers_cats_and_dogs() {
    let service = service(&[("A", "cats and dogs"), ("B", "space rockets")]);
    assert_eq!(titles(&service, "feline pets"), vec!["A", "B"]);
}

#[test]
fn test_empty_query_scores_zero_everywhere() {
    let service = service(NEWSLETTERS);

    let result = service.recommend("").unwrap();
    assert_eq!(result.len(), 3);
    assert!(result.recommendations.iter().all(|r| r.score == 0.0));

    // all tied at zero: catalog order
    let names: Vec<&str> = result.recommendations.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(names, vec!["Pet Weekly", "Launch Pad", "Kitchen Notes"]);
}

#[test]
fn test_repeated_queries_are_identical() {
    let service = service(NEWSLETTERS);

    let first = service.recommend("space programming").unwrap();
    let second = service.recommend("space programming").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_recommendations_agree() {
    let service = service(NEWSLETTERS);
    let expected = service.recommend("rockets and recipes").unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| service.recommend("rockets and recipes").unwrap()))
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_configured_top_k() {
    let items = NEWSLETTERS
        .iter()
        .map(|(t, d)| CatalogItem::new(*t, *d))
        .collect();
    let service =
        RecommendationService::new(Catalog::new(items), Arc::new(KeywordEmbedder::new()), 5);

    assert_eq!(service.recommend("news").unwrap().len(), 5);
}

#[test]
fn test_wrong_catalog_dimensions_is_an_error() {
    let service = RecommendationService::new(
        Catalog::new(vec![CatalogItem::new("A", "x")]),
        Arc::new(MismatchedEmbedder),
        DEFAULT_TOP_K,
    );

    assert!(matches!(
        service.recommend("query"),
        Err(RecommendError::Rank(_))
    ));
}

fn config_for(catalog_path: &std::path::Path) -> Config {
    Config {
        catalog_path: catalog_path.to_string_lossy().to_string(),
        ..Default::default()
    }
}

#[test]
fn test_context_with_missing_catalog_degrades() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(&tmp.path().join("missing.json"));

    let app = AppContext::with_embedder(config, Arc::new(KeywordEmbedder::new())).unwrap();

    assert_eq!(app.stats().catalog_size, 0);
    assert!(app.recommend("feline pets").unwrap().is_empty());
}

#[test]
fn test_context_warms_cache_from_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("newsletters.json");
    std::fs::write(
        &path,
        r#"[
            {"title": "A", "description": "cats and dogs"},
            {"title": "broken"},
            {"title": "B", "description": "space rockets"}
        ]"#,
    )
    .unwrap();

    let embedder = Arc::new(KeywordEmbedder::new());
    let app = AppContext::with_embedder(config_for(&path), embedder.clone()).unwrap();

    let stats = app.stats();
    assert_eq!(stats.catalog_size, 2);
    assert!(stats.cache_warm);
    assert_eq!(embedder.batch_calls(), 1);

    let result = app.recommend("feline pets").unwrap();
    assert_eq!(result.recommendations[0].title, "A");
    assert_eq!(embedder.batch_calls(), 1);
}

#[test]
fn test_context_fails_when_warm_up_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("newsletters.json");
    std::fs::write(&path, r#"[{"title": "A", "description": "cats"}]"#).unwrap();

    let result = AppContext::with_embedder(config_for(&path), Arc::new(FailingEmbedder));
    assert!(matches!(result, Err(AppError::Recommend(_))));
}

#[test]
#[ignore = "requires model download (~23MB)"]
fn test_real_model_feline_pets() {
    let tmp = tempfile::tempdir().unwrap();
    let model = EmbeddingModel::new("all-MiniLM-L6-v2", tmp.path().to_path_buf(), None)
        .expect("Failed to initialize embedding model");

    let service = RecommendationService::new(
        Catalog::new(vec![
            CatalogItem::new("A", "cats and dogs"),
            CatalogItem::new("B", "space rockets"),
        ]),
        Arc::new(model),
        DEFAULT_TOP_K,
    );

    let result = service.recommend("feline pets").unwrap();
    assert_eq!(result.recommendations[0].title, "A");
    assert!(result.recommendations[0].score > result.recommendations[1].score);

    // empty query still ranks
    assert_eq!(service.recommend("").unwrap().len(), 2);

    // deterministic within a loaded model
    assert_eq!(
        service.recommend("feline pets").unwrap(),
        service.recommend("feline pets").unwrap()
    );
}
