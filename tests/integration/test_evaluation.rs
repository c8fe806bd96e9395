//! Labeled-query evaluation over the sample catalog.

use std::sync::Arc;

use assessment_search::config::SearchConfig;
use assessment_search::eval::{load_labeled_queries, mean_average_precision};
use assessment_search::{CorpusEmbedder, Engine, Metric, RecommendService, VectorIndex, evaluate};
use tempfile::TempDir;

use crate::common::{embedder, sample_corpus};

fn service() -> RecommendService {
    let generator = embedder();
    let corpus = sample_corpus();
    let matrix = CorpusEmbedder::new(generator.as_ref(), 4)
        .build(&corpus)
        .unwrap();
    let engine = Engine::from_parts(
        generator,
        corpus,
        VectorIndex::build(matrix, Metric::InnerProduct),
    );
    RecommendService::new(Arc::new(engine), &SearchConfig::default())
}

#[test]
fn test_evaluate_labeled_queries_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("labels.json");
    std::fs::write(
        &path,
        r#"[
            {"query": "numeric reasoning", "relevant": ["https://example.com/numerical"]},
            {"query": "coding skills", "relevant": ["https://example.com/coding", "https://example.com/missing"]}
        ]"#,
    )
    .unwrap();

    let queries = load_labeled_queries(&path).unwrap();
    assert_eq!(queries.len(), 2);

    let report = evaluate(&service(), &queries, 1).unwrap();
    assert_eq!(report.k, 1);
    assert_eq!(report.queries.len(), 2);

    let first = &report.queries[0];
    assert_eq!(first.retrieved, vec!["https://example.com/numerical"]);
    assert!((first.recall - 1.0).abs() < 1e-9);
    assert!((first.average_precision - 1.0).abs() < 1e-9);

    let second = &report.queries[1];
    assert!((second.recall - 0.5).abs() < 1e-9);
    assert!((second.precision - 1.0).abs() < 1e-9);

    assert!((report.mean_recall - 0.75).abs() < 1e-9);
    assert!((report.map - 1.0).abs() < 1e-9);

    let runs: Vec<(Vec<String>, Vec<String>)> = report
        .queries
        .iter()
        .zip(&queries)
        .map(|(evaluated, labeled)| (evaluated.retrieved.clone(), labeled.relevant.clone()))
        .collect();
    assert_eq!(report.map, mean_average_precision(&runs, 1));
}

#[test]
fn test_evaluate_propagates_query_errors() {
    let queries = vec![assessment_search::LabeledQuery {
        query: "anything".to_string(),
        relevant: vec![],
    }];
    assert!(evaluate(&service(), &queries, 0).is_err());
}

#[test]
fn test_missing_label_file() {
    let dir = TempDir::new().unwrap();
    assert!(load_labeled_queries(dir.path().join("none.json")).is_err());
}
