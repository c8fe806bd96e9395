//! End-to-end retrieval over an in-memory engine.

use std::sync::Arc;

use assessment_search::config::SearchConfig;
use assessment_search::{
    Corpus, CorpusEmbedder, Engine, Metric, Record, RecommendError, RecommendService, VectorIndex,
};

use crate::common::{HashingEmbedder, embedder, sample_corpus};

fn service_over(corpus: Corpus, metric: Metric) -> RecommendService {
    let generator = embedder();
    let matrix = CorpusEmbedder::new(generator.as_ref(), 2)
        .build(&corpus)
        .expect("embed corpus");
    let engine = Engine::from_parts(generator, corpus, VectorIndex::build(matrix, metric));
    engine.validate().expect("aligned engine");
    RecommendService::new(Arc::new(engine), &SearchConfig::default())
}

#[test]
fn test_reasoning_query_ranks_reasoning_test_first() {
    let service = service_over(sample_corpus(), Metric::InnerProduct);
    let rec = service
        .recommend("aptitude and reasoning assessment", 2)
        .unwrap();

    assert_eq!(rec.results.len(), 2);
    assert_eq!(rec.results[0].position, 0);
    assert_eq!(rec.results[0].assessment_name, "Verify Numerical Reasoning");
    assert_eq!(rec.results[0].remote_testing, "Yes");
    assert_eq!(rec.results[0].duration, "18 minutes");
    assert!(rec.latency_ms >= 0.0);
}

#[test]
fn test_result_length_is_min_of_k_and_corpus() {
    let service = service_over(sample_corpus(), Metric::InnerProduct);

    for k in 1..=5 {
        let rec = service.recommend("skills questionnaire", k).unwrap();
        assert_eq!(rec.results.len(), k.min(3), "k = {k}");
        assert!(rec.results.iter().all(|r| r.position < 3));
    }
    assert_eq!(service.recommend("anything", 100).unwrap().results.len(), 3);
}

#[test]
fn test_zero_k_is_invalid_argument() {
    let service = service_over(sample_corpus(), Metric::InnerProduct);
    let err = service.recommend("anything", 0).unwrap_err();
    assert!(matches!(err, RecommendError::InvalidArgument { .. }));
    assert!(err.is_per_query());
}

#[test]
fn test_scores_follow_metric_direction() {
    let records: Vec<Record> = [
        "numerical reasoning",
        "verbal reasoning",
        "inductive reasoning puzzle",
        "java programming",
        "sales personality profile",
        "reasoning reasoning speed",
    ]
    .iter()
    .enumerate()
    .map(|(i, text)| Record::new(format!("R{i}"), format!("https://example.com/{i}"), *text))
    .collect();

    let ip = service_over(Corpus::from_records(records.clone()), Metric::InnerProduct)
        .recommend("reasoning", 6)
        .unwrap();
    assert!(ip.results.windows(2).all(|w| w[0].score >= w[1].score));

    let l2 = service_over(Corpus::from_records(records), Metric::L2)
        .recommend("reasoning", 6)
        .unwrap();
    assert!(l2.results.windows(2).all(|w| w[0].score <= w[1].score));

    // Unit vectors: the closest row by cosine is also closest by L2.
    assert_eq!(ip.results[0].position, 5);
    assert_eq!(l2.results[0].position, 5);
}

#[test]
fn test_repeated_queries_are_identical() {
    let service = service_over(sample_corpus(), Metric::InnerProduct);
    let first = service.recommend("coding skills", 3).unwrap();
    let second = service.recommend("coding skills", 3).unwrap();
    assert_eq!(first.results, second.results);
}

#[test]
fn test_concurrent_queries_share_engine() {
    let service = service_over(sample_corpus(), Metric::InnerProduct);
    let expected = service.recommend("personality questionnaire", 2).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            std::thread::spawn(move || service.recommend("personality questionnaire", 2))
        })
        .collect();

    for handle in handles {
        let rec = handle.join().unwrap().unwrap();
        assert_eq!(rec.results, expected.results);
    }
    assert_eq!(expected.results[0].assessment_name, "OPQ32r");
}

#[test]
fn test_index_from_other_model_width_is_rejected() {
    let corpus = sample_corpus();
    let narrow = HashingEmbedder::with_dimension(256);
    let matrix = CorpusEmbedder::new(&narrow, 8).build(&corpus).unwrap();
    let engine = Engine::from_parts(
        embedder(),
        corpus,
        VectorIndex::build(matrix, Metric::InnerProduct),
    );

    assert!(matches!(
        engine.validate(),
        Err(RecommendError::DimensionMismatch {
            expected: 256,
            actual: 384
        })
    ));

    let service = RecommendService::new(Arc::new(engine), &SearchConfig::default());
    let err = service.recommend("reasoning", 1).unwrap_err();
    assert_eq!(err.status_code(), "DIMENSION_MISMATCH");
}

#[tokio::test]
async fn test_recommend_with_timeout_returns_results() {
    let service = service_over(sample_corpus(), Metric::InnerProduct);
    let rec = service
        .recommend_with_timeout(
            "numeric reasoning".to_string(),
            1,
            std::time::Duration::from_secs(5),
        )
        .await
        .unwrap();
    assert_eq!(rec.results.len(), 1);
    assert_eq!(rec.results[0].url, "https://example.com/numerical");
}
