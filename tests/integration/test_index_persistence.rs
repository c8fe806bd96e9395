//! Offline build followed by online load, through real files.

use std::sync::Arc;

use assessment_search::config::SearchConfig;
use assessment_search::{
    CorpusEmbedder, EmbeddingGenerator, Engine, IndexMetadata, Metric, RecommendService,
    VectorIndex, build_index,
};

use crate::common::{TestWorkspace, embedder, sample_corpus};

const QUERIES: &[&str] = &[
    "aptitude and reasoning assessment",
    "personality questionnaire",
    "coding simulation",
    "",
    "completely unrelated words",
];

#[test]
fn test_serialized_index_answers_identically() {
    let generator = embedder();
    let corpus = sample_corpus();
    let matrix = CorpusEmbedder::new(generator.as_ref(), 32)
        .build(&corpus)
        .unwrap();

    for metric in [Metric::InnerProduct, Metric::L2] {
        let original = VectorIndex::build(matrix.clone(), metric);
        let restored = VectorIndex::deserialize(&original.serialize()).unwrap();
        assert_eq!(restored.metric(), metric);

        for query in QUERIES {
            let vector = generator.embed(query).unwrap();
            for k in 1..=4 {
                let a = original.search(&vector, k).unwrap();
                let b = restored.search(&vector, k).unwrap();
                assert_eq!(a.len(), b.len());
                for (x, y) in a.iter().zip(&b) {
                    assert_eq!(x.position, y.position, "query {query:?} k {k}");
                    assert!((x.score - y.score).abs() < 1e-5);
                }
            }
        }
    }
}

#[test]
fn test_build_then_load_serves_queries() {
    let workspace = TestWorkspace::new();
    let generator = embedder();

    let report = build_index(
        &workspace.settings,
        generator.as_ref(),
        &workspace.corpus(),
        false,
    )
    .unwrap();
    assert_eq!(report.records, 3);
    assert_eq!(report.metric, Metric::InnerProduct);
    assert!(workspace.settings.index_file().exists());
    assert!(workspace.settings.metadata_file().exists());

    let engine = Engine::load_with_generator(&workspace.settings, generator).unwrap();
    assert_eq!(engine.len(), 3);

    let service = RecommendService::new(Arc::new(engine), &SearchConfig::default());
    let rec = service
        .recommend("aptitude and reasoning assessment", 2)
        .unwrap();
    assert_eq!(rec.results.len(), 2);
    assert_eq!(rec.results[0].url, "https://example.com/numerical");
}

#[test]
fn test_metric_comes_from_index_not_settings() {
    let mut workspace = TestWorkspace::new();
    workspace.settings.search.metric = Metric::L2;
    build_index(&workspace.settings, embedder().as_ref(), &workspace.corpus(), false).unwrap();

    // Serving with a different configured metric still uses the stored one.
    workspace.settings.search.metric = Metric::InnerProduct;
    let engine = Engine::load_with_generator(&workspace.settings, embedder()).unwrap();
    assert_eq!(engine.metric(), Metric::L2);

    let service = RecommendService::new(Arc::new(engine), &workspace.settings.search);
    let rec = service.recommend("coding skills", 3).unwrap();
    assert!(rec.results.windows(2).all(|w| w[0].score <= w[1].score));
}

#[test]
fn test_rebuild_replaces_artifacts() {
    let workspace = TestWorkspace::new();
    build_index(&workspace.settings, embedder().as_ref(), &workspace.corpus(), false).unwrap();
    let first = IndexMetadata::load(&workspace.settings.metadata_file()).unwrap();

    let mut records = crate::common::sample_records();
    records.truncate(2);
    workspace.write_corpus(&records);
    build_index(&workspace.settings, embedder().as_ref(), &workspace.corpus(), false).unwrap();

    let second = IndexMetadata::load(&workspace.settings.metadata_file()).unwrap();
    assert_eq!(second.record_count, 2);
    assert_ne!(first.corpus_digest, second.corpus_digest);
    assert_eq!(
        VectorIndex::load(workspace.settings.index_file()).unwrap().len(),
        2
    );
}
