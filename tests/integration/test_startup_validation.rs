//! Startup refuses artifacts that disagree with each other.

use assessment_search::{Engine, RecommendError, build_index};

use crate::common::{HashingEmbedder, TestWorkspace, embedder, sample_records};
use std::sync::Arc;

fn built_workspace() -> TestWorkspace {
    let workspace = TestWorkspace::new();
    build_index(&workspace.settings, embedder().as_ref(), &workspace.corpus(), false).unwrap();
    workspace
}

fn assert_load_failure(result: Result<Engine, RecommendError>, resource: &str) {
    match result {
        Err(RecommendError::ResourceLoadFailure {
            resource: actual, ..
        }) => assert_eq!(actual, resource),
        Err(other) => panic!("expected {resource} load failure, got {other:?}"),
        Ok(_) => panic!("expected {resource} load failure, engine loaded"),
    }
}

#[test]
fn test_missing_index_is_fatal() {
    let workspace = TestWorkspace::new();
    assert_load_failure(
        Engine::load_with_generator(&workspace.settings, embedder()),
        "index",
    );
}

#[test]
fn test_missing_corpus_is_fatal() {
    let workspace = built_workspace();
    std::fs::remove_file(&workspace.settings.corpus_path).unwrap();
    assert_load_failure(
        Engine::load_with_generator(&workspace.settings, embedder()),
        "corpus",
    );
}

#[test]
fn test_missing_metadata_is_fatal() {
    let workspace = built_workspace();
    std::fs::remove_file(workspace.settings.metadata_file()).unwrap();
    assert_load_failure(
        Engine::load_with_generator(&workspace.settings, embedder()),
        "index metadata",
    );
}

#[test]
fn test_grown_corpus_is_row_count_mismatch() {
    let workspace = built_workspace();
    let mut records = sample_records();
    records.push(assessment_search::Record::new(
        "New",
        "https://example.com/new",
        "situational judgement",
    ));
    workspace.write_corpus(&records);

    assert!(matches!(
        Engine::load_with_generator(&workspace.settings, embedder()),
        Err(RecommendError::RowCountMismatch {
            index_rows: 3,
            corpus_len: 4
        })
    ));
}

#[test]
fn test_edited_corpus_is_detected() {
    let workspace = built_workspace();
    let mut records = sample_records();
    records.swap(0, 1);
    workspace.write_corpus(&records);

    assert_load_failure(
        Engine::load_with_generator(&workspace.settings, embedder()),
        "index metadata",
    );
}

#[test]
fn test_other_model_is_detected() {
    let workspace = built_workspace();
    let other = Arc::new(HashingEmbedder::new().named("another-model"));
    assert_load_failure(
        Engine::load_with_generator(&workspace.settings, other),
        "index metadata",
    );
}

#[test]
fn test_other_model_width_is_dimension_mismatch() {
    let workspace = built_workspace();
    let narrow = Arc::new(HashingEmbedder::with_dimension(256));
    assert!(matches!(
        Engine::load_with_generator(&workspace.settings, narrow),
        Err(RecommendError::DimensionMismatch {
            expected: 384,
            actual: 256
        })
    ));
}

#[test]
fn test_corrupt_index_is_fatal() {
    let workspace = built_workspace();
    std::fs::write(workspace.settings.index_file(), b"AIDX\x01").unwrap();
    assert_load_failure(
        Engine::load_with_generator(&workspace.settings, embedder()),
        "index",
    );
}
