//! Semantic retrieval engine for assessment catalogs.
//!
//! The offline side ([`builder`]) embeds every corpus record and persists an
//! exact flat index; the online side ([`recommend`]) loads it once and answers
//! free-text queries with ranked catalog records.

pub mod builder;
pub mod config;
pub mod corpus;
pub mod display;
pub mod error;
pub mod eval;
#[cfg(feature = "http-server")]
pub mod http;
pub mod io;
pub mod logging;
pub mod metadata;
pub mod presentation;
pub mod recommend;
pub mod vector;

// Explicit exports for better API clarity
pub use builder::{BuildReport, CorpusEmbedder, build_index};
pub use config::Settings;
pub use corpus::{Corpus, Record};
pub use error::{RecommendError, RecommendResult};
pub use eval::{EvaluationReport, LabeledQuery, evaluate};
pub use metadata::IndexMetadata;
pub use presentation::ResultView;
pub use recommend::{Engine, RecommendService, Recommendation};
pub use vector::{EmbeddingGenerator, Metric, VectorIndex};
