//! Offline relevance evaluation against labeled queries.
//!
//! Relevance is judged by URL: a retrieved record counts as relevant if its
//! URL appears in the query's labeled set.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RecommendError, RecommendResult};
use crate::recommend::RecommendService;

/// A query with the URLs a correct answer should contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledQuery {
    pub query: String,
    #[serde(default)]
    pub relevant: Vec<String>,
}

/// Load a JSON array of labeled queries.
pub fn load_labeled_queries(path: impl AsRef<Path>) -> RecommendResult<Vec<LabeledQuery>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .map_err(|e| RecommendError::load("labeled queries", path, e))?;
    serde_json::from_str(&json).map_err(|e| RecommendError::load("labeled queries", path, e))
}

/// Fraction of relevant items found in the top `k`.
pub fn recall_at_k(retrieved: &[String], relevant: &[String], k: usize) -> f64 {
    let relevant: HashSet<&str> = relevant.iter().map(String::as_str).collect();
    if relevant.is_empty() {
        return 0.0;
    }
    hits(retrieved, &relevant, k) as f64 / relevant.len() as f64
}

/// Fraction of the top `k` slots holding a relevant item.
pub fn precision_at_k(retrieved: &[String], relevant: &[String], k: usize) -> f64 {
    let relevant: HashSet<&str> = relevant.iter().map(String::as_str).collect();
    if relevant.is_empty() || k == 0 {
        return 0.0;
    }
    hits(retrieved, &relevant, k) as f64 / k as f64
}

/// Average of precision at each rank holding a relevant item, over
/// `min(|relevant|, k)`.
pub fn average_precision(retrieved: &[String], relevant: &[String], k: usize) -> f64 {
    let relevant: HashSet<&str> = relevant.iter().map(String::as_str).collect();
    if relevant.is_empty() || k == 0 {
        return 0.0;
    }

    let mut seen = HashSet::new();
    let mut found = 0usize;
    let mut sum = 0.0;
    for (rank, url) in retrieved.iter().take(k).enumerate() {
        if relevant.contains(url.as_str()) && seen.insert(url.as_str()) {
            found += 1;
            sum += found as f64 / (rank + 1) as f64;
        }
    }
    sum / relevant.len().min(k) as f64
}

/// Mean of [`average_precision`] over `(retrieved, relevant)` pairs.
pub fn mean_average_precision(runs: &[(Vec<String>, Vec<String>)], k: usize) -> f64 {
    if runs.is_empty() {
        return 0.0;
    }
    runs.iter()
        .map(|(retrieved, relevant)| average_precision(retrieved, relevant, k))
        .sum::<f64>()
        / runs.len() as f64
}

fn hits(retrieved: &[String], relevant: &HashSet<&str>, k: usize) -> usize {
    retrieved
        .iter()
        .take(k)
        .map(String::as_str)
        .filter(|url| relevant.contains(url))
        .collect::<HashSet<_>>()
        .len()
}

/// Scores for a single labeled query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryEvaluation {
    pub query: String,
    pub retrieved: Vec<String>,
    pub recall: f64,
    pub precision: f64,
    pub average_precision: f64,
}

/// Per-query and mean scores for one evaluation run.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub queries: Vec<QueryEvaluation>,
    pub mean_recall: f64,
    pub mean_precision: f64,
    pub map: f64,
}

/// Run every labeled query through `service` and score the top `k`.
///
/// A query that fails aborts the evaluation with its error.
pub fn evaluate(
    service: &RecommendService,
    queries: &[LabeledQuery],
    k: usize,
) -> RecommendResult<EvaluationReport> {
    let mut evaluations = Vec::with_capacity(queries.len());
    let mut runs = Vec::with_capacity(queries.len());

    for labeled in queries {
        let retrieved: Vec<String> = service
            .recommend(&labeled.query, k)?
            .results
            .into_iter()
            .map(|view| view.url)
            .collect();

        let evaluation = QueryEvaluation {
            recall: recall_at_k(&retrieved, &labeled.relevant, k),
            precision: precision_at_k(&retrieved, &labeled.relevant, k),
            average_precision: average_precision(&retrieved, &labeled.relevant, k),
            query: labeled.query.clone(),
            retrieved,
        };
        debug!(
            query = %evaluation.query,
            recall = evaluation.recall,
            ap = evaluation.average_precision,
            "query evaluated"
        );
        runs.push((evaluation.retrieved.clone(), labeled.relevant.clone()));
        evaluations.push(evaluation);
    }

    let mean = |f: fn(&QueryEvaluation) -> f64| {
        if evaluations.is_empty() {
            0.0
        } else {
            evaluations.iter().map(f).sum::<f64>() / evaluations.len() as f64
        }
    };

    Ok(EvaluationReport {
        k,
        mean_recall: mean(|e| e.recall),
        mean_precision: mean(|e| e.precision),
        map: mean_average_precision(&runs, k),
        queries: evaluations,
    })
}
