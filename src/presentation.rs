//! Display projection of retrieved records.

use serde::{Deserialize, Serialize};

use crate::corpus::Record;
use crate::display::tables::TableBuilder;

/// One ranked result as shown to API and CLI consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultView {
    #[serde(rename = "Assessment Name")]
    pub assessment_name: String,

    #[serde(rename = "URL")]
    pub url: String,

    #[serde(rename = "Remote Testing")]
    pub remote_testing: String,

    #[serde(rename = "Adaptive Support")]
    pub adaptive_support: String,

    #[serde(rename = "Duration")]
    pub duration: String,

    #[serde(rename = "Test Types")]
    pub test_types: String,

    /// Corpus position the index returned
    pub position: usize,

    /// Raw metric value (similarity for inner product, distance for L2)
    pub score: f32,
}

impl ResultView {
    /// Project a record into its display shape.
    pub fn from_record(record: &Record, position: usize, score: f32) -> Self {
        Self {
            assessment_name: record.title.clone(),
            url: record.url.clone(),
            remote_testing: yes_no(record.remote_testing).to_string(),
            adaptive_support: yes_no(record.adaptive_supported).to_string(),
            duration: format_duration(record.duration_minutes),
            test_types: record.test_types_full.join(", "),
            position,
            score,
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn format_duration(minutes: Option<u32>) -> String {
    match minutes {
        Some(m) => format!("{m} minutes"),
        None => "No Information".to_string(),
    }
}

/// Render results as a terminal table, best match first.
pub fn results_table(results: &[ResultView]) -> String {
    results
        .iter()
        .enumerate()
        .fold(
            TableBuilder::new().set_headers(vec![
                "#",
                "Assessment",
                "Remote",
                "Adaptive",
                "Duration",
                "Test Types",
                "Score",
            ]),
            |table, (rank, view)| {
                table.add_row(vec![
                    (rank + 1).to_string(),
                    format!("{}\n{}", view.assessment_name, view.url),
                    view.remote_testing.clone(),
                    view.adaptive_support.clone(),
                    view.duration.clone(),
                    view.test_types.clone(),
                    format!("{:.4}", view.score),
                ])
            },
        )
        .build()
}
