//! Table formatting utilities for structured output.

use comfy_table::{Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::eval::EvaluationReport;
use crate::metadata::IndexMetadata;
use crate::vector::IndexHeader;

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        Self { table: base_table() }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        self.table.set_header(bold_cells(headers));
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

fn base_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table
}

fn bold_cells(headers: Vec<&str>) -> Vec<Cell> {
    headers
        .into_iter()
        .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
        .collect()
}

/// Describe a persisted index and, when present, its metadata sidecar.
pub fn create_index_info_table(header: &IndexHeader, metadata: Option<&IndexMetadata>) -> String {
    let mut table = base_table();
    table.set_header(bold_cells(vec!["Property", "Value"]));

    table.add_row(vec!["Format version".to_string(), header.version.to_string()]);
    table.add_row(vec!["Metric".to_string(), header.metric.to_string()]);
    table.add_row(vec!["Dimension".to_string(), header.dimension.to_string()]);
    table.add_row(vec!["Rows".to_string(), header.row_count.to_string()]);

    match metadata {
        Some(meta) => {
            table.add_row(vec!["Model".to_string(), meta.model_name.clone()]);
            table.add_row(vec!["Records".to_string(), meta.record_count.to_string()]);
            table.add_row(vec![
                "Built".to_string(),
                meta.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ]);
            table.add_row(vec![
                "Corpus digest".to_string(),
                meta.corpus_digest.chars().take(16).collect(),
            ]);
        }
        None => {
            table.add_row(vec![
                Cell::new("Metadata"),
                Cell::new("missing").fg(Color::Yellow),
            ]);
        }
    }

    table.to_string()
}

/// Per-query scores plus a bold mean row.
pub fn create_evaluation_table(report: &EvaluationReport) -> String {
    let k = report.k;
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("Query").add_attribute(Attribute::Bold),
        Cell::new(format!("Recall@{k}")).add_attribute(Attribute::Bold),
        Cell::new(format!("Precision@{k}")).add_attribute(Attribute::Bold),
        Cell::new(format!("AP@{k}")).add_attribute(Attribute::Bold),
    ]);

    for query in &report.queries {
        table.add_row(vec![
            query.query.clone(),
            format!("{:.4}", query.recall),
            format!("{:.4}", query.precision),
            format!("{:.4}", query.average_precision),
        ]);
    }

    table.add_row(vec![
        Cell::new("MEAN").add_attribute(Attribute::Bold),
        Cell::new(format!("{:.4}", report.mean_recall)).add_attribute(Attribute::Bold),
        Cell::new(format!("{:.4}", report.mean_precision)).add_attribute(Attribute::Bold),
        Cell::new(format!("{:.4}", report.map)).add_attribute(Attribute::Bold),
    ]);

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::QueryEvaluation;
    use crate::vector::{Metric, VectorDimension};

    #[test]
    fn test_table_builder() {
        let table = TableBuilder::new()
            .set_headers(vec!["Column 1", "Column 2"])
            .add_row(vec!["Value 1".to_string(), "Value 2".to_string()])
            .build();

        assert!(table.contains("Column 1"));
        assert!(table.contains("Value 1"));
    }

    #[test]
    fn test_index_info_without_metadata() {
        let header = IndexHeader {
            version: 1,
            metric: Metric::L2,
            dimension: VectorDimension::new(384).unwrap(),
            row_count: 377,
        };
        let table = create_index_info_table(&header, None);
        assert!(table.contains("377"));
        assert!(table.contains("missing"));
    }

    #[test]
    fn test_evaluation_table_has_mean_row() {
        let report = EvaluationReport {
            k: 3,
            queries: vec![QueryEvaluation {
                query: "java developer".into(),
                retrieved: vec![],
                recall: 0.5,
                precision: 0.25,
                average_precision: 0.4,
            }],
            mean_recall: 0.5,
            mean_precision: 0.25,
            map: 0.4,
        };
        let table = create_evaluation_table(&report);
        assert!(table.contains("Recall@3"));
        assert!(table.contains("MEAN"));
        assert!(table.contains("0.2500"));
    }
}
