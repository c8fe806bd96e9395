//! Offline entry point: embed the corpus and write the index artifacts.

use std::path::PathBuf;

use anyhow::Context;
use assessment_search::display::{THEME, create_index_info_table, with_spinner};
use assessment_search::io::{ExitCode, JsonResponse};
use assessment_search::metadata::{IndexMetadata, METADATA_FILE};
use assessment_search::vector::FastEmbedGenerator;
use assessment_search::{Corpus, Metric, RecommendError, Settings, VectorIndex, build_index, logging};
use clap::{Parser, Subcommand};
use serde::Serialize;

/// Build and inspect assessment search indexes
#[derive(Parser)]
#[command(name = "assess-index", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed every record and write index.bin and metadata.json
    Build {
        /// Corpus JSON file (overrides corpus_path)
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Output directory (overrides index_dir)
        #[arg(long)]
        out: Option<PathBuf>,

        /// inner_product or l2 (overrides search.metric)
        #[arg(long)]
        metric: Option<Metric>,

        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },

    /// Show the header and metadata of a built index
    Info {
        /// Index directory (defaults to index_dir)
        dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct IndexInfo {
    version: u32,
    metric: Metric,
    dimension: usize,
    rows: usize,
    metadata: Option<IndexMetadata>,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::Success.into(),
        Err(error) => {
            let code = match error.downcast_ref::<RecommendError>() {
                Some(e) => {
                    eprintln!("{}", THEME.error_with_icon(&e.to_string()));
                    for suggestion in e.recovery_suggestions() {
                        eprintln!("  - {suggestion}");
                    }
                    ExitCode::from_error(e)
                }
                None => {
                    eprintln!("{}", THEME.error_with_icon(&format!("{error:#}")));
                    ExitCode::GeneralError
                }
            };
            code.into()
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| RecommendError::ConfigError {
        reason: e.to_string(),
    })?;
    logging::init(cli.verbose || settings.debug);

    match cli.command {
        Commands::Build {
            corpus,
            out,
            metric,
            quiet,
        } => {
            if let Some(corpus) = corpus {
                settings.corpus_path = corpus;
            }
            if let Some(out) = out {
                settings.index_dir = out;
            }
            if let Some(metric) = metric {
                settings.search.metric = metric;
            }

            let corpus = Corpus::load(&settings.corpus_path)?;
            let generator = with_spinner("Loading embedding model...", || {
                FastEmbedGenerator::new(&settings.embedding)
            })
            .map_err(|e| {
                RecommendError::load("embedding model", settings.embedding.cache_dir(), e)
            })?;

            let report = build_index(&settings, &generator, &corpus, !quiet)?;

            println!(
                "{}",
                THEME.success_with_icon(&format!(
                    "Indexed {} records ({} dimensions, {}) in {:.1}s",
                    report.records,
                    report.dimension,
                    report.metric,
                    report.elapsed.as_secs_f64()
                ))
            );
            println!("  index:    {}", THEME.apply(&THEME.path, report.index_path.display()));
            println!(
                "  metadata: {}",
                THEME.apply(&THEME.path, report.metadata_path.display())
            );
            Ok(())
        }

        Commands::Info { dir, json } => {
            let dir = dir.unwrap_or_else(|| settings.index_dir.clone());
            let index_path = dir.join("index.bin");
            let header = VectorIndex::read_header(&index_path)
                .map_err(|e| RecommendError::load("index", &index_path, e))?;

            let metadata_path = dir.join(METADATA_FILE);
            let metadata = if metadata_path.exists() {
                Some(IndexMetadata::load(&metadata_path)?)
            } else {
                None
            };

            if json {
                let info = IndexInfo {
                    version: header.version,
                    metric: header.metric,
                    dimension: header.dimension.get(),
                    rows: header.row_count,
                    metadata,
                };
                let output = serde_json::to_string_pretty(&JsonResponse::success(info))
                    .context("could not serialize index info")?;
                println!("{output}");
            } else {
                println!("{}", THEME.apply(&THEME.header, index_path.display()));
                println!("{}", create_index_info_table(&header, metadata.as_ref()));
            }
            Ok(())
        }
    }
}
