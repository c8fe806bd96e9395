//! Online entry point: serve, query, and evaluate a prebuilt index.
//!
//! The index itself is produced by the separate `assess-index` binary; this
//! one only loads it, so startup never pays for corpus embedding.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use assessment_search::display::{THEME, create_evaluation_table, with_spinner};
use assessment_search::eval::load_labeled_queries;
use assessment_search::io::{ExitCode, JsonResponse, OutputFormat};
use assessment_search::presentation::results_table;
use assessment_search::{
    Engine, RecommendError, RecommendService, Settings, evaluate, logging,
};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Assessment recommendation service
#[derive(Parser)]
#[command(
    name = "assess",
    version = env!("CARGO_PKG_VERSION"),
    about = "Recommend assessments for a free-text job description",
    long_about = "Load a prebuilt index and answer queries over HTTP or from the command line.\nBuild the index first with 'assess-index build'.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
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
    /// Start the HTTP API
    #[cfg(feature = "http-server")]
    #[command(about = "Serve POST /recommend over HTTP")]
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Run one query and print the ranked results
    #[command(
        about = "Recommend assessments for a query",
        after_help = "Examples:\n  assess query \"Java developer who collaborates with business teams\"\n  assess query \"numerical reasoning\" -k 5 --json"
    )]
    Query {
        /// Free-text query
        text: String,

        /// Number of results (defaults to search.default_results)
        #[arg(short)]
        k: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score the index against labeled queries
    #[command(about = "Compute Recall@k, Precision@k and MAP@k")]
    Eval {
        /// JSON file: [{"query": "...", "relevant": ["url", ...]}, ...]
        file: PathBuf,

        /// Cutoff rank
        #[arg(short, default_value_t = 3)]
        k: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// Initialize project
    #[command(about = "Create .assess/settings.toml with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

impl Commands {
    fn output_format(&self) -> OutputFormat {
        match self {
            Commands::Query { json, .. } | Commands::Eval { json, .. } => {
                OutputFormat::from_json_flag(*json)
            }
            _ => OutputFormat::Text,
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let format = cli.command.output_format();

    match run(cli).await {
        Ok(code) => code.into(),
        Err(error) => report_error(&error, format).into(),
    }
}

fn report_error(error: &anyhow::Error, format: OutputFormat) -> ExitCode {
    let Some(recommend_error) = error.downcast_ref::<RecommendError>() else {
        eprintln!("{}", THEME.error_with_icon(&format!("{error:#}")));
        return ExitCode::GeneralError;
    };

    if format.is_json() {
        let response = JsonResponse::from_error(recommend_error);
        match serde_json::to_string_pretty(&response) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("{recommend_error}"),
        }
    } else {
        eprintln!("{}", THEME.error_with_icon(&recommend_error.to_string()));
        for suggestion in recommend_error.recovery_suggestions() {
            eprintln!("  - {suggestion}");
        }
    }
    ExitCode::from_error(recommend_error)
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, RecommendError> {
    let loaded = match path {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    loaded.map_err(|e| RecommendError::ConfigError {
        reason: e.to_string(),
    })
}

fn load_service(settings: &Settings, quiet: bool) -> Result<RecommendService, RecommendError> {
    let engine = if quiet {
        Engine::load(settings)?
    } else {
        with_spinner("Loading model and index...", || Engine::load(settings))?
    };
    Ok(RecommendService::new(Arc::new(engine), &settings.search))
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if let Commands::Init { force } = cli.command {
        let path = Settings::init_config_file(force)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .context("could not create configuration")?;
        println!(
            "{}",
            THEME.success_with_icon(&format!("Created configuration file at: {}", path.display()))
        );
        println!("Edit this file to customize your settings.");
        return Ok(ExitCode::Success);
    }

    let settings = load_settings(cli.config.as_ref())?;
    logging::init(cli.verbose || settings.debug);

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
            Ok(ExitCode::Success)
        }

        #[cfg(feature = "http-server")]
        Commands::Serve { bind } => {
            let service = load_service(&settings, false)?;
            let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
            assessment_search::http::serve(
                service,
                settings.search.default_results,
                &settings.server,
                &bind,
            )
            .await
            .with_context(|| format!("HTTP server on {bind} failed"))?;
            Ok(ExitCode::Success)
        }

        Commands::Query { text, k, json } => {
            let service = load_service(&settings, json)?;
            let k = k.unwrap_or(settings.search.default_results);
            let timeout = service.timeout();
            let recommendation = service.recommend_with_timeout(text, k, timeout).await?;

            if json {
                let response = JsonResponse::success(&recommendation);
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else if recommendation.results.is_empty() {
                println!("{}", THEME.warning_with_icon("No results"));
            } else {
                println!("{}", results_table(&recommendation.results));
                println!(
                    "{} results in {:.1}ms",
                    recommendation.results.len(),
                    recommendation.latency_ms
                );
            }
            Ok(ExitCode::Success)
        }

        Commands::Eval { file, k, json } => {
            let queries = load_labeled_queries(&file)?;
            let service = load_service(&settings, json)?;
            let report = tokio::task::spawn_blocking(move || evaluate(&service, &queries, k))
                .await
                .context("evaluation task panicked")??;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&JsonResponse::success(&report))?
                );
            } else {
                println!("{}", create_evaluation_table(&report));
                println!(
                    "Mean Recall@{k}: {:.4}   MAP@{k}: {:.4}",
                    report.mean_recall, report.map
                );
            }
            Ok(ExitCode::Success)
        }
    }
}
