mod store;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docsearch_core::artifact::{export_js, import_js};
use docsearch_core::persist::{load_index, save_index, IndexPaths};
use docsearch_core::{EngineConfig, IndexBuilder, InvertedIndex, QueryEngine, Tokenizer};
use docsearch_core::DocumentStore;
use std::path::{Path, PathBuf};
use store::JsonFileStore;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query documentation search indexes", long_about = None)]
struct Cli {
    /// JSON engine config (tokenizer and scoring settings)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Also write searchindex.js into the output directory
        #[arg(long, default_value_t = false)]
        js: bool,
    },
    /// Run one query against a built index and print ranked hits
    Search {
        /// Index directory, or a searchindex.js file
        #[arg(long, default_value = "./index")]
        index: String,
        /// Query text
        #[arg(long)]
        q: String,
        /// Maximum hits to print
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Build { input, output, js } => build_index(&config, &input, &output, js),
        Commands::Search { index, q, k } => search_index(&config, &index, &q, k),
    }
}

fn build_index(config: &EngineConfig, input: &str, output: &str, js: bool) -> Result<()> {
    let store = JsonFileStore::new(input);
    let docs = store.load_documents()?;
    let builder = IndexBuilder::new(Tokenizer::new(config.tokenizer.clone()));
    let index = builder.build(docs).context("index build failed")?;

    let out_paths = IndexPaths::new(output);
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    save_index(&out_paths, &index, &created_at)?;
    if js {
        export_js(&out_paths.searchindex_js(), &index)?;
    }

    tracing::info!(output, num_docs = index.num_docs(), "index build complete");
    Ok(())
}

fn open_index(config: &EngineConfig, location: &str) -> Result<InvertedIndex> {
    let path = Path::new(location);
    if path.extension().and_then(|s| s.to_str()) == Some("js") {
        // the artifact carries no tokenizer settings; use the configured ones
        return Ok(import_js(path, Tokenizer::new(config.tokenizer.clone()))?);
    }
    load_index(&IndexPaths::new(path)).with_context(|| format!("loading index {location}"))
}

fn search_index(config: &EngineConfig, location: &str, q: &str, k: usize) -> Result<()> {
    let index = open_index(config, location)?;
    let engine = QueryEngine::new(config.scoring);
    let ranked = engine.search(&index, q);
    let total = ranked.len();
    for hit in engine.resolve(&index, &ranked[..total.min(k)]) {
        println!("{:>4}  {}  {}", hit.score, hit.path, hit.title);
    }
    println!("{total} hit(s)");
    Ok(())
}
