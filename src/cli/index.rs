use anyhow::Result;
use console::{style, Emoji};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::ingest::DocumentLoader;
use crate::search::{create_embedder, Chunker, Embedder, IndexBuilder, JsonStore, VectorStore};

static INDEXING: Emoji<'_, '_> = Emoji("📊 ", "");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "");
static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "");

pub async fn run_index(config: AppConfig, data_dir: Option<PathBuf>) -> Result<()> {
    let data_dir = data_dir.unwrap_or_else(|| config.paths.data_dir.clone());

    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedding));

    println!("{}Checking embedding server...", INFO);
    embedder.health_check().await?;

    let store: Arc<dyn VectorStore> = Arc::new(JsonStore::new(config.paths.index_path.clone()));
    let builder = IndexBuilder::new(
        Arc::clone(&store),
        Arc::clone(&embedder),
        Chunker::from_config(&config.chunking),
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(format!("{}Indexing {}...", INDEXING, data_dir.display()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let report = builder.build(&DocumentLoader::new(&data_dir)).await?;

    pb.finish_and_clear();

    println!("\n{}Index built!\n", SUCCESS);
    println!(
        "  Documents loaded: {}",
        style(report.documents_loaded).green()
    );
    println!("  Chunks indexed:   {}", style(report.chunks_created).cyan());

    let stats = store.stats().await?;
    println!("\n{}Index statistics:", INFO);
    println!("  Sources:     {}", stats.total_sources);
    println!("  Chunks:      {}", stats.total_chunks);
    println!("  Index size:  {} KB", stats.index_size_bytes / 1024);
    if let Some(built) = stats.last_built {
        println!("  Built:       {}", built.format("%Y-%m-%d %H:%M:%S"));
    }

    Ok(())
}
