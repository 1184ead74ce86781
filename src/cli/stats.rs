use anyhow::Result;
use console::Emoji;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::search::{JsonStore, VectorStore};

static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "");

pub async fn run_stats(config: AppConfig) -> Result<()> {
    if !config.paths.index_path.exists() {
        anyhow::bail!("No index found. Run `skinlens index` first to build it.");
    }

    let store: Arc<dyn VectorStore> = Arc::new(JsonStore::new(config.paths.index_path.clone()));
    store.load().await?;
    let stats = store.stats().await?;

    println!("{}Index statistics:", INFO);
    println!("  Sources:     {}", stats.total_sources);
    println!("  Chunks:      {}", stats.total_chunks);
    println!("  Index size:  {} KB", stats.index_size_bytes / 1024);
    if let Some(built) = stats.last_built {
        println!("  Built:       {}", built.format("%Y-%m-%d %H:%M:%S"));
    }

    Ok(())
}
