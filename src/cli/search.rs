use anyhow::Result;
use console::{style, Emoji};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::search::{
    create_embedder, reciprocal_rank_fusion, Embedder, HybridRetriever, JsonStore, VectorStore,
};

static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "");
static FILE: Emoji<'_, '_> = Emoji("📄 ", "");

pub async fn run_search(
    config: AppConfig,
    query: &str,
    limit: usize,
    dense_only: bool,
) -> Result<()> {
    if !config.paths.index_path.exists() {
        anyhow::bail!("No index found. Run `skinlens index` first to build it.");
    }

    let store: Arc<dyn VectorStore> = Arc::new(JsonStore::new(config.paths.index_path.clone()));
    store.load().await?;

    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedding));
    let retriever = HybridRetriever::new(Arc::clone(&store), embedder, limit);

    let outcome = retriever.retrieve(query).await?;
    let lexical = if dense_only { &[] } else { outcome.lexical.as_slice() };
    let fused = reciprocal_rank_fusion(&outcome.dense, lexical, config.retrieval.rrf_k, limit);

    if fused.is_empty() {
        println!("No results found for: {}", style(query).italic());
        return Ok(());
    }

    if outcome.lexical_degraded && !dense_only {
        println!(
            "{}",
            style("(lexical index unavailable, dense-only results)").yellow()
        );
    }

    println!(
        "\n{}Found {} results for: {}\n",
        SEARCH,
        style(fused.len()).cyan(),
        style(query).yellow().bold()
    );

    for (i, hit) in fused.iter().enumerate() {
        println!(
            "{} {}. {} {}",
            FILE,
            style(i + 1).dim(),
            style(&hit.chunk.source_name).green(),
            style(format!("(chunk {})", hit.chunk.seq)).dim()
        );
        println!(
            "   RRF: {} | dense: {} | lexical: {}",
            style(format!("{:.5}", hit.rrf_score)).cyan(),
            hit.dense_score
                .map(|s| format!("{s:.3}"))
                .unwrap_or_else(|| "-".to_string()),
            hit.lexical_score
                .map(|s| format!("{s:.3}"))
                .unwrap_or_else(|| "-".to_string()),
        );

        let preview: String = hit.chunk.text.chars().take(200).collect();
        println!("   {}\n", style(preview).dim());
    }

    Ok(())
}
