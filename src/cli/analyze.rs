use anyhow::{Context, Result};
use console::{style, Emoji};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{ChatModel, OpenAiChat};
use crate::search::{create_embedder, Embedder, JsonStore, VectorStore};
use crate::service::AnalysisService;
use crate::types::{AnalysisRequest, CoachingReport, ReportCategory};
use crate::upload::{HttpImageHost, ImageHost};

static CAMERA: Emoji<'_, '_> = Emoji("📷 ", "");
static ERROR: Emoji<'_, '_> = Emoji("❌ ", "");
static BOOK: Emoji<'_, '_> = Emoji("📚 ", "");

pub async fn run_analyze(config: AppConfig, image: &Path, state: &str, json: bool) -> Result<()> {
    let image_bytes = fs::read(image)
        .with_context(|| format!("cannot read image file {}", image.display()))?;

    let store: Arc<dyn VectorStore> = Arc::new(JsonStore::new(config.paths.index_path.clone()));
    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedding));
    let model: Arc<dyn ChatModel> = Arc::new(OpenAiChat::from_env(
        &config.generation.endpoint,
        &config.generation.model,
        config.generation.temperature,
    )?);
    let image_host: Arc<dyn ImageHost> = Arc::new(HttpImageHost::new(&config.upload.endpoint));

    let service = AnalysisService::open(config, store, embedder, model, image_host).await?;

    println!("{}Analyzing {}...", CAMERA, style(image.display()).bold());

    let request = AnalysisRequest {
        image: image_bytes,
        user_state: state.to_string(),
    };
    let response = service.analyze(&request).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if response.status == "error" {
        println!(
            "\n{}{}",
            ERROR,
            style(response.error.as_deref().unwrap_or("unknown error")).red()
        );
        std::process::exit(1);
    }

    match CoachingReport::from_analysis(&response.analysis) {
        Some(report) => {
            print_category("Skin condition", &report.skin_condition);
            print_category("Lifestyle factors", &report.lifestyle_factors);
            print_category("Care routine", &report.care_routine);
        }
        None => {
            // Degraded or off-schema output: show it as-is
            println!("\n{}", serde_json::to_string_pretty(&response.analysis)?);
        }
    }

    if let Some(references) = &response.references {
        if !references.is_empty() {
            println!("\n{}References: {}", BOOK, style(references.join(", ")).dim());
        }
    }

    Ok(())
}

fn print_category(title: &str, category: &ReportCategory) {
    println!("\n{}", style(title).bold().underlined());
    println!("  {}", category.summary);
    for tip in &category.tips {
        println!("  {} {}", style("•").cyan(), tip);
    }
}
