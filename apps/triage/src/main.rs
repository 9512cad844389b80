mod config;
mod errors;
mod llm_client;
mod models;
mod source;
mod storage;
mod triage;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::models::firm::FirmProfile;
use crate::source::{PartnerApiClient, SolicitationSource};
use crate::storage::JsonDirectorySink;
use crate::triage::evaluator::LlmSemanticEvaluator;
use crate::triage::pipeline::{log_summary_table, TriagePipeline};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting triage v{}", env!("CARGO_PKG_VERSION"));

    // Firm profile is a precondition for the whole run
    let firm = FirmProfile::load(&config.firm_profile_path)
        .await
        .map_err(|e| {
            if e.is_fatal() {
                error!("Cannot start triage run: {e}");
            }
            e
        })?;
    info!(
        "Firm profile loaded from {} ({} NAICS codes)",
        config.firm_profile_path.display(),
        firm.naics_codes().len()
    );

    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let evaluator = LlmSemanticEvaluator::new(llm);

    let sink = JsonDirectorySink::create(&config.output_dir).await?;

    let source = PartnerApiClient::new(config.api_url.clone(), config.source_timeout_secs)?;
    let records = source.fetch().await?;
    if records.is_empty() {
        info!("No solicitations found from API.");
        return Ok(());
    }

    let pipeline = TriagePipeline::new(&firm, &evaluator, &sink);
    let summary = pipeline.run_batch(&records).await?;

    log_summary_table(&summary);
    info!("Reports saved to: {}", config.output_dir.display());

    Ok(())
}
