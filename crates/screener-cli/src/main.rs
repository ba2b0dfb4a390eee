//! screener: batch ticker screening from quotes to desk report.
//!
//! One invocation runs the whole pipeline: resolve the watchlist, screen
//! each ticker, write the CSVs, then upload and notify where configured.
//!
//! Usage:
//!   screener                        # heuristic scorer unless OPENAI_API_KEY is set
//!   screener --use-llm              # fail fast when no key is configured
//!   screener --heuristic            # force the deterministic scorer
//!   screener --symbols AAPL MSFT    # bypass watchlist resolution

use anyhow::{bail, Result};
use object_store::ObjectStore;
use openai_client::OpenAiClient;
use quote_client::QuoteClient;
use screener_core::Scorer;
use scoring::{HeuristicScorer, LlmScorer};
use screening_orchestrator::{ScreenConfig, ScreeningOrchestrator};
use slack_notifier::SlackNotifier;
use std::sync::Arc;
use watchlist::WatchlistSource;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,quote_client=warn".into())
    };
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(env_filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter()).init();
    }

    let args: Vec<String> = std::env::args().collect();
    let use_llm = args.iter().any(|a| a == "--use-llm");
    let force_heuristic = args.iter().any(|a| a == "--heuristic");

    let symbols: Option<Vec<String>> = args.iter().position(|a| a == "--symbols").map(|idx| {
        args[idx + 1..]
            .iter()
            .take_while(|a| !a.starts_with("--"))
            .map(|s| s.to_uppercase())
            .collect()
    });

    let config = ScreenConfig::from_env()?;

    if use_llm && config.openai_api_key.is_none() {
        bail!("--use-llm requires OPENAI_API_KEY");
    }

    let llm = match (&config.openai_api_key, force_heuristic) {
        (Some(key), false) => Some(Arc::new(OpenAiClient::new(
            key.clone(),
            config.openai_model.clone(),
        ))),
        _ => None,
    };

    let scorer: Box<dyn Scorer> = match &llm {
        Some(client) => {
            tracing::info!("Scorer: LLM ({})", client.model());
            Box::new(LlmScorer::new(client.clone()))
        }
        None => {
            tracing::info!("Scorer: heuristic (no LLM configured)");
            Box::new(HeuristicScorer::new())
        }
    };

    let watchlist = WatchlistSource::new(
        llm.clone(),
        config.tickers_file.clone(),
        config.watchlist_size,
    );

    let store = ObjectStore::from_env().await;
    let notifier = config
        .slack_webhook_url
        .clone()
        .map(SlackNotifier::new);

    let orchestrator = ScreeningOrchestrator::new(
        config,
        Arc::new(QuoteClient::new()),
        scorer,
        watchlist,
    )
    .with_object_store(store)
    .with_notifier(notifier);

    let summary = orchestrator.run(symbols).await?;

    tracing::info!(
        "Screen complete: {}/{} tickers emitted ({} skipped), results in {}",
        summary.emitted,
        summary.requested,
        summary.skipped,
        summary.output_file.display()
    );
    Ok(())
}
