use openai_client::OpenAiClient;
use screener_core::ScreenError;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// Built-in fallback universe: large, liquid names across sectors.
pub const DEFAULT_WATCHLIST: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "AVGO", "TSLA", "AMD", "CRM",
    "JPM", "V", "MA", "BAC", "GS",
    "JNJ", "UNH", "LLY", "ABBV", "MRK",
    "XOM", "CVX", "COP",
    "HD", "MCD", "NKE", "COST", "WMT",
    "CAT", "HON", "GE", "UNP",
    "NEE", "LIN", "PG", "KO", "PEP",
    "NFLX", "DIS", "TMUS",
];

const CURATE_SYSTEM: &str = "You curate a daily equity screening watchlist. \
Return liquid US-listed symbols only, no ETFs, no duplicates.";

/// Resolves the run's ticker universe: LLM curation when available, then
/// the local tickers file, then the built-in default list.
///
/// LLM failures never propagate; they log and fall through.
pub struct WatchlistSource {
    llm: Option<Arc<OpenAiClient>>,
    tickers_file: PathBuf,
    size: usize,
}

impl WatchlistSource {
    pub fn new(llm: Option<Arc<OpenAiClient>>, tickers_file: PathBuf, size: usize) -> Self {
        Self {
            llm,
            tickers_file,
            size,
        }
    }

    pub async fn resolve(&self) -> Vec<String> {
        if let Some(client) = &self.llm {
            match curate_with_llm(client, self.size).await {
                Ok(tickers) if !tickers.is_empty() => {
                    tracing::info!("Watchlist: {} tickers curated by LLM", tickers.len());
                    return tickers;
                }
                Ok(_) => {
                    tracing::warn!("Watchlist: LLM returned an empty list, falling back");
                }
                Err(e) => {
                    tracing::warn!("Watchlist: LLM curation failed ({}), falling back", e);
                }
            }
        }

        match std::fs::read_to_string(&self.tickers_file) {
            Ok(content) => {
                let tickers = parse_tickers_file(&content);
                if !tickers.is_empty() {
                    tracing::info!(
                        "Watchlist: {} tickers from {}",
                        tickers.len(),
                        self.tickers_file.display()
                    );
                    return tickers;
                }
                tracing::warn!(
                    "Watchlist: {} has no usable tickers, using default list",
                    self.tickers_file.display()
                );
            }
            Err(e) => {
                tracing::debug!(
                    "Watchlist: cannot read {} ({}), using default list",
                    self.tickers_file.display(),
                    e
                );
            }
        }

        DEFAULT_WATCHLIST
            .iter()
            .take(self.size)
            .map(|s| s.to_string())
            .collect()
    }
}

/// Ask the LLM for `n` uppercase symbols as a strict JSON string array.
async fn curate_with_llm(client: &OpenAiClient, n: usize) -> Result<Vec<String>, ScreenError> {
    let schema = json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["tickers"],
        "properties": {
            "tickers": {
                "type": "array",
                "items": {"type": "string"}
            }
        }
    });

    let user = format!(
        "Curate a watchlist of exactly {} US equity tickers worth screening today. \
         Uppercase symbols only.",
        n
    );

    let value = client
        .chat_json(CURATE_SYSTEM, &user, "curated_watchlist", schema)
        .await?;

    let tickers = value
        .get("tickers")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ScreenError::SchemaViolation("tickers is not an array".to_string()))?;

    let mut out = Vec::with_capacity(tickers.len());
    for entry in tickers {
        let symbol = entry
            .as_str()
            .ok_or_else(|| ScreenError::SchemaViolation("ticker is not a string".to_string()))?;
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() {
            out.push(symbol);
        }
    }
    out.truncate(n);
    Ok(out)
}

/// Parse a newline-delimited tickers file: blanks and `#` comments are
/// ignored, symbols uppercased.
pub fn parse_tickers_file(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_uppercase())
        .collect()
}
