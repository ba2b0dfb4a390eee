use screener_core::ScreenError;
use std::env;
use std::path::PathBuf;

/// Run configuration, read once at startup. Everything is optional with
/// working defaults except where an explicit request makes a missing
/// credential fatal (handled by the binary).
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// Results CSV path.
    pub output_file: PathBuf,
    /// Watchlist CSV path.
    pub watchlist_file: PathBuf,
    /// Newline-delimited input tickers file.
    pub tickers_file: PathBuf,
    /// Headlines fetched (and retained) per ticker.
    pub headlines_per_ticker: usize,
    /// Target size for LLM-curated or default watchlists.
    pub watchlist_size: usize,
    /// Enables the LLM scorer and LLM watchlist curation.
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub slack_webhook_url: Option<String>,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("screening_results.csv"),
            watchlist_file: PathBuf::from("watchlist.csv"),
            tickers_file: PathBuf::from("tickers.txt"),
            headlines_per_ticker: 3,
            watchlist_size: 20,
            openai_api_key: None,
            openai_model: None,
            slack_webhook_url: None,
        }
    }
}

impl ScreenConfig {
    pub fn from_env() -> Result<Self, ScreenError> {
        let defaults = Self::default();

        Ok(Self {
            output_file: path_var("SCREENING_OUTPUT_FILE", defaults.output_file),
            watchlist_file: path_var("WATCHLIST_FILE", defaults.watchlist_file),
            tickers_file: path_var("TICKERS_FILE", defaults.tickers_file),
            headlines_per_ticker: usize_var("HEADLINES_PER_TICKER", defaults.headlines_per_ticker)?,
            watchlist_size: usize_var("WATCHLIST_SIZE", defaults.watchlist_size)?,
            openai_api_key: string_var("OPENAI_API_KEY"),
            openai_model: string_var("OPENAI_MODEL"),
            slack_webhook_url: string_var("SLACK_WEBHOOK_URL"),
        })
    }
}

fn string_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn path_var(key: &str, default: PathBuf) -> PathBuf {
    string_var(key).map(PathBuf::from).unwrap_or(default)
}

fn usize_var(key: &str, default: usize) -> Result<usize, ScreenError> {
    match string_var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ScreenError::Config(format!("{} is not a number: {}", key, raw))),
        None => Ok(default),
    }
}
