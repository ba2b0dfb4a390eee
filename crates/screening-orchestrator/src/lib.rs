pub mod config;

pub use config::ScreenConfig;

use chrono::{Duration, NaiveDate, Utc};
use object_store::ObjectStore;
use report::{assemble_row, sort_rows, write_results_csv, write_watchlist_csv};
use screener_core::{MarketDataProvider, ReportRow, ScoreCard, Scorer, ScreenError};
use slack_notifier::SlackNotifier;
use std::path::PathBuf;
use std::sync::Arc;
use watchlist::WatchlistSource;

/// Calendar days of history requested per ticker; enough for the 200-day
/// average and the 52-week window across weekends and holidays.
const HISTORY_DAYS: i64 = 420;

/// Per-ticker lifecycle. `Skipped` is terminal and reachable from
/// `Fetching` or `Scoring`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerPhase {
    Queued,
    Fetching,
    Scoring,
    Assembled,
    Emitted,
    Skipped,
}

impl std::fmt::Display for TickerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TickerPhase::Queued => "queued",
            TickerPhase::Fetching => "fetching",
            TickerPhase::Scoring => "scoring",
            TickerPhase::Assembled => "assembled",
            TickerPhase::Emitted => "emitted",
            TickerPhase::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub screening_date: NaiveDate,
    pub requested: usize,
    pub emitted: usize,
    pub skipped: usize,
    pub output_file: PathBuf,
    pub watchlist_file: PathBuf,
}

/// Top-level driver: resolves the watchlist, screens each ticker in
/// sequence with per-ticker isolation, then fans the sorted rows out to
/// the configured sinks.
///
/// All collaborators are constructed explicitly and injected; an absent
/// sink capability means that sink is a no-op.
pub struct ScreeningOrchestrator {
    config: ScreenConfig,
    provider: Arc<dyn MarketDataProvider>,
    scorer: Box<dyn Scorer>,
    watchlist: WatchlistSource,
    store: Option<ObjectStore>,
    notifier: Option<SlackNotifier>,
}

impl ScreeningOrchestrator {
    pub fn new(
        config: ScreenConfig,
        provider: Arc<dyn MarketDataProvider>,
        scorer: Box<dyn Scorer>,
        watchlist: WatchlistSource,
    ) -> Self {
        Self {
            config,
            provider,
            scorer,
            watchlist,
            store: None,
            notifier: None,
        }
    }

    pub fn with_object_store(mut self, store: Option<ObjectStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_notifier(mut self, notifier: Option<SlackNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Run one screening batch. `tickers_override` bypasses watchlist
    /// resolution (the `--symbols` path).
    ///
    /// Fails only on fatal configuration problems or when zero tickers
    /// survive; sink failures after the CSV is on disk are logged.
    pub async fn run(
        &self,
        tickers_override: Option<Vec<String>>,
    ) -> Result<RunSummary, ScreenError> {
        let today = Utc::now().date_naive();

        let tickers = match tickers_override {
            Some(t) if !t.is_empty() => t,
            _ => self.watchlist.resolve().await,
        };
        if tickers.is_empty() {
            return Err(ScreenError::Config(
                "No tickers resolvable from any source".to_string(),
            ));
        }

        tracing::info!(
            "Screening {} tickers with the {} scorer",
            tickers.len(),
            self.scorer.name()
        );

        let mut rows: Vec<ReportRow> = Vec::with_capacity(tickers.len());
        let mut skipped = 0usize;

        for ticker in &tickers {
            tracing::debug!("{}: {}", ticker, TickerPhase::Queued);
            match self.screen_ticker(ticker, today).await {
                Ok(row) => {
                    tracing::info!(
                        "{}: {} (upside {})",
                        ticker,
                        TickerPhase::Emitted,
                        row.upside_score
                    );
                    rows.push(row);
                }
                Err((phase, e)) if !e.is_fatal() => {
                    tracing::warn!(
                        ticker = %ticker,
                        failed_during = %phase,
                        "{}: {} ({})",
                        ticker,
                        TickerPhase::Skipped,
                        e
                    );
                    skipped += 1;
                }
                Err((_, e)) => return Err(e),
            }
        }

        if rows.is_empty() {
            return Err(ScreenError::ProviderEmpty(format!(
                "All {} tickers failed; nothing to report",
                tickers.len()
            )));
        }

        sort_rows(&mut rows);

        write_results_csv(&self.config.output_file, &rows)?;
        write_watchlist_csv(&self.config.watchlist_file, &rows)?;

        self.flush_remote_sinks(&rows, today).await;

        Ok(RunSummary {
            screening_date: today,
            requested: tickers.len(),
            emitted: rows.len(),
            skipped,
            output_file: self.config.output_file.clone(),
            watchlist_file: self.config.watchlist_file.clone(),
        })
    }

    /// One ticker through the pipeline:
    /// fetch -> extract -> indicators -> headlines -> score -> assemble.
    async fn screen_ticker(
        &self,
        ticker: &str,
        today: NaiveDate,
    ) -> Result<ReportRow, (TickerPhase, ScreenError)> {
        let fetching = |e| (TickerPhase::Fetching, e);
        let scoring = |e| (TickerPhase::Scoring, e);

        tracing::debug!("{}: {}", ticker, TickerPhase::Fetching);
        let start = today - Duration::days(HISTORY_DAYS);
        let end = today + Duration::days(1);

        let bars = self
            .provider
            .daily_history(ticker, start, end)
            .await
            .map_err(fetching)?;
        if bars.is_empty() {
            return Err(fetching(ScreenError::ProviderEmpty(
                "no price history".to_string(),
            )));
        }

        let info = self.provider.company_info(ticker).await.map_err(fetching)?;

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let last_close = closes.last().copied();

        let fundamentals = fundamentals::extract(ticker, &info, last_close, &bars, today);
        let indicators = indicator_engine::compute(&closes);

        // Headline failures degrade to an empty list, never a skip
        let headlines = match self
            .provider
            .headlines(ticker, self.config.headlines_per_ticker)
            .await
        {
            Ok(h) => h,
            Err(e) => {
                tracing::debug!("{}: headlines unavailable ({}), continuing", ticker, e);
                Vec::new()
            }
        };

        tracing::debug!("{}: {}", ticker, TickerPhase::Scoring);
        let card: ScoreCard = self
            .scorer
            .score(&fundamentals, &indicators, &headlines)
            .await
            .map_err(scoring)?;

        tracing::debug!("{}: {}", ticker, TickerPhase::Assembled);
        Ok(assemble_row(card, &fundamentals, &indicators, &headlines, today))
    }

    /// Best-effort fan-out after the CSVs are on disk: failures are
    /// logged and never fail the run.
    async fn flush_remote_sinks(&self, rows: &[ReportRow], today: NaiveDate) {
        if let Some(store) = &self.store {
            let uploads = [
                (&self.config.output_file, store.dated_key("screening_results", today)),
                (&self.config.watchlist_file, store.dated_key("watchlist", today)),
            ];
            for (local, key) in uploads {
                if let Err(e) = store.upload_file(local, &key).await {
                    tracing::warn!("Object store upload failed: {}", e);
                }
            }
        } else {
            tracing::debug!("Object store not configured, skipping upload");
        }

        if let Some(notifier) = &self.notifier {
            let date = today.format("%Y-%m-%d").to_string();
            if let Err(e) = notifier.send_desk_report(rows, &date).await {
                tracing::warn!("Desk report via {} failed: {}", notifier.name(), e);
            }
        } else {
            tracing::debug!("Chat webhook not configured, skipping desk report");
        }
    }
}
