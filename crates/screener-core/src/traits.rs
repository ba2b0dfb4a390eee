use crate::{DailyBar, FundamentalsRecord, Headline, IndicatorSnapshot, InfoRecord, ScoreCard, ScreenError};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Trait for market data providers: daily history, company info and news.
///
/// Implementations must return empty data (not errors) when the provider
/// has nothing for a ticker; errors mean transport-level failure.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, ScreenError>;

    async fn company_info(&self, ticker: &str) -> Result<InfoRecord, ScreenError>;

    async fn headlines(&self, ticker: &str, limit: usize) -> Result<Vec<Headline>, ScreenError>;
}

/// Trait for scorer backends. Both backends return the same card shape.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(
        &self,
        fundamentals: &FundamentalsRecord,
        indicators: &IndicatorSnapshot,
        headlines: &[Headline],
    ) -> Result<ScoreCard, ScreenError>;

    fn name(&self) -> &str;
}
