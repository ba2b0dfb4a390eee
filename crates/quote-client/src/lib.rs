use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use screener_core::{DailyBar, Headline, InfoRecord, MarketDataProvider, ScreenError};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const SEARCH_URL: &str = "https://query2.finance.yahoo.com";
/// Yahoo rejects requests without a browser-ish user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) deskscreen/0.1";

const INFO_MODULES: &str = "summaryProfile,financialData,defaultKeyStatistics,price";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            let wait_until = ts.front().unwrap().checked_add(self.window).unwrap();
            let sleep_dur = wait_until.duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for quote API slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// HTTP client for the quote provider: daily OHLC history, company-info
/// snapshots and recent headlines.
///
/// Provider-empty responses come back as empty data; only transport
/// failures and server errors surface as `ProviderUnavailable`.
#[derive(Clone)]
pub struct QuoteClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl QuoteClient {
    pub fn new() -> Self {
        // Conservative default; override with QUOTE_RATE_LIMIT for paid tiers.
        let rate_limit: usize = std::env::var("QUOTE_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ScreenError> {
        let request = builder
            .build()
            .map_err(|e| ScreenError::ProviderUnavailable(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| ScreenError::ProviderUnavailable("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| ScreenError::ProviderUnavailable(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = 10u64;
            tracing::warn!(
                "Quote provider 429 rate limited, waiting {}s before retry {}/3",
                wait_secs,
                attempt + 1
            );
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(ScreenError::ProviderUnavailable(
            "Rate limited by quote provider after 3 retries".to_string(),
        ))
    }

    /// Fetch bars for `[start, end)` at the given interval (e.g. `1d`).
    /// Empty vec when the provider has nothing for the ticker.
    pub async fn fetch_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Vec<DailyBar>, ScreenError> {
        let period1 = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let period2 = end.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let url = format!("{}/v8/finance/chart/{}", BASE_URL, ticker);

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("period1", period1.to_string().as_str()),
                ("period2", period2.to_string().as_str()),
                ("interval", interval),
                ("events", "div,splits"),
            ]))
            .await?;

        let status = response.status();
        if status.is_client_error() {
            // Unknown or delisted symbol: no usable data, not a failure
            tracing::debug!("Chart HTTP {} for {}, treating as empty", status, ticker);
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(ScreenError::ProviderUnavailable(format!(
                "Chart HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| ScreenError::ProviderUnavailable(e.to_string()))?;

        Ok(parse_chart(body))
    }

    /// Fetch the company-info snapshot as a flat key-value record.
    /// Possibly empty; never an error for a symbol the provider lacks.
    pub async fn company_info(&self, ticker: &str) -> Result<InfoRecord, ScreenError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", BASE_URL, ticker);

        let response = self
            .send_request(
                self.client
                    .get(&url)
                    .query(&[("modules", INFO_MODULES), ("formatted", "false")]),
            )
            .await?;

        let status = response.status();
        if status.is_client_error() {
            tracing::debug!("quoteSummary HTTP {} for {}, treating as empty", status, ticker);
            return Ok(InfoRecord::new());
        }
        if !status.is_success() {
            return Err(ScreenError::ProviderUnavailable(format!(
                "quoteSummary HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        let body: QuoteSummaryResponse = response
            .json()
            .await
            .map_err(|e| ScreenError::ProviderUnavailable(e.to_string()))?;

        Ok(flatten_info(body))
    }

    /// Fetch up to `limit` recent headlines in provider order.
    pub async fn headlines(&self, ticker: &str, limit: usize) -> Result<Vec<Headline>, ScreenError> {
        let url = format!("{}/v1/finance/search", SEARCH_URL);

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("q", ticker),
                ("quotesCount", "0"),
                ("newsCount", limit.to_string().as_str()),
            ]))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScreenError::ProviderUnavailable(format!(
                "News HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ScreenError::ProviderUnavailable(e.to_string()))?;

        Ok(body
            .news
            .into_iter()
            .take(limit)
            .map(|n| Headline {
                title: n.title,
                publisher: n.publisher,
                link: n.link,
            })
            .collect())
    }
}

impl Default for QuoteClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for QuoteClient {
    async fn daily_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, ScreenError> {
        self.fetch_history(ticker, start, end, "1d").await
    }

    async fn company_info(&self, ticker: &str) -> Result<InfoRecord, ScreenError> {
        QuoteClient::company_info(self, ticker).await
    }

    async fn headlines(&self, ticker: &str, limit: usize) -> Result<Vec<Headline>, ScreenError> {
        QuoteClient::headlines(self, ticker, limit).await
    }
}

/// Turn a chart response into clean bars, dropping half-null entries.
fn parse_chart(body: ChartResponse) -> Vec<DailyBar> {
    let result = match body.chart.result.into_iter().flatten().next() {
        Some(r) => r,
        None => return Vec::new(),
    };
    let quote = match result.indicators.quote.into_iter().next() {
        Some(q) => q,
        None => return Vec::new(),
    };

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let close = quote.close.get(i).copied().flatten();
        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let date = match DateTime::<Utc>::from_timestamp(*ts, 0) {
            Some(dt) => dt.date_naive(),
            None => continue,
        };
        // A bar without a close is unusable downstream
        let close = match close {
            Some(c) if c >= 0.0 => c,
            _ => continue,
        };
        bars.push(DailyBar {
            date,
            open: open.unwrap_or(close),
            high: high.unwrap_or(close),
            low: low.unwrap_or(close),
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0),
        });
    }
    bars
}

/// Flatten quoteSummary modules into one key-value record.
///
/// Values arriving as `{raw, fmt}` wrappers are unwrapped to their raw
/// scalar; plain scalars pass through; nested objects are dropped.
fn flatten_info(body: QuoteSummaryResponse) -> InfoRecord {
    let mut info = InfoRecord::new();
    let result = match body.quote_summary.result.into_iter().flatten().next() {
        Some(r) => r,
        None => return info,
    };

    for (_, module) in result {
        let map = match module {
            serde_json::Value::Object(map) => map,
            _ => continue,
        };
        for (key, value) in map {
            match value {
                serde_json::Value::Object(ref wrapper) => {
                    if let Some(raw) = wrapper.get("raw") {
                        info.insert(key, raw.clone());
                    }
                }
                serde_json::Value::Array(_) => {}
                other => {
                    info.insert(key, other);
                }
            }
        }
    }
    info
}

// Chart response structures
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// quoteSummary response structures
#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
}

// Search/news response structures
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    title: String,
    #[serde(default)]
    publisher: Option<String>,
    link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_chart_drops_null_closes() {
        let body: ChartResponse = serde_json::from_str(
            r#"{"chart":{"result":[{
                "timestamp":[1714521600,1714608000,1714694400],
                "indicators":{"quote":[{
                    "open":[10.0,null,12.0],
                    "high":[11.0,null,13.0],
                    "low":[9.0,null,11.0],
                    "close":[10.5,null,12.5],
                    "volume":[1000,null,2000]
                }]}
            }]}}"#,
        )
        .unwrap();

        let bars = parse_chart(body);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 10.5);
        assert_eq!(bars[1].close, 12.5);
        assert!(bars[0].date < bars[1].date);
    }

    #[test]
    fn parse_chart_empty_result() {
        let body: ChartResponse =
            serde_json::from_str(r#"{"chart":{"result":null}}"#).unwrap();
        assert!(parse_chart(body).is_empty());
    }

    #[test]
    fn flatten_info_unwraps_raw_values() {
        let body: QuoteSummaryResponse = serde_json::from_str(
            r#"{"quoteSummary":{"result":[{
                "summaryProfile":{"sector":"Technology","industry":"Semiconductors"},
                "financialData":{
                    "currentPrice":{"raw":123.45,"fmt":"123.45"},
                    "targetMeanPrice":{"raw":150.0,"fmt":"150.00"},
                    "revenueGrowth":{"raw":0.25,"fmt":"25.00%"}
                },
                "defaultKeyStatistics":{"pegRatio":{"raw":1.8,"fmt":"1.80"}}
            }]}}"#,
        )
        .unwrap();

        let info = flatten_info(body);
        assert_eq!(info.get("sector").and_then(|v| v.as_str()), Some("Technology"));
        assert_eq!(info.get("currentPrice").and_then(|v| v.as_f64()), Some(123.45));
        assert_eq!(info.get("targetMeanPrice").and_then(|v| v.as_f64()), Some(150.0));
        assert_eq!(info.get("pegRatio").and_then(|v| v.as_f64()), Some(1.8));
    }

    #[test]
    fn flatten_info_empty_result() {
        let body: QuoteSummaryResponse =
            serde_json::from_str(r#"{"quoteSummary":{"result":null}}"#).unwrap();
        assert!(flatten_info(body).is_empty());
    }

    #[test]
    fn search_response_parses_news() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"news":[
                {"title":"Chip rally extends","publisher":"Newswire","link":"https://example.com/a"},
                {"title":"Guidance raised","link":"https://example.com/b"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(body.news.len(), 2);
        assert_eq!(body.news[1].publisher, None);
    }
}
