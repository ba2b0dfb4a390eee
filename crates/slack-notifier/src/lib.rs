mod fmt;
mod render;

pub use fmt::{format_money, format_opt_money, format_pct};
pub use render::{desk_report_blocks, snapshot_table};

use screener_core::{ReportRow, ScreenError};
use serde_json::json;

/// Slack webhook sink for the desk report.
///
/// Send failures surface as `SinkFailure` for the orchestrator to log;
/// they never abort a run.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            webhook_url,
        }
    }

    /// Post the desk report for an already-sorted row set.
    pub async fn send_desk_report(
        &self,
        rows: &[ReportRow],
        screening_date: &str,
    ) -> Result<(), ScreenError> {
        let payload = json!({
            "text": format!(
                "Daily equity screen {}: {} tickers, top pick {}",
                screening_date,
                rows.len(),
                rows.first().map(|r| r.ticker.as_str()).unwrap_or("n/a")
            ),
            "blocks": desk_report_blocks(rows, screening_date),
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ScreenError::SinkFailure(format!("webhook: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScreenError::SinkFailure(format!(
                "webhook HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        tracing::info!("Desk report posted for {} rows", rows.len());
        Ok(())
    }

    pub fn name(&self) -> &str {
        "slack-webhook"
    }
}
