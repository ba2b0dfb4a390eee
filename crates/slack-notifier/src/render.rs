use crate::fmt::{format_opt_money, format_pct};
use screener_core::{ReportRow, Trend};
use serde_json::{json, Value};

/// Rows shown in the monospace snapshot table.
const TABLE_ROWS: usize = 12;
/// Picks covered in the narrative section.
const NARRATIVE_PICKS: usize = 8;

const DISCLAIMER: &str = "Informational only. Not investment advice.";

/// Build the Block Kit payload body for the desk report.
pub fn desk_report_blocks(rows: &[ReportRow], screening_date: &str) -> Vec<Value> {
    vec![
        json!({
            "type": "header",
            "text": {"type": "plain_text", "text": "Daily Equity Screen", "emoji": true}
        }),
        json!({
            "type": "context",
            "elements": [{
                "type": "mrkdwn",
                "text": format!("{} | {} tickers screened", screening_date, rows.len())
            }]
        }),
        json!({"type": "divider"}),
        json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": narrative(rows)}
        }),
        json!({"type": "divider"}),
        json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": format!("```{}```", snapshot_table(rows))}
        }),
        json!({
            "type": "context",
            "elements": [{"type": "mrkdwn", "text": DISCLAIMER}]
        }),
    ]
}

/// Monospace snapshot of the top rows:
/// Ticker, Price, 1D, 5D, 1M, 3M, RSI, Trend, Upside.
pub fn snapshot_table(rows: &[ReportRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<7}{:>11}{:>9}{:>9}{:>9}{:>9}{:>6}  {:<9}{:>6}\n",
        "Ticker", "Price", "1D", "5D", "1M", "3M", "RSI", "Trend", "Upside"
    ));

    for row in rows.iter().take(TABLE_ROWS) {
        let trend = Trend::classify(row.current_price, row.ma_20, row.ma_50, row.ma_200)
            .map(|t| t.as_str())
            .unwrap_or("n/a");
        let rsi = row
            .rsi_14
            .map(|r| format!("{:.0}", r))
            .unwrap_or_else(|| "n/a".to_string());

        out.push_str(&format!(
            "{:<7}{:>11}{:>9}{:>9}{:>9}{:>9}{:>6}  {:<9}{:>6}\n",
            row.ticker,
            format_opt_money(row.current_price),
            format_pct(row.ret_1d_pct),
            format_pct(row.ret_5d_pct),
            format_pct(row.ret_21d_pct),
            format_pct(row.ret_63d_pct),
            rsi,
            trend,
            row.upside_score,
        ));
    }
    out
}

/// Narrative section: top picks with scores, thesis, risk and setup.
fn narrative(rows: &[ReportRow]) -> String {
    let mut out = String::from("*Top picks*\n");
    for (i, row) in rows.iter().take(NARRATIVE_PICKS).enumerate() {
        let sector = row.sector.as_deref().unwrap_or("Unclassified");
        out.push_str(&format!(
            "*{}. {}* ({})  V:{} G:{} T:{} Upside:{} | Confidence: {}\n",
            i + 1,
            row.ticker,
            sector,
            row.value_score,
            row.growth_score,
            row.technical_score,
            row.upside_score,
            row.confidence_level,
        ));
        if !row.key_bull_thesis.is_empty() {
            out.push_str(&format!("Bull: {}\n", row.key_bull_thesis));
        }
        if !row.key_risk.is_empty() {
            out.push_str(&format!("Risk: {}\n", row.key_risk));
        }
        if !row.technical_setup.is_empty() {
            out.push_str(&format!("Setup: {}\n", row.technical_setup));
        }
        if !row.headlines.is_empty() {
            out.push_str(&format!("News: {}\n", row.headlines));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use screener_core::Grade;

    fn row(ticker: &str, upside: i64) -> ReportRow {
        ReportRow {
            ticker: ticker.to_string(),
            sector: Some("Technology".to_string()),
            value_score: 8,
            growth_score: 6,
            technical_score: 7,
            upside_score: upside,
            earnings_beat_probability: Grade::High,
            confidence_level: Grade::High,
            key_bull_thesis: "thesis".to_string(),
            key_risk: "risk".to_string(),
            technical_setup: "setup".to_string(),
            current_price: Some(1234.5),
            market_cap: None,
            month_pct_down: None,
            analyst_target_price: None,
            upside_to_target_pct: Some(25.0),
            rsi_14: Some(40.0),
            ma_20: Some(105.0),
            ma_50: Some(100.0),
            ma_200: Some(95.0),
            price_above_ma20: Some(true),
            price_above_ma50: Some(true),
            price_above_ma200: Some(true),
            ma20_above_ma50: Some(true),
            ma50_above_ma200: Some(true),
            high_52w: None,
            low_52w: None,
            distance_from_52w_high_pct: None,
            distance_from_52w_low_pct: None,
            ret_1d_pct: Some(1.23),
            ret_5d_pct: Some(-0.5),
            ret_21d_pct: None,
            ret_63d_pct: Some(12.0),
            ret_126d_pct: None,
            headlines: "alpha; beta".to_string(),
            screening_date: "2026-08-07".to_string(),
        }
    }

    #[test]
    fn table_caps_at_twelve_rows() {
        let rows: Vec<ReportRow> = (0..20).map(|i| row(&format!("T{i}"), 5)).collect();
        let table = snapshot_table(&rows);
        // header + 12 data lines
        assert_eq!(table.lines().count(), 13);
    }

    #[test]
    fn table_renders_values_and_nulls() {
        let table = snapshot_table(&[row("AAA", 5)]);
        assert!(table.contains("$1,234.50"));
        assert!(table.contains("+1.23%"));
        assert!(table.contains("-0.50%"));
        assert!(table.contains("n/a")); // null 1M return
        assert!(table.contains("Uptrend"));
    }

    #[test]
    fn blocks_shape_matches_desk_report() {
        let rows = vec![row("AAA", 5)];
        let blocks = desk_report_blocks(&rows, "2026-08-07");

        assert_eq!(blocks.len(), 7);
        assert_eq!(blocks[0]["type"], "header");
        assert_eq!(blocks[1]["type"], "context");
        assert_eq!(blocks[2]["type"], "divider");
        assert_eq!(blocks[3]["type"], "section");
        assert_eq!(blocks[4]["type"], "divider");
        assert_eq!(blocks[5]["type"], "section");
        assert_eq!(blocks[6]["type"], "context");

        let table_text = blocks[5]["text"]["text"].as_str().unwrap();
        assert!(table_text.starts_with("```"));
        assert!(table_text.ends_with("```"));

        let disclaimer = blocks[6]["elements"][0]["text"].as_str().unwrap();
        assert_eq!(disclaimer, "Informational only. Not investment advice.");
    }

    #[test]
    fn narrative_caps_at_eight_picks() {
        let rows: Vec<ReportRow> = (0..12).map(|i| row(&format!("T{i}"), 5)).collect();
        let text = narrative(&rows);
        assert!(text.contains("*8. T7*"));
        assert!(!text.contains("*9. T8*"));
        assert!(text.contains("Confidence: High"));
    }
}
