use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One daily OHLCV bar. Dates are strictly increasing per ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Raw provider info snapshot: provider-defined keys mapped to
/// heterogeneous scalars. Only the fundamentals extractor reads this.
pub type InfoRecord = HashMap<String, serde_json::Value>;

/// A single news item for a ticker, in provider order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub publisher: Option<String>,
    pub link: String,
}

/// Fixed-schema projection of the raw info record.
///
/// Every field may be null except `ticker`. Percentages are in percent
/// units; growth and margin ratios stay in fractional units as the
/// provider reports them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundamentalsRecord {
    pub ticker: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub market_cap_billions: Option<f64>,
    pub current_price: Option<f64>,
    pub pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_sales: Option<f64>,
    pub price_to_book: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub profit_margin: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub free_cash_flow: Option<f64>,
    /// Absolute value of the month-to-date decline when the month is
    /// down, null otherwise.
    pub month_pct_down: Option<f64>,
    pub analyst_target_price: Option<f64>,
    pub upside_to_target_pct: Option<f64>,
}

/// Technical snapshot computed from a daily close series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi_14: Option<f64>,
    pub ma_20: Option<f64>,
    pub ma_50: Option<f64>,
    pub ma_200: Option<f64>,
    pub price_above_ma20: Option<bool>,
    pub price_above_ma50: Option<bool>,
    pub price_above_ma200: Option<bool>,
    pub ma20_above_ma50: Option<bool>,
    pub ma50_above_ma200: Option<bool>,
    #[serde(rename = "52w_high")]
    pub high_52w: Option<f64>,
    #[serde(rename = "52w_low")]
    pub low_52w: Option<f64>,
    pub distance_from_52w_high_pct: Option<f64>,
    pub distance_from_52w_low_pct: Option<f64>,
    pub ret_1d_pct: Option<f64>,
    pub ret_5d_pct: Option<f64>,
    pub ret_21d_pct: Option<f64>,
    pub ret_63d_pct: Option<f64>,
    pub ret_126d_pct: Option<f64>,
}

/// Categorical grade used for beat probability and scorer confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    High,
    Medium,
    Low,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::High => "High",
            Grade::Medium => "Medium",
            Grade::Low => "Low",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative price-vs-MA alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Uptrend,
    Momentum,
    Base,
    Weak,
}

impl Trend {
    /// Classify price against the moving-average stack.
    ///
    /// Returns `None` when the operands needed for a read are missing, so
    /// a data-starved ticker is "no read" rather than `Weak`.
    pub fn classify(
        price: Option<f64>,
        ma20: Option<f64>,
        ma50: Option<f64>,
        ma200: Option<f64>,
    ) -> Option<Trend> {
        let price = price?;
        if let (Some(m20), Some(m50), Some(m200)) = (ma20, ma50, ma200) {
            if price > m20 && m20 > m50 && m50 > m200 {
                return Some(Trend::Uptrend);
            }
        }
        if let (Some(m20), Some(m50)) = (ma20, ma50) {
            if price > m50 && m20 > m50 {
                return Some(Trend::Momentum);
            }
        }
        let m200 = ma200?;
        if price > m200 {
            Some(Trend::Base)
        } else {
            Some(Trend::Weak)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Uptrend => "Uptrend",
            Trend::Momentum => "Momentum",
            Trend::Base => "Base",
            Trend::Weak => "Weak",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Character caps for the scorer narrative fields.
pub const BULL_THESIS_MAX: usize = 280;
pub const RISK_MAX: usize = 220;
pub const SETUP_MAX: usize = 220;

/// Output of either scorer backend. Scores are integers in [1, 10].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreCard {
    pub ticker: String,
    pub sector: Option<String>,
    pub value_score: i64,
    pub growth_score: i64,
    pub technical_score: i64,
    pub upside_score: i64,
    pub earnings_beat_probability: Grade,
    pub confidence_level: Grade,
    pub key_bull_thesis: String,
    pub key_risk: String,
    pub technical_setup: String,
}

impl ScoreCard {
    /// Clamp all scores into [1, 10] and enforce the narrative caps.
    pub fn normalize(mut self) -> Self {
        self.value_score = clamp_score(self.value_score);
        self.growth_score = clamp_score(self.growth_score);
        self.technical_score = clamp_score(self.technical_score);
        self.upside_score = clamp_score(self.upside_score);
        self.key_bull_thesis = truncate_chars(&self.key_bull_thesis, BULL_THESIS_MAX);
        self.key_risk = truncate_chars(&self.key_risk, RISK_MAX);
        self.technical_setup = truncate_chars(&self.technical_setup, SETUP_MAX);
        self
    }
}

/// Clamp an integer score into the [1, 10] band.
pub fn clamp_score(score: i64) -> i64 {
    score.clamp(1, 10)
}

/// Truncate a string to at most `max` characters, char-boundary safe.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// One flat output row per ticker. Field order here is the CSV column
/// order: scorer output, selected fundamentals, indicator snapshot,
/// joined headlines, screening date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub ticker: String,
    pub sector: Option<String>,
    pub value_score: i64,
    pub growth_score: i64,
    pub technical_score: i64,
    pub upside_score: i64,
    pub earnings_beat_probability: Grade,
    pub confidence_level: Grade,
    pub key_bull_thesis: String,
    pub key_risk: String,
    pub technical_setup: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub month_pct_down: Option<f64>,
    pub analyst_target_price: Option<f64>,
    pub upside_to_target_pct: Option<f64>,
    pub rsi_14: Option<f64>,
    pub ma_20: Option<f64>,
    pub ma_50: Option<f64>,
    pub ma_200: Option<f64>,
    pub price_above_ma20: Option<bool>,
    pub price_above_ma50: Option<bool>,
    pub price_above_ma200: Option<bool>,
    pub ma20_above_ma50: Option<bool>,
    pub ma50_above_ma200: Option<bool>,
    #[serde(rename = "52w_high")]
    pub high_52w: Option<f64>,
    #[serde(rename = "52w_low")]
    pub low_52w: Option<f64>,
    pub distance_from_52w_high_pct: Option<f64>,
    pub distance_from_52w_low_pct: Option<f64>,
    pub ret_1d_pct: Option<f64>,
    pub ret_5d_pct: Option<f64>,
    pub ret_21d_pct: Option<f64>,
    pub ret_63d_pct: Option<f64>,
    pub ret_126d_pct: Option<f64>,
    pub headlines: String,
    pub screening_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_uptrend_requires_full_stack() {
        let t = Trend::classify(Some(110.0), Some(105.0), Some(100.0), Some(95.0));
        assert_eq!(t, Some(Trend::Uptrend));
    }

    #[test]
    fn trend_momentum_without_ma200() {
        let t = Trend::classify(Some(110.0), Some(108.0), Some(100.0), None);
        assert_eq!(t, Some(Trend::Momentum));
    }

    #[test]
    fn trend_weak_below_ma200() {
        let t = Trend::classify(Some(90.0), Some(95.0), Some(100.0), Some(105.0));
        assert_eq!(t, Some(Trend::Weak));
    }

    #[test]
    fn trend_no_read_without_price() {
        assert_eq!(Trend::classify(None, Some(1.0), Some(1.0), Some(1.0)), None);
        assert_eq!(Trend::classify(Some(1.0), None, None, None), None);
    }

    #[test]
    fn clamp_score_band() {
        assert_eq!(clamp_score(-3), 1);
        assert_eq!(clamp_score(0), 1);
        assert_eq!(clamp_score(7), 7);
        assert_eq!(clamp_score(14), 10);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 3), "hél");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn grade_serializes_exact_labels() {
        assert_eq!(serde_json::to_string(&Grade::High).unwrap(), "\"High\"");
        assert_eq!(serde_json::to_string(&Grade::Medium).unwrap(), "\"Medium\"");
        assert_eq!(serde_json::to_string(&Grade::Low).unwrap(), "\"Low\"");
    }
}
