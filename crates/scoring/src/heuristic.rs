use async_trait::async_trait;
use screener_core::{
    clamp_score, FundamentalsRecord, Grade, Headline, IndicatorSnapshot, ScoreCard, Scorer,
    ScreenError, Trend,
};

const RSI_OVERSOLD: f64 = 35.0;
const RSI_OVERBOUGHT: f64 = 72.0;
const STRETCHED_PE: f64 = 40.0;

/// Deterministic scorer used when no LLM credential is configured.
///
/// Maps fundamentals + indicators + the first headline onto the same
/// card shape the LLM scorer produces. Anchors: value ~8 at PE 10,
/// ~5 at PE 25, ~2 at PE 60.
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scorer for HeuristicScorer {
    async fn score(
        &self,
        fundamentals: &FundamentalsRecord,
        indicators: &IndicatorSnapshot,
        headlines: &[Headline],
    ) -> Result<ScoreCard, ScreenError> {
        Ok(score_deterministic(fundamentals, indicators, headlines))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

/// The full deterministic mapping, exposed for tests.
pub fn score_deterministic(
    fundamentals: &FundamentalsRecord,
    indicators: &IndicatorSnapshot,
    headlines: &[Headline],
) -> ScoreCard {
    let trend = Trend::classify(
        fundamentals.current_price,
        indicators.ma_20,
        indicators.ma_50,
        indicators.ma_200,
    );

    let card = ScoreCard {
        ticker: fundamentals.ticker.clone(),
        sector: fundamentals.sector.clone(),
        value_score: value_score(fundamentals.pe),
        growth_score: growth_score(fundamentals.revenue_growth, fundamentals.earnings_growth),
        technical_score: technical_score(trend, indicators.rsi_14),
        upside_score: upside_score(fundamentals.upside_to_target_pct),
        earnings_beat_probability: beat_probability(
            fundamentals.profit_margin,
            fundamentals.revenue_growth,
        ),
        confidence_level: confidence_level(fundamentals, indicators),
        key_bull_thesis: bull_thesis(trend, fundamentals, headlines),
        key_risk: key_risk(trend, fundamentals.pe),
        technical_setup: technical_setup(trend, indicators),
    };
    card.normalize()
}

/// Value from trailing PE: ~8 at 10x, ~5 at 25x, floor of 2 past 40x.
fn value_score(pe: Option<f64>) -> i64 {
    match pe {
        Some(pe) if pe > 0.0 => {
            let raw = (8.0 - (pe - 10.0) / 5.0).round() as i64;
            raw.clamp(2, 8)
        }
        _ => 5,
    }
}

/// Growth from revenue growth (fractional), falling back to earnings
/// growth. A reading that rounds to zero carries no signal and keeps the
/// neutral default.
fn growth_score(revenue_growth: Option<f64>, earnings_growth: Option<f64>) -> i64 {
    let raw = match (revenue_growth, earnings_growth) {
        (Some(rg), _) => (rg * 20.0).round() as i64,
        (None, Some(eg)) => (eg * 18.0).round() as i64,
        (None, None) => return 5,
    };
    if raw == 0 {
        5
    } else {
        clamp_score(raw)
    }
}

/// Base 5, adjusted by the trend label and the RSI bands.
fn technical_score(trend: Option<Trend>, rsi: Option<f64>) -> i64 {
    let mut score = 5i64;
    match trend {
        Some(Trend::Uptrend) => score += 2,
        Some(Trend::Momentum) => score += 1,
        Some(Trend::Weak) => score -= 1,
        Some(Trend::Base) | None => {}
    }
    if let Some(rsi) = rsi {
        if rsi < RSI_OVERSOLD {
            score += 1;
        } else if rsi > RSI_OVERBOUGHT {
            score -= 1;
        }
    }
    clamp_score(score)
}

/// Upside from analyst target distance, 5% of upside per point.
fn upside_score(upside_to_target_pct: Option<f64>) -> i64 {
    match upside_to_target_pct {
        Some(upside) => clamp_score((upside / 5.0).round() as i64),
        None => 5,
    }
}

fn beat_probability(profit_margin: Option<f64>, revenue_growth: Option<f64>) -> Grade {
    match (profit_margin, revenue_growth) {
        (Some(pm), Some(rg)) if pm > 0.15 && rg > 0.15 => Grade::High,
        (Some(pm), Some(rg)) if pm < 0.05 && rg < 0.05 => Grade::Low,
        _ => Grade::Medium,
    }
}

/// Confidence from input coverage: how many of PE, revenue growth,
/// target upside and RSI actually arrived.
fn confidence_level(fundamentals: &FundamentalsRecord, indicators: &IndicatorSnapshot) -> Grade {
    let present = [
        fundamentals.pe,
        fundamentals.revenue_growth,
        fundamentals.upside_to_target_pct,
        indicators.rsi_14,
    ]
    .iter()
    .filter(|v| v.is_some())
    .count();

    match present {
        n if n >= 3 => Grade::High,
        2 => Grade::Medium,
        _ => Grade::Low,
    }
}

fn bull_thesis(
    trend: Option<Trend>,
    fundamentals: &FundamentalsRecord,
    headlines: &[Headline],
) -> String {
    let tape = match trend {
        Some(t) => format!("{} tape", t.as_str().to_lowercase()),
        None => "mixed tape".to_string(),
    };
    let mut thesis = match fundamentals.upside_to_target_pct {
        Some(upside) => format!(
            "{} with analyst targets implying {:.1}% upside on a {}.",
            fundamentals.ticker, upside, tape
        ),
        None => format!("{} screening constructively on a {}.", fundamentals.ticker, tape),
    };
    if let Some(first) = headlines.first() {
        thesis.push_str(&format!(" In the news: {}.", first.title));
    }
    thesis
}

fn key_risk(trend: Option<Trend>, pe: Option<f64>) -> String {
    if let Some(pe) = pe {
        if pe > STRETCHED_PE {
            return format!("Valuation risk at {:.0}x trailing earnings.", pe);
        }
    }
    if trend == Some(Trend::Weak) {
        return "Weak price action below the long-term trend.".to_string();
    }
    "Standard market and execution risk.".to_string()
}

fn technical_setup(trend: Option<Trend>, indicators: &IndicatorSnapshot) -> String {
    let label = trend.map(|t| t.as_str()).unwrap_or("No trend read");
    match (indicators.rsi_14, indicators.distance_from_52w_high_pct) {
        (Some(rsi), Some(dist)) => {
            format!("{}. RSI {:.0}, {:.1}% below the 52-week high.", label, rsi, dist)
        }
        (Some(rsi), None) => format!("{}. RSI {:.0}.", label, rsi),
        _ => format!("{}.", label),
    }
}
