use async_trait::async_trait;
use openai_client::OpenAiClient;
use screener_core::{
    FundamentalsRecord, Headline, IndicatorSnapshot, ScoreCard, Scorer, ScreenError,
};
use serde_json::json;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are an equity research analyst producing a screening scorecard. \
Score strictly from the data provided; do not invent figures. \
Scores are integers from 1 (worst) to 10 (best).";

/// How many headlines ride along in the scoring payload.
const PAYLOAD_HEADLINES: usize = 3;

/// LLM-backed scorer: compact data payload in, schema-pinned JSON card out.
///
/// A response that fails to parse or lands outside the schema is a
/// `SchemaViolation`; the orchestrator reports the ticker as failed
/// instead of salvaging.
pub struct LlmScorer {
    client: Arc<OpenAiClient>,
}

impl LlmScorer {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Scorer for LlmScorer {
    async fn score(
        &self,
        fundamentals: &FundamentalsRecord,
        indicators: &IndicatorSnapshot,
        headlines: &[Headline],
    ) -> Result<ScoreCard, ScreenError> {
        let payload = score_payload(fundamentals, indicators, headlines);
        let user = format!(
            "Score this candidate for the daily screen.\n{}",
            serde_json::to_string_pretty(&payload)
                .map_err(|e| ScreenError::SchemaViolation(e.to_string()))?
        );

        let value = self
            .client
            .chat_json(SYSTEM_PROMPT, &user, "screening_scorecard", score_schema())
            .await?;

        let mut card: ScoreCard = serde_json::from_value(value)
            .map_err(|e| ScreenError::SchemaViolation(format!("Scorecard shape: {}", e)))?;

        validate_scores(&card)?;

        // The model echoes identity fields; the pipeline owns them.
        card.ticker = fundamentals.ticker.clone();
        if card.sector.is_none() {
            card.sector = fundamentals.sector.clone();
        }
        Ok(card.normalize())
    }

    fn name(&self) -> &str {
        "llm"
    }
}

fn validate_scores(card: &ScoreCard) -> Result<(), ScreenError> {
    for (field, score) in [
        ("value_score", card.value_score),
        ("growth_score", card.growth_score),
        ("technical_score", card.technical_score),
        ("upside_score", card.upside_score),
    ] {
        if !(1..=10).contains(&score) {
            return Err(ScreenError::SchemaViolation(format!(
                "{} out of range: {}",
                field, score
            )));
        }
    }
    Ok(())
}

/// Minimal projection sent to the model: selected fundamentals, the full
/// indicator snapshot, and the top headlines.
fn score_payload(
    fundamentals: &FundamentalsRecord,
    indicators: &IndicatorSnapshot,
    headlines: &[Headline],
) -> serde_json::Value {
    json!({
        "ticker": fundamentals.ticker,
        "fundamentals": {
            "sector": fundamentals.sector,
            "industry": fundamentals.industry,
            "market_cap_billions": fundamentals.market_cap_billions,
            "current_price": fundamentals.current_price,
            "pe": fundamentals.pe,
            "forward_pe": fundamentals.forward_pe,
            "peg_ratio": fundamentals.peg_ratio,
            "revenue_growth": fundamentals.revenue_growth,
            "earnings_growth": fundamentals.earnings_growth,
            "profit_margin": fundamentals.profit_margin,
            "debt_to_equity": fundamentals.debt_to_equity,
            "month_pct_down": fundamentals.month_pct_down,
            "analyst_target_price": fundamentals.analyst_target_price,
            "upside_to_target_pct": fundamentals.upside_to_target_pct,
        },
        "indicators": indicators,
        "headlines": headlines
            .iter()
            .take(PAYLOAD_HEADLINES)
            .map(|h| json!({"title": h.title, "publisher": h.publisher}))
            .collect::<Vec<_>>(),
    })
}

/// The strict response schema: every card field enumerated, enums pinned.
fn score_schema() -> serde_json::Value {
    let score = json!({"type": "integer", "minimum": 1, "maximum": 10});
    let grade = json!({"type": "string", "enum": ["High", "Medium", "Low"]});
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": [
            "ticker", "sector", "value_score", "growth_score", "technical_score",
            "upside_score", "earnings_beat_probability", "confidence_level",
            "key_bull_thesis", "key_risk", "technical_setup"
        ],
        "properties": {
            "ticker": {"type": "string"},
            "sector": {"type": ["string", "null"]},
            "value_score": score,
            "growth_score": score,
            "technical_score": score,
            "upside_score": score,
            "earnings_beat_probability": grade,
            "confidence_level": grade,
            "key_bull_thesis": {"type": "string"},
            "key_risk": {"type": "string"},
            "technical_setup": {"type": "string"}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use screener_core::Grade;

    #[test]
    fn schema_enumerates_every_card_field() {
        let schema = score_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        for field in [
            "ticker",
            "sector",
            "value_score",
            "growth_score",
            "technical_score",
            "upside_score",
            "earnings_beat_probability",
            "confidence_level",
            "key_bull_thesis",
            "key_risk",
            "technical_setup",
        ] {
            assert!(required.contains(&field), "missing {field}");
            assert!(schema["properties"].get(field).is_some(), "no property for {field}");
        }
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(
            schema["properties"]["confidence_level"]["enum"],
            json!(["High", "Medium", "Low"])
        );
    }

    #[test]
    fn conforming_payload_parses_into_card() {
        let value = json!({
            "ticker": "AAPL",
            "sector": "Technology",
            "value_score": 6,
            "growth_score": 7,
            "technical_score": 8,
            "upside_score": 6,
            "earnings_beat_probability": "High",
            "confidence_level": "Medium",
            "key_bull_thesis": "Services growth keeps compounding.",
            "key_risk": "Hardware cycle softness.",
            "technical_setup": "Holding above the 50-day."
        });
        let card: ScoreCard = serde_json::from_value(value).unwrap();
        assert_eq!(card.earnings_beat_probability, Grade::High);
        assert!(validate_scores(&card).is_ok());
    }

    #[test]
    fn out_of_band_score_is_a_schema_violation() {
        let value = json!({
            "ticker": "AAPL",
            "sector": null,
            "value_score": 12,
            "growth_score": 7,
            "technical_score": 8,
            "upside_score": 6,
            "earnings_beat_probability": "High",
            "confidence_level": "Medium",
            "key_bull_thesis": "x",
            "key_risk": "y",
            "technical_setup": "z"
        });
        let card: ScoreCard = serde_json::from_value(value).unwrap();
        assert!(matches!(
            validate_scores(&card),
            Err(ScreenError::SchemaViolation(_))
        ));
    }

    #[test]
    fn unknown_grade_fails_to_parse() {
        let value = json!({
            "ticker": "AAPL",
            "sector": null,
            "value_score": 5,
            "growth_score": 5,
            "technical_score": 5,
            "upside_score": 5,
            "earnings_beat_probability": "Certain",
            "confidence_level": "Medium",
            "key_bull_thesis": "x",
            "key_risk": "y",
            "technical_setup": "z"
        });
        assert!(serde_json::from_value::<ScoreCard>(value).is_err());
    }

    #[test]
    fn payload_keeps_top_three_headlines() {
        let headlines: Vec<Headline> = (0..5)
            .map(|i| Headline {
                title: format!("headline {i}"),
                publisher: None,
                link: format!("https://example.com/{i}"),
            })
            .collect();
        let fundamentals = FundamentalsRecord {
            ticker: "AAA".to_string(),
            ..Default::default()
        };
        let payload = score_payload(&fundamentals, &IndicatorSnapshot::default(), &headlines);
        assert_eq!(payload["headlines"].as_array().unwrap().len(), 3);
    }
}
