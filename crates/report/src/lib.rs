pub mod sinks;

pub use sinks::{write_results_csv, write_watchlist_csv};

use chrono::NaiveDate;
use screener_core::{FundamentalsRecord, Headline, IndicatorSnapshot, ReportRow, ScoreCard};

/// How many headline titles land in the row's `headlines` column.
const ROW_HEADLINES: usize = 2;

/// Build one flat report row by named projection: scorer output first,
/// then the selected fundamentals, the indicator snapshot, joined
/// headlines and the screening date.
pub fn assemble_row(
    card: ScoreCard,
    fundamentals: &FundamentalsRecord,
    indicators: &IndicatorSnapshot,
    headlines: &[Headline],
    screening_date: NaiveDate,
) -> ReportRow {
    ReportRow {
        ticker: card.ticker,
        sector: card.sector,
        value_score: card.value_score,
        growth_score: card.growth_score,
        technical_score: card.technical_score,
        upside_score: card.upside_score,
        earnings_beat_probability: card.earnings_beat_probability,
        confidence_level: card.confidence_level,
        key_bull_thesis: card.key_bull_thesis,
        key_risk: card.key_risk,
        technical_setup: card.technical_setup,
        current_price: fundamentals.current_price,
        market_cap: fundamentals.market_cap,
        month_pct_down: fundamentals.month_pct_down,
        analyst_target_price: fundamentals.analyst_target_price,
        upside_to_target_pct: fundamentals.upside_to_target_pct,
        rsi_14: indicators.rsi_14,
        ma_20: indicators.ma_20,
        ma_50: indicators.ma_50,
        ma_200: indicators.ma_200,
        price_above_ma20: indicators.price_above_ma20,
        price_above_ma50: indicators.price_above_ma50,
        price_above_ma200: indicators.price_above_ma200,
        ma20_above_ma50: indicators.ma20_above_ma50,
        ma50_above_ma200: indicators.ma50_above_ma200,
        high_52w: indicators.high_52w,
        low_52w: indicators.low_52w,
        distance_from_52w_high_pct: indicators.distance_from_52w_high_pct,
        distance_from_52w_low_pct: indicators.distance_from_52w_low_pct,
        ret_1d_pct: indicators.ret_1d_pct,
        ret_5d_pct: indicators.ret_5d_pct,
        ret_21d_pct: indicators.ret_21d_pct,
        ret_63d_pct: indicators.ret_63d_pct,
        ret_126d_pct: indicators.ret_126d_pct,
        headlines: join_headlines(headlines),
        screening_date: screening_date.format("%Y-%m-%d").to_string(),
    }
}

/// Top two headline titles joined with "; ".
fn join_headlines(headlines: &[Headline]) -> String {
    headlines
        .iter()
        .take(ROW_HEADLINES)
        .map(|h| h.title.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Stable descending sort on upside score; ties keep input order.
pub fn sort_rows(rows: &mut [ReportRow]) {
    rows.sort_by(|a, b| b.upside_score.cmp(&a.upside_score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use screener_core::Grade;

    fn row(ticker: &str, upside: i64) -> ReportRow {
        let card = ScoreCard {
            ticker: ticker.to_string(),
            sector: None,
            value_score: 5,
            growth_score: 5,
            technical_score: 5,
            upside_score: upside,
            earnings_beat_probability: Grade::Medium,
            confidence_level: Grade::Low,
            key_bull_thesis: String::new(),
            key_risk: String::new(),
            technical_setup: String::new(),
        };
        assemble_row(
            card,
            &FundamentalsRecord {
                ticker: ticker.to_string(),
                ..Default::default()
            },
            &IndicatorSnapshot::default(),
            &[],
            NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
        )
    }

    #[test]
    fn sort_is_descending_and_stable() {
        let mut rows = vec![row("A", 5), row("B", 8), row("C", 5), row("D", 9)];
        sort_rows(&mut rows);
        let order: Vec<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["D", "B", "A", "C"]);
        for pair in rows.windows(2) {
            assert!(pair[0].upside_score >= pair[1].upside_score);
        }
    }

    #[test]
    fn headlines_join_top_two() {
        let headlines: Vec<Headline> = ["alpha", "beta", "gamma"]
            .iter()
            .map(|t| Headline {
                title: t.to_string(),
                publisher: None,
                link: String::new(),
            })
            .collect();
        assert_eq!(join_headlines(&headlines), "alpha; beta");
        assert_eq!(join_headlines(&headlines[..1]), "alpha");
        assert_eq!(join_headlines(&[]), "");
    }

    #[test]
    fn screening_date_is_iso() {
        let r = row("A", 5);
        assert_eq!(r.screening_date, "2026-08-07");
    }
}
