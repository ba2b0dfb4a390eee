use chrono::{Datelike, NaiveDate};
use screener_core::{DailyBar, FundamentalsRecord, InfoRecord};

/// Project the raw provider info record into the fixed fundamentals
/// schema.
///
/// `fallback_price` is used when the provider omits a current price
/// (typically the last close). `bars` is the recent daily history used
/// for the month-to-date read; `today` anchors which calendar month that
/// is. Missing sub-inputs propagate as nulls; nothing here can fail.
pub fn extract(
    ticker: &str,
    info: &InfoRecord,
    fallback_price: Option<f64>,
    bars: &[DailyBar],
    today: NaiveDate,
) -> FundamentalsRecord {
    let current_price = num(info, "currentPrice").or(fallback_price);
    let market_cap = num(info, "marketCap");
    let analyst_target_price = num(info, "targetMeanPrice");

    FundamentalsRecord {
        ticker: ticker.to_string(),
        sector: text(info, "sector"),
        industry: text(info, "industry"),
        market_cap,
        market_cap_billions: market_cap.map(|cap| round2(cap / 1e9)),
        current_price,
        pe: num(info, "trailingPE"),
        forward_pe: num(info, "forwardPE"),
        peg_ratio: num(info, "pegRatio"),
        price_to_sales: num(info, "priceToSalesTrailing12Months"),
        price_to_book: num(info, "priceToBook"),
        revenue_growth: num(info, "revenueGrowth"),
        earnings_growth: num(info, "earningsGrowth"),
        profit_margin: num(info, "profitMargins"),
        debt_to_equity: num(info, "debtToEquity"),
        free_cash_flow: num(info, "freeCashflow"),
        month_pct_down: month_pct_down(bars, current_price, today),
        analyst_target_price,
        upside_to_target_pct: upside_to_target(current_price, analyst_target_price),
    }
}

/// `(target - price) / price * 100`, only when both operands are present
/// and positive.
pub fn upside_to_target(price: Option<f64>, target: Option<f64>) -> Option<f64> {
    match (price, target) {
        (Some(p), Some(t)) if p > 0.0 && t > 0.0 => Some(round2((t - p) / p * 100.0)),
        _ => None,
    }
}

/// Month-to-date drawdown: absolute value of the decline from the open of
/// the month's first trading day to the current price, when negative.
/// Up months report null.
pub fn month_pct_down(
    bars: &[DailyBar],
    current_price: Option<f64>,
    today: NaiveDate,
) -> Option<f64> {
    let price = current_price?;
    let first = bars
        .iter()
        .find(|b| b.date.year() == today.year() && b.date.month() == today.month())?;
    if first.open <= 0.0 {
        return None;
    }
    let change_pct = (price - first.open) / first.open * 100.0;
    if change_pct < 0.0 {
        Some(round2(change_pct.abs()))
    } else {
        None
    }
}

fn num(info: &InfoRecord, key: &str) -> Option<f64> {
    info.get(key).and_then(|v| v.as_f64())
}

fn text(info: &InfoRecord, key: &str) -> Option<String> {
    info.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bar(date: &str, open: f64) -> DailyBar {
        DailyBar {
            date: date.parse().unwrap(),
            open,
            high: open,
            low: open,
            close: open,
            volume: 0.0,
        }
    }

    #[test]
    fn extract_full_record() {
        let mut info = InfoRecord::new();
        info.insert("sector".into(), json!("Technology"));
        info.insert("industry".into(), json!("Semiconductors"));
        info.insert("marketCap".into(), json!(2.5e12));
        info.insert("currentPrice".into(), json!(100.0));
        info.insert("trailingPE".into(), json!(25.0));
        info.insert("revenueGrowth".into(), json!(0.30));
        info.insert("profitMargins".into(), json!(0.22));
        info.insert("targetMeanPrice".into(), json!(125.0));

        let rec = extract("NVDA", &info, None, &[], "2026-08-07".parse().unwrap());
        assert_eq!(rec.ticker, "NVDA");
        assert_eq!(rec.sector.as_deref(), Some("Technology"));
        assert_eq!(rec.market_cap_billions, Some(2500.0));
        assert_eq!(rec.current_price, Some(100.0));
        assert_eq!(rec.upside_to_target_pct, Some(25.0));
        assert_eq!(rec.month_pct_down, None); // no bars
    }

    #[test]
    fn extract_empty_info_is_all_null() {
        let rec = extract("AAA", &InfoRecord::new(), None, &[], "2026-08-07".parse().unwrap());
        assert_eq!(rec.ticker, "AAA");
        assert_eq!(rec.sector, None);
        assert_eq!(rec.pe, None);
        assert_eq!(rec.current_price, None);
        assert_eq!(rec.upside_to_target_pct, None);
        assert_eq!(rec.month_pct_down, None);
    }

    #[test]
    fn fallback_price_used_when_provider_omits_it() {
        let rec = extract("AAA", &InfoRecord::new(), Some(42.0), &[], "2026-08-07".parse().unwrap());
        assert_eq!(rec.current_price, Some(42.0));
    }

    #[test]
    fn upside_requires_positive_operands() {
        assert_eq!(upside_to_target(Some(100.0), Some(125.0)), Some(25.0));
        assert_eq!(upside_to_target(Some(100.0), Some(-5.0)), None);
        assert_eq!(upside_to_target(Some(0.0), Some(125.0)), None);
        assert_eq!(upside_to_target(None, Some(125.0)), None);
    }

    #[test]
    fn month_down_uses_first_trading_day_open() {
        // Month starts on a weekend: first bar in August is the 3rd
        let today: NaiveDate = "2026-08-07".parse().unwrap();
        let bars = vec![
            bar("2026-07-30", 95.0),
            bar("2026-08-03", 100.0),
            bar("2026-08-04", 98.0),
        ];
        assert_eq!(month_pct_down(&bars, Some(90.0), today), Some(10.0));
    }

    #[test]
    fn month_up_reports_null() {
        let today: NaiveDate = "2026-08-07".parse().unwrap();
        let bars = vec![bar("2026-08-03", 100.0)];
        assert_eq!(month_pct_down(&bars, Some(110.0), today), None);
        assert_eq!(month_pct_down(&bars, Some(100.0), today), None);
    }

    #[test]
    fn month_down_without_month_bars_is_null() {
        let today: NaiveDate = "2026-08-07".parse().unwrap();
        let bars = vec![bar("2026-07-30", 95.0)];
        assert_eq!(month_pct_down(&bars, Some(90.0), today), None);
    }
}
