use crate::indicators::{pct_return, round2, rsi_last, sma_last, trailing_extremes};
use screener_core::IndicatorSnapshot;

const RSI_PERIOD: usize = 14;
const MA_WINDOWS: [usize; 3] = [20, 50, 200];
const RETURN_WINDOWS: [usize; 5] = [1, 5, 21, 63, 126];
/// Trading days in a 52-week window.
const YEAR_WINDOW: usize = 252;

/// Compute the full technical snapshot over a daily close series.
///
/// Pure function: every output is `None` when the series is too short for
/// its window, and comparison booleans are `None` when either operand is.
pub fn compute(closes: &[f64]) -> IndicatorSnapshot {
    let price = closes.last().copied();

    let ma_20 = sma_last(closes, MA_WINDOWS[0]).map(round2);
    let ma_50 = sma_last(closes, MA_WINDOWS[1]).map(round2);
    let ma_200 = sma_last(closes, MA_WINDOWS[2]).map(round2);

    let extremes = trailing_extremes(closes, YEAR_WINDOW);
    let high_52w = extremes.map(|(h, _)| round2(h));
    let low_52w = extremes.map(|(_, l)| round2(l));

    let distance_from_52w_high_pct = match (high_52w, price) {
        (Some(high), Some(p)) if p > 0.0 => Some(round2((high - p) / p * 100.0)),
        _ => None,
    };
    let distance_from_52w_low_pct = match (low_52w, price) {
        (Some(low), Some(p)) if p > 0.0 => Some(round2((p - low) / p * 100.0)),
        _ => None,
    };

    let mut rets = RETURN_WINDOWS
        .iter()
        .map(|&n| pct_return(closes, n).map(round2));
    let ret_1d_pct = rets.next().unwrap();
    let ret_5d_pct = rets.next().unwrap();
    let ret_21d_pct = rets.next().unwrap();
    let ret_63d_pct = rets.next().unwrap();
    let ret_126d_pct = rets.next().unwrap();

    IndicatorSnapshot {
        rsi_14: rsi_last(closes, RSI_PERIOD).map(round2),
        ma_20,
        ma_50,
        ma_200,
        price_above_ma20: gt(price, ma_20),
        price_above_ma50: gt(price, ma_50),
        price_above_ma200: gt(price, ma_200),
        ma20_above_ma50: gt(ma_20, ma_50),
        ma50_above_ma200: gt(ma_50, ma_200),
        high_52w,
        low_52w,
        distance_from_52w_high_pct,
        distance_from_52w_low_pct,
        ret_1d_pct,
        ret_5d_pct,
        ret_21d_pct,
        ret_63d_pct,
        ret_126d_pct,
    }
}

/// Strict `>` lifted over nullable operands.
fn gt(a: Option<f64>, b: Option<f64>) -> Option<bool> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a > b),
        _ => None,
    }
}
