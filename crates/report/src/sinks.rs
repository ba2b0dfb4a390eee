use screener_core::{ReportRow, ScreenError};
use std::path::Path;

/// Write the sorted rows to the results CSV.
///
/// The header derives from the row schema; every row carries the same
/// key set and the writer quotes per RFC 4180. Nulls become empty cells.
pub fn write_results_csv(path: &Path, rows: &[ReportRow]) -> Result<(), ScreenError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| ScreenError::SinkFailure(format!("open {}: {}", path.display(), e)))?;

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| ScreenError::SinkFailure(format!("write row: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| ScreenError::SinkFailure(format!("flush {}: {}", path.display(), e)))?;
    tracing::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write the compact watchlist CSV: Ticker, Price, 1D, 5D, 1M, 6M.
/// Missing values are reported as N/A.
pub fn write_watchlist_csv(path: &Path, rows: &[ReportRow]) -> Result<(), ScreenError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| ScreenError::SinkFailure(format!("open {}: {}", path.display(), e)))?;

    writer
        .write_record(["Ticker", "Price", "1D", "5D", "1M", "6M"])
        .map_err(|e| ScreenError::SinkFailure(format!("write header: {}", e)))?;

    for row in rows {
        writer
            .write_record([
                row.ticker.clone(),
                cell(row.current_price),
                cell(row.ret_1d_pct),
                cell(row.ret_5d_pct),
                cell(row.ret_21d_pct),
                cell(row.ret_126d_pct),
            ])
            .map_err(|e| ScreenError::SinkFailure(format!("write row: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| ScreenError::SinkFailure(format!("flush {}: {}", path.display(), e)))?;
    tracing::info!("Wrote watchlist for {} tickers to {}", rows.len(), path.display());
    Ok(())
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "N/A".to_string(),
    }
}
