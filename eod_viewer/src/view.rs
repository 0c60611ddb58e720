//! Presentation surface: what the UI layer reads after each transition.

use eod_client::models::{Pagination, PriceRecord};
use serde::Serialize;

use crate::{
    pivot::{self, PivotRow},
    state::{FetchState, Phase},
};

/// One line of the chart: which pivot column to plot and how to label it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    /// Ticker symbol.
    pub symbol: String,
    /// Key of this series in every [`PivotRow`].
    pub data_key: String,
    /// Legend label.
    pub label: String,
    /// Stroke colour, cycled from the palette.
    pub color: String,
}

/// Build one series per symbol, cycling through `palette`.
pub fn chart_series(symbols: &[String], palette: &[String]) -> Vec<ChartSeries> {
    symbols
        .iter()
        .enumerate()
        .map(|(idx, symbol)| ChartSeries {
            symbol: symbol.clone(),
            data_key: symbol.clone(),
            label: format!("{symbol} Close Price"),
            color: if palette.is_empty() {
                String::new()
            } else {
                palette[idx % palette.len()].clone()
            },
        })
        .collect()
}

/// Owned copy of everything the UI renders.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Lifecycle phase.
    pub phase: Phase,
    /// Normalised query of the current or pending result.
    pub query: String,
    /// Raw records for the table, in received order.
    pub records: Vec<PriceRecord>,
    /// Paging metadata of the last success.
    pub pagination: Option<Pagination>,
    /// Chart matrix derived from `records`.
    pub pivot: Vec<PivotRow>,
    /// Chart line definitions.
    pub series: Vec<ChartSeries>,
    /// Failure reason, only in `Failed`.
    pub error_message: Option<String>,
}

impl Snapshot {
    /// Capture the current state.
    pub fn capture(state: &FetchState, palette: &[String]) -> Self {
        let records = state.records().to_vec();
        let series = chart_series(&pivot::symbols(&records), palette);
        Self {
            phase: state.phase(),
            query: state.query().to_string(),
            pivot: pivot::pivot(&records),
            records,
            pagination: state.pagination().cloned(),
            series,
            error_message: state.error_message().map(str::to_string),
        }
    }
}

/// A record formatted for tabular display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Ticker symbol.
    pub symbol: String,
    /// `YYYY-MM-DD`, or the raw text if it does not parse.
    pub date: String,
    /// `$x.xx`
    pub open: String,
    /// `$x.xx`
    pub high: String,
    /// `$x.xx`
    pub low: String,
    /// `$x.xx`
    pub close: String,
    /// Thousands-separated.
    pub volume: String,
}

impl From<&PriceRecord> for TableRow {
    fn from(r: &PriceRecord) -> Self {
        Self {
            symbol: r.symbol.clone(),
            date: r
                .calendar_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| r.date.clone()),
            open: format_price(r.open),
            high: format_price(r.high),
            low: format_price(r.low),
            close: format_price(r.close),
            volume: format_volume(r.volume),
        }
    }
}

fn format_price(v: f64) -> String {
    format!("${v:.2}")
}

fn format_volume(v: u64) -> String {
    let digits = v.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

const TABLE_HEADER: [&str; 7] = ["Symbol", "Date", "Open", "High", "Low", "Close", "Volume"];

/// Render records as a left-aligned text table with a header row.
pub fn render_table(records: &[PriceRecord]) -> String {
    let rows: Vec<[String; 7]> = records
        .iter()
        .map(TableRow::from)
        .map(|r| [r.symbol, r.date, r.open, r.high, r.low, r.close, r.volume])
        .collect();

    let mut widths = TABLE_HEADER.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    push_line(&mut out, TABLE_HEADER.iter().copied(), &widths);
    for row in &rows {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Render the pivot matrix as CSV; gaps are empty cells.
pub fn render_pivot_csv(series: &[ChartSeries], rows: &[PivotRow]) -> String {
    let mut out = String::from("date");
    for s in series {
        out.push(',');
        out.push_str(&s.data_key);
    }
    out.push('\n');

    for row in rows {
        out.push_str(&row.date_label());
        for s in series {
            out.push(',');
            if let Some(close) = row.close(&s.data_key) {
                out.push_str(&close.to_string());
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use eod_client::models::EodResponse;

    use super::*;
    use crate::state::RequestToken;

    fn rec(symbol: &str, date: &str, close: f64, volume: u64) -> PriceRecord {
        PriceRecord {
            symbol: symbol.into(),
            exchange: "XNAS".into(),
            date: date.into(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume,
        }
    }

    fn palette() -> Vec<String> {
        vec!["#111111".into(), "#222222".into()]
    }

    #[test]
    fn volume_gets_thousands_separators() {
        assert_eq!(format_volume(0), "0");
        assert_eq!(format_volume(999), "999");
        assert_eq!(format_volume(1_000), "1,000");
        assert_eq!(format_volume(65_603_000), "65,603,000");
    }

    #[test]
    fn table_row_formats_prices_and_date() {
        let row = TableRow::from(&rec("AAPL", "2024-01-15T00:00:00+0000", 183.626, 1234));
        assert_eq!(row.date, "2024-01-15");
        assert_eq!(row.close, "$183.63");
        assert_eq!(row.volume, "1,234");

        let raw = TableRow::from(&rec("AAPL", "garbage", 1.0, 1));
        assert_eq!(raw.date, "garbage");
    }

    #[test]
    fn table_has_header_and_one_line_per_record() {
        let text = render_table(&[rec("AAPL", "2024-01-15", 10.0, 5), rec("MSFT", "2024-01-15", 20.0, 6)]);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Symbol"));
        assert!(lines[1].starts_with("AAPL"));
        assert!(lines[2].contains("$20.00"));
    }

    #[test]
    fn series_cycle_through_palette() {
        let symbols = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let series = chart_series(&symbols, &palette());
        assert_eq!(series[0].color, "#111111");
        assert_eq!(series[2].color, "#111111");
        assert_eq!(series[1].label, "B Close Price");
        assert_eq!(series[1].data_key, "B");
    }

    #[test]
    fn csv_leaves_gaps_empty() {
        let records = [rec("A", "2024-01-01", 1.5, 1), rec("B", "2024-01-02", 2.5, 1)];
        let series = chart_series(&pivot::symbols(&records), &palette());
        let csv = render_pivot_csv(&series, &pivot::pivot(&records));
        assert_eq!(csv, "date,A,B\n2024-01-01,1.5,\n2024-01-02,,2.5\n");
    }

    #[test]
    fn snapshot_derives_pivot_from_records() {
        let mut state = FetchState::default();
        state.begin("A, B".into(), RequestToken(1));
        state.succeed(EodResponse {
            pagination: Pagination::single_page(4),
            data: vec![
                rec("A", "2024-01-01", 1.0, 1),
                rec("B", "2024-01-01", 2.0, 1),
                rec("A", "2024-01-02", 3.0, 1),
                rec("B", "2024-01-02", 4.0, 1),
            ],
        });

        let snap = Snapshot::capture(&state, &palette());
        assert_eq!(snap.phase, Phase::Success);
        assert_eq!(snap.records.len(), 4);
        assert_eq!(snap.pivot.len(), 2);
        assert_eq!(snap.series.len(), 2);
        assert_eq!(snap.pagination.as_ref().map(|p| p.total), Some(4));
        assert_eq!(snap.error_message, None);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["phase"], "success");
        assert_eq!(json["pivot"][1]["B"], 4.0);
    }
}
