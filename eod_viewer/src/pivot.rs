//! Reshape flat per-symbol, per-date records into a date-aligned matrix.
//!
//! Output has one [`PivotRow`] per distinct calendar date, ascending, and one
//! column per distinct symbol in first-seen order. Every row carries every
//! symbol key; a symbol with no observation on that date gets `None`
//! (serialised as `null`), which a chart must draw as a gap, not a zero.
//!
//! Built in one pass over the input: a `(symbol, date) -> close` lookup where a
//! later record for the same key overwrites an earlier one, a sorted date set,
//! and an insertion-ordered symbol set. The input is never mutated and need
//! not be sorted.
//!
//! Records whose date text cannot be parsed are skipped (logged at `warn`).
//! Their symbol still gets a column so the column set always equals the
//! symbols of the result.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use eod_client::models::PriceRecord;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::warn;

/// One date of the chart matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    /// Calendar date, serialised as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Close price per symbol, `None` where the symbol has no record.
    #[serde(flatten)]
    pub closes: IndexMap<String, Option<f64>>,
}

impl PivotRow {
    /// `YYYY-MM-DD` label for axis ticks.
    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Close for `symbol` on this date, `None` for a gap or an unknown symbol.
    pub fn close(&self, symbol: &str) -> Option<f64> {
        self.closes.get(symbol).copied().flatten()
    }
}

/// Distinct symbols in first-seen order.
pub fn symbols(records: &[PriceRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.symbol.as_str())
        .collect::<IndexSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Pivot `records` into date-ordered rows. Pure and deterministic.
pub fn pivot(records: &[PriceRecord]) -> Vec<PivotRow> {
    let mut symbols: IndexSet<&str> = IndexSet::new();
    let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut closes: HashMap<(&str, NaiveDate), f64> = HashMap::with_capacity(records.len());

    for record in records {
        symbols.insert(record.symbol.as_str());

        let Some(date) = record.calendar_date() else {
            warn!(
                symbol = %record.symbol,
                date = %record.date,
                "skipping record with unparseable date"
            );
            continue;
        };

        dates.insert(date);
        closes.insert((record.symbol.as_str(), date), record.close);
    }

    dates
        .into_iter()
        .map(|date| PivotRow {
            date,
            closes: symbols
                .iter()
                .map(|&symbol| (symbol.to_string(), closes.get(&(symbol, date)).copied()))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn rec(symbol: &str, date: &str, close: f64) -> PriceRecord {
        PriceRecord {
            symbol: symbol.into(),
            exchange: "XNAS".into(),
            date: date.into(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(pivot(&[]).is_empty());
        assert!(symbols(&[]).is_empty());
    }

    #[test]
    fn single_record_gives_single_cell() {
        let rows = pivot(&[rec("AAPL", "2024-01-15", 183.63)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].closes.len(), 1);
        assert_eq!(rows[0].close("AAPL"), Some(183.63));
    }

    #[test]
    fn disjoint_dates_produce_null_gaps() {
        let rows = pivot(&[rec("A", "2024-01-01", 10.5), rec("B", "2024-01-02", 20.25)]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, ymd(2024, 1, 1));
        assert_eq!(rows[0].closes.get("A"), Some(&Some(10.5)));
        assert_eq!(rows[0].closes.get("B"), Some(&None));
        assert_eq!(rows[1].date, ymd(2024, 1, 2));
        assert_eq!(rows[1].closes.get("A"), Some(&None));
        assert_eq!(rows[1].closes.get("B"), Some(&Some(20.25)));
    }

    #[test]
    fn later_duplicate_wins() {
        let rows = pivot(&[
            rec("X", "2024-01-15", 1.0),
            rec("Y", "2024-01-15", 5.0),
            rec("X", "2024-01-15T00:00:00+0000", 2.0),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].close("X"), Some(2.0));
        assert_eq!(rows[0].close("Y"), Some(5.0));
    }

    #[test]
    fn rows_follow_calendar_order_not_input_order() {
        let rows = pivot(&[
            rec("A", "2024-03-01", 3.0),
            rec("A", "2024-01-15", 1.0),
            rec("A", "2024-02-10", 2.0),
        ]);
        let labels: Vec<_> = rows.iter().map(PivotRow::date_label).collect();
        assert_eq!(labels, vec!["2024-01-15", "2024-02-10", "2024-03-01"]);
    }

    #[test]
    fn mixed_timestamp_formats_share_a_bucket() {
        let rows = pivot(&[
            rec("A", "2024-01-15T00:00:00+0000", 1.0),
            rec("B", "2024-01-15", 2.0),
            rec("C", "2024-01-15T00:00:00Z", 3.0),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].closes.len(), 3);
    }

    #[test]
    fn malformed_date_is_skipped_but_symbol_keeps_its_column() {
        let rows = pivot(&[rec("A", "2024-01-15", 1.0), rec("B", "not a date", 2.0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].closes.get("B"), Some(&None));
        assert_eq!(symbols(&[rec("A", "x", 1.0), rec("B", "y", 1.0)]), vec!["A", "B"]);
    }

    #[test]
    fn columns_keep_first_seen_order() {
        let rows = pivot(&[
            rec("MSFT", "2024-01-16", 1.0),
            rec("AAPL", "2024-01-15", 2.0),
            rec("MSFT", "2024-01-15", 3.0),
        ]);
        for row in &rows {
            assert_eq!(row.closes.keys().collect::<Vec<_>>(), vec!["MSFT", "AAPL"]);
        }
    }

    #[test]
    fn input_is_left_untouched() {
        let input = vec![rec("A", "2024-02-01", 1.0), rec("A", "2024-01-01", 2.0)];
        let copy = input.clone();
        let _ = pivot(&input);
        assert_eq!(input, copy);
    }

    #[test]
    fn snapshot_pivot_rows() {
        let rows = pivot(&[
            rec("AAPL", "2024-01-16T00:00:00+0000", 185.5),
            rec("MSFT", "2024-01-15T00:00:00+0000", 390.25),
            rec("AAPL", "2024-01-15T00:00:00+0000", 183.75),
        ]);
        insta::assert_json_snapshot!("pivot_rows", rows);
    }

    fn arb_records() -> impl Strategy<Value = Vec<PriceRecord>> {
        proptest::collection::vec(
            (
                prop::sample::select(vec!["AAPL", "MSFT", "IBM", "TSLA"]),
                0u32..40,
                1.0f64..500.0,
            ),
            0..60,
        )
        .prop_map(|items| {
            items
                .into_iter()
                .map(|(symbol, offset, close)| {
                    let date = ymd(2024, 1, 1) + chrono::Days::new(u64::from(offset));
                    rec(symbol, &date.format("%Y-%m-%d").to_string(), close)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn shape_matches_distinct_dates_and_symbols(records in arb_records()) {
            let rows = pivot(&records);
            let distinct_dates: BTreeSet<_> = records.iter().filter_map(PriceRecord::calendar_date).collect();
            let cols = symbols(&records);

            prop_assert_eq!(rows.len(), distinct_dates.len());
            for row in &rows {
                let keys: Vec<_> = row.closes.keys().cloned().collect();
                prop_assert_eq!(&keys, &cols);
                // every row has at least one observation
                prop_assert!(row.closes.values().any(Option::is_some));
            }
            prop_assert!(rows.windows(2).all(|w| w[0].date < w[1].date));
        }

        #[test]
        fn pivot_is_deterministic(records in arb_records()) {
            prop_assert_eq!(pivot(&records), pivot(&records));
        }

        #[test]
        fn cell_equals_last_matching_record(records in arb_records()) {
            let rows = pivot(&records);
            for row in &rows {
                for (symbol, cell) in &row.closes {
                    let expected = records
                        .iter()
                        .rev()
                        .find(|r| &r.symbol == symbol && r.calendar_date() == Some(row.date))
                        .map(|r| r.close);
                    prop_assert_eq!(*cell, expected);
                }
            }
        }
    }
}
