//! End-to-end tests for fetch -> returns -> alignment through a mock port.

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;
use retviz::domain::error::RetvizError;
use retviz::domain::instruments::{Instrument, parse_instruments};
use retviz::domain::pipeline::build_aligned_table;
use retviz::domain::stats::{CorrelationMatrix, Histogram, Summary};

fn worked_example() -> MockMarketDataPort {
    MockMarketDataPort::new()
        .with_prices(
            "A",
            &[("2021-01-01", 100.0), ("2021-01-02", 110.0), ("2021-01-03", 121.0)],
        )
        .with_prices(
            "B",
            &[("2021-01-01", 50.0), ("2021-01-02", 52.5), ("2021-01-04", 55.0)],
        )
}

#[test]
fn worked_example_aligns_on_shared_date() {
    let port = worked_example();
    let instruments = vec![Instrument::new("A"), Instrument::new("B")];

    let table =
        build_aligned_table(&port, &instruments, date("2021-01-01"), date("2021-12-31")).unwrap();

    assert_eq!(table.index(), &[date("2021-01-02")]);
    assert_eq!(table.columns(), &["A", "B"]);
    let (_, row) = table.row(0).unwrap();
    assert_relative_eq!(row[0], 0.10, epsilon = 1e-9);
    assert_relative_eq!(row[1], 0.05, epsilon = 1e-9);
}

#[test]
fn instruments_are_fetched_in_order() {
    let port = worked_example();
    let instruments = vec![Instrument::new("B"), Instrument::new("A")];

    build_aligned_table(&port, &instruments, date("2021-01-01"), date("2021-12-31")).unwrap();
    assert_eq!(*port.requests.borrow(), vec!["B", "A"]);
}

#[test]
fn three_series_sharing_all_dates() {
    let port = MockMarketDataPort::new()
        .with_prices("SPY", &daily("2022-01-03", &[400.0, 404.0, 402.0, 410.0, 405.0]))
        .with_prices("TLT", &daily("2022-01-03", &[140.0, 139.0, 141.0, 140.5, 142.0]))
        .with_prices("USO", &daily("2022-01-03", &[60.0, 61.2, 59.9, 62.0, 63.1]));
    let instruments = parse_instruments("SPY:Stocks, TLT:Bonds, USO:Oil").unwrap();

    let table =
        build_aligned_table(&port, &instruments, date("2022-01-01"), date("2022-01-31")).unwrap();

    assert_eq!(table.row_count(), 4);
    assert_eq!(table.columns(), &["Stocks", "Bonds", "Oil"]);
    for values in table.column_slices() {
        assert_eq!(values.len(), 4);
        assert!(values.iter().all(|v| v.is_finite()));
    }
    assert!(table.column_at(3).is_none());
    assert_relative_eq!(table.column("Stocks").unwrap()[0], 0.01, epsilon = 1e-9);
    assert_relative_eq!(table.column("Bonds").unwrap()[3], 142.0 / 140.5 - 1.0, epsilon = 1e-12);
}

#[test]
fn range_filters_prices_before_returns() {
    let port = MockMarketDataPort::new()
        .with_prices("A", &daily("2022-01-01", &[10.0, 11.0, 12.0, 13.0, 14.0]))
        .with_prices("B", &daily("2022-01-01", &[20.0, 21.0, 22.0, 23.0, 24.0]));
    let instruments = vec![Instrument::new("A"), Instrument::new("B")];

    let table =
        build_aligned_table(&port, &instruments, date("2022-01-02"), date("2022-01-04")).unwrap();

    // prices d2..d4 give returns on d3, d4
    assert_eq!(table.index(), &[date("2022-01-03"), date("2022-01-04")]);
    assert_relative_eq!(table.column("A").unwrap()[0], 12.0 / 11.0 - 1.0, epsilon = 1e-12);
}

#[test]
fn disjoint_histories_fail_with_empty_intersection() {
    let port = MockMarketDataPort::new()
        .with_prices("A", &daily("2022-01-01", &[10.0, 11.0, 12.0]))
        .with_prices("B", &daily("2022-02-01", &[20.0, 21.0, 22.0]));
    let instruments = vec![Instrument::new("A"), Instrument::new("B")];

    let result = build_aligned_table(&port, &instruments, date("2022-01-01"), date("2022-12-31"));
    assert!(matches!(
        result,
        Err(RetvizError::EmptyIntersection { columns }) if columns == vec!["A", "B"]
    ));
}

#[test]
fn zero_price_mid_series_is_division_by_zero() {
    let port = MockMarketDataPort::new()
        .with_prices("A", &daily("2022-01-01", &[10.0, 0.0, 12.0]))
        .with_prices("B", &daily("2022-01-01", &[20.0, 21.0, 22.0]));
    let instruments = vec![Instrument::new("A"), Instrument::new("B")];

    let result = build_aligned_table(&port, &instruments, date("2022-01-01"), date("2022-12-31"));
    assert!(matches!(
        result,
        Err(RetvizError::DivisionByZero { symbol, date: d }) if symbol == "A" && d == date("2022-01-02")
    ));
}

#[test]
fn provider_error_propagates() {
    let port = worked_example().with_error("B", "connection refused");
    let instruments = vec![Instrument::new("A"), Instrument::new("B")];

    let result = build_aligned_table(&port, &instruments, date("2021-01-01"), date("2021-12-31"));
    assert!(matches!(result, Err(RetvizError::Provider { reason, .. }) if reason == "connection refused"));
}

#[test]
fn missing_symbol_is_unavailable() {
    let port = worked_example();
    let instruments = vec![Instrument::new("A"), Instrument::new("C")];

    let result = build_aligned_table(&port, &instruments, date("2021-01-01"), date("2021-12-31"));
    assert!(matches!(result, Err(RetvizError::DataUnavailable { symbol, .. }) if symbol == "C"));
}

#[test]
fn statistics_over_aligned_table() {
    let port = MockMarketDataPort::new()
        .with_prices("A", &daily("2022-01-01", &[100.0, 102.0, 101.0, 104.0, 103.0, 107.0]))
        .with_prices("B", &daily("2022-01-01", &[50.0, 51.0, 50.5, 52.0, 51.5, 53.5]));
    let instruments = vec![Instrument::new("A"), Instrument::new("B")];
    let table =
        build_aligned_table(&port, &instruments, date("2022-01-01"), date("2022-12-31")).unwrap();

    let summaries = Summary::for_table(&table);
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].1.count, 5);

    let matrix = CorrelationMatrix::compute(&table);
    assert_relative_eq!(matrix.get("A", "A").unwrap(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(
        matrix.get("A", "B").unwrap(),
        matrix.get("B", "A").unwrap(),
        epsilon = 1e-12
    );
    // B is A scaled by one half, so the returns coincide
    assert!(matrix.get("A", "B").unwrap() > 0.99);

    let hist = Histogram::compute(table.column("A").unwrap(), Some(3)).unwrap();
    assert_eq!(hist.counts[0].iter().sum::<usize>(), 5);
}

proptest! {
    #[test]
    fn aligned_rows_are_the_common_return_dates(
        a_prices in prop::collection::vec(1.0f64..500.0, 2..30),
        b_prices in prop::collection::vec(1.0f64..500.0, 2..30),
        offset in 0usize..10,
    ) {
        let b_start = (date("2022-01-01") + chrono::Duration::days(offset as i64))
            .format("%Y-%m-%d")
            .to_string();
        let port = MockMarketDataPort::new()
            .with_prices("A", &daily("2022-01-01", &a_prices))
            .with_prices("B", &daily(&b_start, &b_prices));
        let instruments = vec![Instrument::new("A"), Instrument::new("B")];

        // A returns span days 1..a_len-1, B returns span offset+1..offset+b_len-1
        let lo = offset + 1;
        let hi = (a_prices.len() - 1).min(offset + b_prices.len() - 1);
        let expected = if hi >= lo { hi - lo + 1 } else { 0 };

        let result = build_aligned_table(&port, &instruments, date("2022-01-01"), date("2022-12-31"));
        match result {
            Ok(table) => {
                prop_assert_eq!(table.row_count(), expected);
                prop_assert!(table.index().windows(2).all(|w| w[0] < w[1]));
            }
            Err(RetvizError::EmptyIntersection { .. }) => prop_assert_eq!(expected, 0),
            Err(e) => prop_assert!(false, "unexpected error: {}", e),
        }
    }
}
