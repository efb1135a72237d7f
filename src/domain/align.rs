//! Inner-join alignment of return series on the date key.

use crate::domain::error::RetvizError;
use crate::domain::returns::ReturnSeries;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Date-indexed table of returns, one column per instrument.
///
/// Every row holds a value for every column. Values are stored column-major:
/// `values[column][row]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    columns: Vec<String>,
    index: Vec<NaiveDate>,
    values: Vec<Vec<f64>>,
}

impl AlignedTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i].as_slice())
    }

    pub fn column_at(&self, i: usize) -> Option<&[f64]> {
        self.values.get(i).map(Vec::as_slice)
    }

    /// Every column's values, in column order.
    pub fn column_slices(&self) -> Vec<&[f64]> {
        self.values.iter().map(Vec::as_slice).collect()
    }

    pub fn row(&self, i: usize) -> Option<(NaiveDate, Vec<f64>)> {
        let date = *self.index.get(i)?;
        Some((date, self.values.iter().map(|col| col[i]).collect()))
    }

    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, Vec<f64>)> + '_ {
        (0..self.row_count()).filter_map(|i| self.row(i))
    }

    /// First `n` rows (all rows if the table is shorter).
    pub fn head(&self, n: usize) -> AlignedTable {
        let n = n.min(self.row_count());
        AlignedTable {
            columns: self.columns.clone(),
            index: self.index[..n].to_vec(),
            values: self.values.iter().map(|col| col[..n].to_vec()).collect(),
        }
    }

    /// Sub-table with the named columns in the requested order.
    pub fn select(&self, names: &[&str]) -> Result<AlignedTable, RetvizError> {
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(names.len());
        let mut values = Vec::with_capacity(names.len());

        for &name in names {
            if !seen.insert(name) {
                return Err(RetvizError::DuplicateColumn {
                    name: name.to_string(),
                });
            }
            let col = self.column(name).ok_or_else(|| RetvizError::InvalidOption {
                option: "column".into(),
                reason: format!("unknown column {name}"),
            })?;
            columns.push(name.to_string());
            values.push(col.to_vec());
        }

        Ok(AlignedTable {
            columns,
            index: self.index.clone(),
            values,
        })
    }
}

/// Aligns named return series on the dates common to all of them.
///
/// Column order follows the order of `series`. At least two series are
/// required and their names must be unique.
pub fn align(series: Vec<(String, ReturnSeries)>) -> Result<AlignedTable, RetvizError> {
    if series.len() < 2 {
        return Err(RetvizError::TooFewSeries {
            count: series.len(),
        });
    }

    let mut names = HashSet::new();
    for (name, _) in &series {
        if !names.insert(name.as_str()) {
            return Err(RetvizError::DuplicateColumn { name: name.clone() });
        }
    }

    let mut common: BTreeSet<NaiveDate> = series[0].1.dates().collect();
    for (_, s) in &series[1..] {
        let dates: HashSet<NaiveDate> = s.dates().collect();
        common.retain(|d| dates.contains(d));
    }

    if common.is_empty() {
        return Err(RetvizError::EmptyIntersection {
            columns: series.into_iter().map(|(name, _)| name).collect(),
        });
    }

    let index: Vec<NaiveDate> = common.into_iter().collect();
    let mut columns = Vec::with_capacity(series.len());
    let mut values = Vec::with_capacity(series.len());

    for (name, s) in series {
        let by_date: HashMap<NaiveDate, f64> = s.points.iter().map(|p| (p.date, p.value)).collect();
        values.push(index.iter().map(|d| by_date[d]).collect());
        columns.push(name);
    }

    Ok(AlignedTable {
        columns,
        index,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::returns::ReturnPoint;
    use approx::assert_relative_eq;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 3, day).unwrap()
    }

    fn returns(symbol: &str, points: &[(u32, f64)]) -> ReturnSeries {
        ReturnSeries {
            symbol: symbol.to_string(),
            points: points
                .iter()
                .map(|&(day, value)| ReturnPoint {
                    date: date(day),
                    value,
                })
                .collect(),
        }
    }

    #[test]
    fn keeps_only_common_dates() {
        let a = returns("A", &[(1, 0.01), (2, 0.02), (3, 0.03)]);
        let b = returns("B", &[(2, 0.20), (3, 0.30), (4, 0.40)]);

        let table = align(vec![("A".into(), a), ("B".into(), b)]).unwrap();

        assert_eq!(table.index(), &[date(2), date(3)]);
        assert_eq!(table.column("A").unwrap(), &[0.02, 0.03]);
        assert_eq!(table.column("B").unwrap(), &[0.20, 0.30]);
    }

    #[test]
    fn column_order_follows_input() {
        let a = returns("A", &[(1, 0.01)]);
        let b = returns("B", &[(1, 0.02)]);
        let c = returns("C", &[(1, 0.03)]);

        let table = align(vec![
            ("C".into(), c),
            ("A".into(), a),
            ("B".into(), b),
        ])
        .unwrap();

        assert_eq!(table.columns(), &["C", "A", "B"]);
        assert_eq!(table.row(0).unwrap().1, vec![0.03, 0.01, 0.02]);
    }

    #[test]
    fn display_names_replace_symbols() {
        let spy = returns("SPY", &[(1, 0.01)]);
        let tlt = returns("TLT", &[(1, -0.01)]);

        let table = align(vec![("Stocks".into(), spy), ("Bonds".into(), tlt)]).unwrap();

        assert_eq!(table.columns(), &["Stocks", "Bonds"]);
        assert!(table.column("SPY").is_none());
    }

    #[test]
    fn disjoint_dates_fail() {
        let a = returns("A", &[(1, 0.01), (2, 0.02)]);
        let b = returns("B", &[(3, 0.03), (4, 0.04)]);

        let result = align(vec![("A".into(), a), ("B".into(), b)]);
        assert!(matches!(
            result,
            Err(RetvizError::EmptyIntersection { columns }) if columns == vec!["A", "B"]
        ));
    }

    #[test]
    fn empty_series_gives_empty_intersection() {
        let a = returns("A", &[(1, 0.01)]);
        let b = returns("B", &[]);

        let result = align(vec![("A".into(), a), ("B".into(), b)]);
        assert!(matches!(result, Err(RetvizError::EmptyIntersection { .. })));
    }

    #[test]
    fn single_series_rejected() {
        let a = returns("A", &[(1, 0.01)]);
        let result = align(vec![("A".into(), a)]);
        assert!(matches!(result, Err(RetvizError::TooFewSeries { count: 1 })));
    }

    #[test]
    fn duplicate_names_rejected() {
        let a = returns("A", &[(1, 0.01)]);
        let b = returns("B", &[(1, 0.02)]);
        let result = align(vec![("X".into(), a), ("X".into(), b)]);
        assert!(matches!(result, Err(RetvizError::DuplicateColumn { name }) if name == "X"));
    }

    #[test]
    fn row_set_is_order_independent() {
        let a = returns("A", &[(1, 0.1), (2, 0.2), (5, 0.5)]);
        let b = returns("B", &[(2, 0.2), (5, 0.5), (6, 0.6)]);
        let c = returns("C", &[(5, 0.5), (2, 0.2), (9, 0.9)]);

        let abc = align(vec![
            ("A".into(), a.clone()),
            ("B".into(), b.clone()),
            ("C".into(), c.clone()),
        ])
        .unwrap();
        let cab = align(vec![("C".into(), c), ("A".into(), a), ("B".into(), b)]).unwrap();

        assert_eq!(abc.index(), cab.index());
        assert_eq!(abc.index(), &[date(2), date(5)]);
        assert_eq!(cab.columns(), &["C", "A", "B"]);
    }

    #[test]
    fn head_truncates_rows() {
        let a = returns("A", &[(1, 0.1), (2, 0.2), (3, 0.3)]);
        let b = returns("B", &[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let table = align(vec![("A".into(), a), ("B".into(), b)]).unwrap();

        let head = table.head(2);
        assert_eq!(head.row_count(), 2);
        assert_eq!(head.column("B").unwrap(), &[1.0, 2.0]);
        assert_eq!(table.head(10).row_count(), 3);
    }

    #[test]
    fn select_reorders_and_subsets() {
        let a = returns("SPY", &[(1, 0.1), (2, 0.2)]);
        let b = returns("TLT", &[(1, 1.0), (2, 2.0)]);
        let c = returns("USO", &[(1, 3.0), (2, 4.0)]);
        let table = align(vec![
            ("SPY".into(), a),
            ("TLT".into(), b),
            ("USO".into(), c),
        ])
        .unwrap();

        let sub = table.select(&["TLT", "SPY"]).unwrap();
        assert_eq!(sub.columns(), &["TLT", "SPY"]);
        assert_eq!(sub.column_at(0), Some(&[1.0, 2.0][..]));
        assert_eq!(sub.column_at(2), None);
        assert_eq!(sub.index(), table.index());

        assert!(table.select(&["XLE"]).is_err());
        assert!(matches!(
            table.select(&["SPY", "SPY"]),
            Err(RetvizError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn rows_iterates_in_date_order() {
        let a = returns("A", &[(3, 0.3), (1, 0.1)]);
        let b = returns("B", &[(1, 1.0), (3, 3.0)]);
        let table = align(vec![("A".into(), a), ("B".into(), b)]).unwrap();

        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, date(1));
        assert_relative_eq!(rows[1].1[0], 0.3);
    }
}
