//! Filter/sort engine over column-indexed [`Row`]s.
//!
//! Works on any table whose schema is given as a [`Column`] slice: the message
//! table, the all-signals table and the inspector's signal table share it.
//! Filtering keeps the input order; sorting is stable.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ViewConfig;
use crate::types::errors::ViewError;
use crate::view::table::{Column, ColumnKind, Row};

/// Per-column matcher. Both variants are case-insensitive.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Predicate {
    /// Cell contains the text. Empty text matches everything.
    Text(String),
    /// Cell equals the value (case-insensitive). The configured "All" sentinel, in any
    /// case, or empty, matches everything.
    Choice(String),
}

impl Predicate {
    /// The predicate kind a column expects.
    pub fn for_column(column: &Column, value: &str) -> Predicate {
        match column.kind {
            ColumnKind::Choice => Predicate::Choice(value.to_string()),
            _ => Predicate::Text(value.to_string()),
        }
    }

    fn is_unconstrained(&self, config: &ViewConfig) -> bool {
        match self {
            Predicate::Text(text) => text.is_empty(),
            Predicate::Choice(value) => {
                value.is_empty() || value.to_lowercase() == config.all_sentinel.to_lowercase()
            }
        }
    }

    fn matches(&self, cell: &str) -> bool {
        match self {
            Predicate::Text(text) => cell.to_lowercase().contains(&text.to_lowercase()),
            Predicate::Choice(value) => cell.to_lowercase() == value.to_lowercase(),
        }
    }
}

/// Active predicates keyed by column index.
#[derive(Default, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Filters {
    predicates: BTreeMap<usize, Predicate>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the predicate of `column`.
    pub fn set(&mut self, column: usize, predicate: Predicate) {
        self.predicates.insert(column, predicate);
    }

    pub fn clear(&mut self, column: usize) -> Option<Predicate> {
        self.predicates.remove(&column)
    }

    pub fn clear_all(&mut self) {
        self.predicates.clear();
    }

    pub fn get(&self, column: usize) -> Option<&Predicate> {
        self.predicates.get(&column)
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Predicate)> + '_ {
        self.predicates.iter().map(|(&c, p)| (c, p))
    }
}

#[derive(Default, Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Active sort of one table.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

impl SortState {
    /// Sort state after a sort request on `column`: a new column starts ascending,
    /// repeated requests on the same column alternate.
    pub fn request(previous: Option<SortState>, column: usize) -> SortState {
        match previous {
            Some(prev) if prev.column == column => SortState {
                column,
                direction: prev.direction.toggled(),
            },
            _ => SortState {
                column,
                direction: SortDirection::Ascending,
            },
        }
    }
}

pub(crate) fn check_column(columns: &[Column], column: usize) -> Result<(), ViewError> {
    if column >= columns.len() {
        return Err(ViewError::InvalidColumn {
            column,
            columns: columns.len(),
        });
    }
    Ok(())
}

/// Rows matching every constrained predicate, in input order.
///
/// # Errors
/// [`ViewError::InvalidColumn`] if a predicate targets a column outside `columns`.
pub fn filter_rows(
    rows: &[Row],
    columns: &[Column],
    filters: &Filters,
    config: &ViewConfig,
) -> Result<Vec<Row>, ViewError> {
    let mut active: Vec<(usize, &Predicate)> = Vec::new();
    for (column, predicate) in filters.iter() {
        check_column(columns, column)?;
        if !predicate.is_unconstrained(config) {
            active.push((column, predicate));
        }
    }

    let out: Vec<Row> = rows
        .iter()
        .filter(|row| active.iter().all(|(c, p)| p.matches(row.cell(*c))))
        .cloned()
        .collect();
    debug!(input = rows.len(), output = out.len(), predicates = active.len(), "rows filtered");
    Ok(out)
}

/// Orders two cells of a column of kind `kind`.
pub fn compare_cells(kind: ColumnKind, a: &str, b: &str) -> Ordering {
    match kind {
        ColumnKind::Hex => hex_value(a).cmp(&hex_value(b)),
        ColumnKind::Number => number_value(a).total_cmp(&number_value(b)),
        ColumnKind::Text | ColumnKind::Choice => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

fn hex_value(cell: &str) -> u64 {
    let t: &str = cell.trim();
    let t: &str = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    u64::from_str_radix(t, 16).unwrap_or(0)
}

fn number_value(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(0.0)
}

/// Stable sort of `rows` in place.
pub fn sort_rows(rows: &mut [Row], columns: &[Column], sort: SortState) -> Result<(), ViewError> {
    check_column(columns, sort.column)?;
    let kind: ColumnKind = columns[sort.column].kind;
    let column: usize = sort.column;

    match sort.direction {
        SortDirection::Ascending => {
            rows.sort_by(|a, b| compare_cells(kind, a.cell(column), b.cell(column)))
        }
        SortDirection::Descending => {
            rows.sort_by(|a, b| compare_cells(kind, b.cell(column), a.cell(column)))
        }
    }
    debug!(column, direction = ?sort.direction, rows = rows.len(), "rows sorted");
    Ok(())
}

/// Filter, then re-apply `sort` (if any) to the filtered rows.
pub fn apply(
    rows: &[Row],
    columns: &[Column],
    filters: &Filters,
    sort: Option<SortState>,
    config: &ViewConfig,
) -> Result<Vec<Row>, ViewError> {
    let mut out: Vec<Row> = filter_rows(rows, columns, filters, config)?;
    if let Some(sort) = sort {
        sort_rows(&mut out, columns, sort)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::engine_brake_db;
    use crate::view::table::{MESSAGE_COLUMNS, RowKind, RowOrigin, project_messages};
    use slotmap::KeyData;

    fn plain_rows(cells: &[&[&str]]) -> Vec<Row> {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| Row {
                cells: c.iter().map(|s| s.to_string()).collect(),
                origin: RowOrigin::Message(KeyData::from_ffi(i as u64 + 1).into()),
                kind: RowKind::Primary,
            })
            .collect()
    }

    fn first_cells(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.cell(0)).collect()
    }

    #[test]
    fn test_filter_by_name() {
        let db = engine_brake_db();
        let config: ViewConfig = ViewConfig::default();
        let rows: Vec<Row> = project_messages(&db, &config);

        let mut filters: Filters = Filters::new();
        filters.set(1, Predicate::Text("eng".into()));
        let out: Vec<Row> = filter_rows(&rows, &MESSAGE_COLUMNS, &filters, &config).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].cell(1), "Engine");

        // idempotent
        let again: Vec<Row> = filter_rows(&out, &MESSAGE_COLUMNS, &filters, &config).unwrap();
        assert_eq!(again, out);
    }

    #[test]
    fn test_filter_and_choice_sentinel() {
        let config: ViewConfig = ViewConfig::default();
        let rows: Vec<Row> = plain_rows(&[&["a", "Yes"], &["b", "No"], &["ab", "yes"]]);
        let columns = [
            Column { title: "Name", kind: ColumnKind::Text },
            Column { title: "Flag", kind: ColumnKind::Choice },
        ];

        let mut filters: Filters = Filters::new();
        filters.set(1, Predicate::Choice("All".into()));
        filters.set(0, Predicate::Text(String::new()));
        assert_eq!(filter_rows(&rows, &columns, &filters, &config).unwrap().len(), 3);

        filters.set(1, Predicate::Choice("YES".into()));
        assert_eq!(
            first_cells(&filter_rows(&rows, &columns, &filters, &config).unwrap()),
            vec!["a", "ab"]
        );

        // AND of both predicates
        filters.set(0, Predicate::Text("B".into()));
        assert_eq!(
            first_cells(&filter_rows(&rows, &columns, &filters, &config).unwrap()),
            vec!["ab"]
        );

        // choice is exact, not substring
        filters.clear(0);
        filters.set(1, Predicate::Choice("Ye".into()));
        assert!(filter_rows(&rows, &columns, &filters, &config).unwrap().is_empty());

        assert!(filter_rows(&[], &columns, &filters, &config).unwrap().is_empty());
    }

    #[test]
    fn test_all_sentinel_ignores_case() {
        let db = engine_brake_db();
        let config: ViewConfig = ViewConfig::default();
        let rows: Vec<Row> = project_messages(&db, &config);

        for sentinel in ["all", "ALL", "All"] {
            let mut filters: Filters = Filters::new();
            filters.set(4, Predicate::Choice(sentinel.into()));
            assert_eq!(filter_rows(&rows, &MESSAGE_COLUMNS, &filters, &config).unwrap().len(), 2);
        }
    }

    #[test]
    fn test_invalid_column() {
        let config: ViewConfig = ViewConfig::default();
        let mut filters: Filters = Filters::new();
        filters.set(9, Predicate::Text(String::new()));
        assert_eq!(
            filter_rows(&[], &MESSAGE_COLUMNS, &filters, &config).unwrap_err(),
            ViewError::InvalidColumn { column: 9, columns: 9 }
        );

        let sort: SortState = SortState::request(None, 12);
        assert!(matches!(
            sort_rows(&mut [], &MESSAGE_COLUMNS, sort),
            Err(ViewError::InvalidColumn { column: 12, .. })
        ));
    }

    #[test]
    fn test_hex_sort_is_numeric() {
        let mut rows: Vec<Row> = plain_rows(&[&["0x64"], &["0xA"], &["0x3E8"]]);
        let columns = [Column { title: "ID", kind: ColumnKind::Hex }];
        sort_rows(&mut rows, &columns, SortState::request(None, 0)).unwrap();
        assert_eq!(first_cells(&rows), vec!["0xA", "0x64", "0x3E8"]);
    }

    #[test]
    fn test_number_sort_and_unparsable_cells() {
        let mut rows: Vec<Row> = plain_rows(&[&["10"], &["N/A"], &["-2.5"], &["2"]]);
        let columns = [Column { title: "Cycle", kind: ColumnKind::Number }];
        sort_rows(&mut rows, &columns, SortState::request(None, 0)).unwrap();
        assert_eq!(first_cells(&rows), vec!["-2.5", "N/A", "2", "10"]);
    }

    #[test]
    fn test_descending_reverses_ascending() {
        let rows: Vec<Row> = plain_rows(&[&["delta"], &["Alpha"], &["charlie"], &["Bravo"]]);
        let columns = [Column { title: "Name", kind: ColumnKind::Text }];

        let mut asc: Vec<Row> = rows.clone();
        let first: SortState = SortState::request(None, 0);
        sort_rows(&mut asc, &columns, first).unwrap();
        assert_eq!(first_cells(&asc), vec!["Alpha", "Bravo", "charlie", "delta"]);

        let mut desc: Vec<Row> = rows.clone();
        let second: SortState = SortState::request(Some(first), 0);
        assert_eq!(second.direction, SortDirection::Descending);
        sort_rows(&mut desc, &columns, second).unwrap();

        asc.reverse();
        assert_eq!(desc, asc);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut rows: Vec<Row> = plain_rows(&[&["b", "1"], &["a", "2"], &["B", "3"], &["a", "4"]]);
        let columns = [
            Column { title: "Name", kind: ColumnKind::Text },
            Column { title: "Seq", kind: ColumnKind::Number },
        ];
        sort_rows(&mut rows, &columns, SortState::request(None, 0)).unwrap();
        let seq: Vec<&str> = rows.iter().map(|r| r.cell(1)).collect();
        assert_eq!(seq, vec!["2", "4", "1", "3"]);
    }

    #[test]
    fn test_sort_request_toggles_per_column() {
        let a: SortState = SortState::request(None, 1);
        let b: SortState = SortState::request(Some(a), 1);
        let c: SortState = SortState::request(Some(b), 1);
        let d: SortState = SortState::request(Some(c), 2);
        assert_eq!(a.direction, SortDirection::Ascending);
        assert_eq!(b.direction, SortDirection::Descending);
        assert_eq!(c.direction, SortDirection::Ascending);
        assert_eq!(d, SortState { column: 2, direction: SortDirection::Ascending });
    }

    #[test]
    fn test_apply_filters_then_sorts() {
        let config: ViewConfig = ViewConfig::default();
        let rows: Vec<Row> = plain_rows(&[&["ab"], &["b"], &["aa"], &["c"]]);
        let columns = [Column { title: "Name", kind: ColumnKind::Text }];
        let mut filters: Filters = Filters::new();
        filters.set(0, Predicate::Text("a".into()));

        let sort: SortState = SortState::request(None, 0);
        let out: Vec<Row> = apply(&rows, &columns, &filters, Some(sort), &config).unwrap();
        assert_eq!(first_cells(&out), vec!["aa", "ab"]);
    }
}
