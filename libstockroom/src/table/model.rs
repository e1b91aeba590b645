use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::filter::{FilterValue, SearchType};

/// Stable row identity for selection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
pub struct TableRowId(pub u64);

/// Column identity, unique within one table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(pub String);

impl ColumnId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ColumnId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ColumnId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A caller-defined record. The engine only ever reads it through column
/// accessors; the id is what selection remembers.
pub trait TableRecord {
    fn row_id(&self) -> TableRowId;
}

/// Value produced by a column accessor for one row.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum CellValue {
    #[display("")]
    Empty,
    #[display("{_0}")]
    Text(String),
    #[display("{_0}")]
    Number(f64),
    #[display("{_0}")]
    Date(NaiveDate),
    #[display("{_0}")]
    Bool(bool),
}

impl CellValue {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => parse_number(text),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Date(_) => 1,
            Self::Text(_) => 2,
            Self::Bool(_) => 3,
            Self::Empty => 4,
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// Orders cells for sorting: numbers, dates, text, booleans, then empty
/// cells. Text compares naturally so "bin 9" sorts before "bin 10".
pub(crate) fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    let rank = a.rank().cmp(&b.rank());
    if rank != Ordering::Equal {
        return rank;
    }

    match (a, b) {
        (CellValue::Number(left), CellValue::Number(right)) => left.total_cmp(right),
        (CellValue::Date(left), CellValue::Date(right)) => left.cmp(right),
        (CellValue::Text(left), CellValue::Text(right)) => {
            numeric_sort::cmp(&left.to_lowercase(), &right.to_lowercase())
        }
        (CellValue::Bool(left), CellValue::Bool(right)) => left.cmp(right),
        _ => Ordering::Equal,
    }
}

/// Filter metadata attached to a column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMeta {
    pub search_type: SearchType,
    /// Allowed values for [`SearchType::Select`] columns.
    pub options: Vec<String>,
}

pub type CellAccessor<R> = Arc<dyn Fn(&R) -> CellValue + Send + Sync>;

pub struct ColumnDefinition<R> {
    pub id: ColumnId,
    pub header: String,
    accessor: CellAccessor<R>,
    pub sortable: bool,
    pub filterable: bool,
    pub meta: Option<ColumnMeta>,
}

impl<R> Clone for ColumnDefinition<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            header: self.header.clone(),
            accessor: Arc::clone(&self.accessor),
            sortable: self.sortable,
            filterable: self.filterable,
            meta: self.meta.clone(),
        }
    }
}

impl<R> fmt::Debug for ColumnDefinition<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDefinition")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl<R> ColumnDefinition<R> {
    /// A sortable, filterable text column.
    pub fn new(
        id: impl Into<ColumnId>,
        header: impl Into<String>,
        accessor: impl Fn(&R) -> CellValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            accessor: Arc::new(accessor),
            sortable: true,
            filterable: true,
            meta: None,
        }
    }

    #[must_use]
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    #[must_use]
    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    #[must_use]
    pub fn search_type(mut self, search_type: SearchType) -> Self {
        self.meta.get_or_insert_with(ColumnMeta::default).search_type = search_type;
        self
    }

    #[must_use]
    pub fn options(mut self, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.meta.get_or_insert_with(ColumnMeta::default).options =
            options.into_iter().map(Into::into).collect();
        self
    }

    pub fn value(&self, row: &R) -> CellValue {
        (self.accessor)(row)
    }

    /// Declared search type; columns without metadata filter as text.
    #[must_use]
    pub fn declared_search_type(&self) -> SearchType {
        self.meta
            .as_ref()
            .map_or(SearchType::Text, |meta| meta.search_type)
    }

    #[must_use]
    pub fn select_options(&self) -> &[String] {
        self.meta
            .as_ref()
            .map_or(&[][..], |meta| meta.options.as_slice())
    }
}

/// Sort order for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableSortDirection {
    Ascending,
    Descending,
}

/// Parses a trimmed, finite number. Spellings of infinity and NaN are not
/// numbers here.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Column sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableSortSpec {
    pub key: ColumnId,
    pub direction: TableSortDirection,
}

/// Computes the new sort when a column header is toggled.
/// - Column is the active sort: flip between ascending and descending
/// - Any other column: replace the sort with that column ascending
///
/// There is no unsorted third state; at most one column is ever active.
pub fn sort_spec_on_click(current: &[TableSortSpec], clicked_key: &ColumnId) -> Vec<TableSortSpec> {
    let direction = match current.first() {
        Some(active) if &active.key == clicked_key => match active.direction {
            TableSortDirection::Ascending => TableSortDirection::Descending,
            TableSortDirection::Descending => TableSortDirection::Ascending,
        },
        _ => TableSortDirection::Ascending,
    };

    vec![TableSortSpec {
        key: clicked_key.clone(),
        direction,
    }]
}

/// Header arrow for a column, `None` when the column is not sorted.
pub fn sort_indicator(sort: &[TableSortSpec], column_key: &ColumnId) -> Option<&'static str> {
    let spec = sort.first().filter(|spec| &spec.key == column_key)?;
    Some(match spec.direction {
        TableSortDirection::Ascending => "⬆",
        TableSortDirection::Descending => "⬇",
    })
}

/// Row ids the user marked, independent of the current filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSelection {
    pub rows: BTreeSet<TableRowId>,
}

impl TableSelection {
    #[must_use]
    pub fn contains(&self, id: TableRowId) -> bool {
        self.rows.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Zero-based page position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: usize,
}

/// A distinct value of a column within the filtered rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetValue {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("duplicate column id '{0}'")]
    DuplicateColumn(ColumnId),
    #[error("unknown column id '{0}'")]
    UnknownColumn(ColumnId),
    #[error("column '{0}' is not filterable")]
    NotFilterable(ColumnId),
    #[error("filter {value:?} does not fit the {search_type} search type of column '{column}'")]
    FilterTypeMismatch {
        column: ColumnId,
        search_type: SearchType,
        value: FilterValue,
    },
    #[error("'{value}' is not an option of column '{column}'")]
    UnknownOption { column: ColumnId, value: String },
}

/// Formats the selection count for display.
/// - `selected` counts marked rows inside the filtered set
/// - `hidden` counts marked rows the current filter excludes
///
/// Returns "" when nothing is marked, "N selected" or "N selected (M hidden)".
#[must_use]
pub fn format_selection_count(selected: usize, hidden: usize) -> String {
    match (selected, hidden) {
        (0, 0) => String::new(),
        (selected, 0) => format!("{selected} selected"),
        (selected, hidden) => format!("{selected} selected ({hidden} hidden)"),
    }
}

/// "Showing 6–10 of 12", or "No rows" for an empty result.
#[must_use]
pub fn format_page_range(first_row: usize, last_row: usize, total_rows: usize) -> String {
    if total_rows == 0 {
        return "No rows".to_string();
    }
    format!("Showing {first_row}–{last_row} of {total_rows}")
}
