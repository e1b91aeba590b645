//! Typed per-column filter values and their matchers.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use derive_more::Display;
use enum_iterator::Sequence;
use regex::{Regex, RegexBuilder, escape};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::model::{CellValue, ColumnId};
use crate::dates::DateParser;

/// The declared data kind of a filterable column.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    Sequence,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SearchType {
    #[default]
    #[display("text")]
    Text,
    #[display("email")]
    Email,
    #[display("number")]
    Number,
    #[display("date")]
    Date,
    #[display("date-range")]
    DateRange,
    #[display("select")]
    Select,
}

impl SearchType {
    /// Resolves loosely written metadata. Missing or unrecognised names are text.
    #[must_use]
    pub fn from_name(name: Option<&str>) -> Self {
        let Some(name) = name else {
            return Self::Text;
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "email" => Self::Email,
            "number" | "numeric" => Self::Number,
            "date" => Self::Date,
            "date-range" | "daterange" | "date_range" => Self::DateRange,
            "select" => Self::Select,
            _ => Self::Text,
        }
    }
}

/// A partially picked date range; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from.is_none_or(|from| from <= day) && self.to.is_none_or(|to| day <= to)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// A filter value. Its variant must fit the column's [`SearchType`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    DateRange(DateRange),
    Select(String),
}

impl FilterValue {
    /// True when this value may be stored for a column of `search_type`.
    #[must_use]
    pub fn fits(&self, search_type: SearchType) -> bool {
        matches!(
            (self, search_type),
            (Self::Text(_), SearchType::Text | SearchType::Email)
                | (Self::Number(_), SearchType::Number)
                | (Self::Date(_), SearchType::Date)
                | (Self::DateRange(_), SearchType::DateRange)
                | (Self::Select(_), SearchType::Select)
        )
    }

    /// Values that filter nothing and are therefore not stored.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        match self {
            Self::Text(text) | Self::Select(text) => text.is_empty(),
            Self::Number(value) => value.is_nan(),
            Self::DateRange(range) => range.is_open(),
            Self::Date(_) => false,
        }
    }
}

/// Column id → active filter value. A missing entry means no filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState(BTreeMap<ColumnId, FilterValue>);

impl FilterState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, column: &ColumnId) -> Option<&FilterValue> {
        self.0.get(column)
    }

    pub fn insert(&mut self, column: impl Into<ColumnId>, value: FilterValue) -> Option<FilterValue> {
        self.0.insert(column.into(), value)
    }

    pub fn remove(&mut self, column: &ColumnId) -> Option<FilterValue> {
        self.0.remove(column)
    }

    pub fn retain(&mut self, keep: impl FnMut(&ColumnId, &mut FilterValue) -> bool) {
        self.0.retain(keep);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnId, &FilterValue)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for FilterState {
    type Item = (ColumnId, FilterValue);
    type IntoIter = std::collections::btree_map::IntoIter<ColumnId, FilterValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(ColumnId, FilterValue)> for FilterState {
    fn from_iter<I: IntoIterator<Item = (ColumnId, FilterValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone)]
enum FilterMatcher {
    Contains(Regex),
    /// Used when the escaped pattern exceeds the regex size limit.
    ContainsLower(String),
    Number(f64),
    Day(NaiveDate),
    Range(DateRange),
    Exact(String),
}

/// A filter bound to a column position, ready to test cells.
#[derive(Debug, Clone)]
pub(crate) struct CompiledFilter {
    pub column: usize,
    matcher: FilterMatcher,
}

impl CompiledFilter {
    pub fn new(column: usize, value: &FilterValue) -> Self {
        let matcher = match value {
            FilterValue::Text(text) => match RegexBuilder::new(&escape(text))
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => FilterMatcher::Contains(regex),
                Err(err) => {
                    warn!("Falling back to plain substring filter: {err}");
                    FilterMatcher::ContainsLower(text.to_lowercase())
                }
            },
            FilterValue::Number(value) => FilterMatcher::Number(*value),
            FilterValue::Date(day) => FilterMatcher::Day(*day),
            FilterValue::DateRange(range) => FilterMatcher::Range(*range),
            FilterValue::Select(option) => FilterMatcher::Exact(option.clone()),
        };
        Self { column, matcher }
    }

    pub fn matches(&self, cell: &CellValue, dates: &DateParser) -> bool {
        match &self.matcher {
            FilterMatcher::Contains(regex) => regex.is_match(&cell.to_string()),
            FilterMatcher::ContainsLower(needle) => {
                cell.to_string().to_lowercase().contains(needle.as_str())
            }
            FilterMatcher::Number(expected) => cell.as_number() == Some(*expected),
            FilterMatcher::Day(expected) => cell_day(cell, dates) == Some(*expected),
            FilterMatcher::Range(range) => cell_day(cell, dates).is_some_and(|day| range.contains(day)),
            FilterMatcher::Exact(option) => cell.to_string() == *option,
        }
    }
}

fn cell_day(cell: &CellValue, dates: &DateParser) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(day) => Some(*day),
        CellValue::Text(text) => dates.parse(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn matches(value: FilterValue, cell: CellValue) -> bool {
        CompiledFilter::new(0, &value).matches(&cell, &DateParser::default())
    }

    #[test]
    fn search_type_names_default_to_text() {
        assert_eq!(SearchType::from_name(None), SearchType::Text);
        assert_eq!(SearchType::from_name(Some("Date-Range")), SearchType::DateRange);
        assert_eq!(SearchType::from_name(Some("numeric")), SearchType::Number);
        assert_eq!(SearchType::from_name(Some("slider")), SearchType::Text);
        assert_eq!(enum_iterator::all::<SearchType>().count(), 6);
    }

    #[test]
    fn values_fit_their_search_types() {
        assert!(FilterValue::Text("a".into()).fits(SearchType::Text));
        assert!(FilterValue::Text("a@b.c".into()).fits(SearchType::Email));
        assert!(FilterValue::Number(1.0).fits(SearchType::Number));
        assert!(!FilterValue::Number(1.0).fits(SearchType::Text));
        assert!(!FilterValue::Text("1".into()).fits(SearchType::Number));
        assert!(FilterValue::DateRange(DateRange::default()).fits(SearchType::DateRange));
        assert!(!FilterValue::Date(day(2024, 1, 1)).fits(SearchType::DateRange));
        assert!(FilterValue::Select("x".into()).fits(SearchType::Select));
    }

    #[test]
    fn text_filter_is_case_insensitive_substring() {
        assert!(matches(FilterValue::Text("BOLT".into()), "Hex bolt M8".into()));
        assert!(matches(FilterValue::Text("m8 (".into()), "bolt M8 (zinc)".into()));
        assert!(!matches(FilterValue::Text("nut".into()), "Hex bolt".into()));
        assert!(matches(FilterValue::Text("42".into()), CellValue::Number(1420.0)));
    }

    #[test]
    fn number_filter_matches_exact_value() {
        assert!(matches(FilterValue::Number(42.0), CellValue::Number(42.0)));
        assert!(matches(FilterValue::Number(42.0), "42".into()));
        assert!(!matches(FilterValue::Number(42.0), CellValue::Number(420.0)));
        assert!(!matches(FilterValue::Number(42.0), CellValue::Empty));
    }

    #[test]
    fn date_filters_compare_calendar_days() {
        let received = CellValue::Date(day(2024, 3, 5));
        assert!(matches(FilterValue::Date(day(2024, 3, 5)), received.clone()));
        assert!(matches(FilterValue::Date(day(2024, 3, 5)), "2024-03-05".into()));
        assert!(!matches(FilterValue::Date(day(2024, 3, 6)), received.clone()));

        let open_end = DateRange {
            from: Some(day(2024, 3, 1)),
            to: None,
        };
        assert!(matches(FilterValue::DateRange(open_end), received.clone()));

        let closed = DateRange {
            from: Some(day(2024, 3, 6)),
            to: Some(day(2024, 3, 31)),
        };
        assert!(!matches(FilterValue::DateRange(closed), received));
        assert!(!matches(FilterValue::DateRange(closed), CellValue::Empty));
    }

    #[test]
    fn select_filter_requires_exact_option() {
        assert!(matches(FilterValue::Select("Active".into()), "Active".into()));
        assert!(!matches(FilterValue::Select("Active".into()), "Inactive".into()));
    }

    #[test]
    fn inert_values() {
        assert!(FilterValue::Text(String::new()).is_inert());
        assert!(FilterValue::DateRange(DateRange::default()).is_inert());
        assert!(FilterValue::Number(f64::NAN).is_inert());
        assert!(!FilterValue::Number(0.0).is_inert());
    }
}
