//! Per-column filter controls.
//!
//! A [`FilterInput`] is chosen once from a column's declared search type and
//! then turns raw user interaction into normalized [`FilterEmit`]s. Text and
//! email inputs emit on every keystroke; only the global search debounces.
use chrono::NaiveDate;
use derive_more::Display;
use tracing::{debug, warn};

use crate::dates::DateParser;
use crate::table::model::parse_number;
use crate::table::{
    ColumnId, ColumnMeta, DateRange, FilterValue, SearchType, TableRecord, TableStateController,
};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// The widget a host should draw for a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ControlKind {
    #[display("text box")]
    TextBox,
    #[display("email box")]
    EmailBox,
    #[display("number box")]
    NumberBox,
    #[display("date picker")]
    DatePicker,
    #[display("date range picker")]
    DateRangePicker,
    #[display("dropdown")]
    Dropdown,
}

/// Render description of a filter control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterControl {
    pub kind: ControlKind,
    /// Current value as the control shows it, empty when unset.
    pub text: String,
    pub placeholder: String,
    /// Choices for [`ControlKind::Dropdown`]. Empty for every other kind.
    pub options: Vec<String>,
}

/// Raw interaction with a filter control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterInputEvent {
    Typed(String),
    DatePicked(NaiveDate),
    RangeStartPicked(Option<NaiveDate>),
    RangeEndPicked(Option<NaiveDate>),
    OptionChosen(String),
    Cleared,
}

/// What a control asks the table to do with its column filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEmit {
    Set(FilterValue),
    Clear,
}

impl FilterEmit {
    /// The value to hand to `set_column_filter`.
    #[must_use]
    pub fn into_value(self) -> Option<FilterValue> {
        match self {
            Self::Set(value) => Some(value),
            Self::Clear => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterInput {
    Text(String),
    Email(String),
    Number(Option<f64>),
    Date(Option<NaiveDate>),
    DateRange(DateRange),
    Select {
        options: Vec<String>,
        selected: Option<String>,
    },
}

impl FilterInput {
    /// Picks the variant for a column. Missing metadata means text. A
    /// `current` value that does not fit the search type is ignored.
    #[must_use]
    pub fn for_column(meta: Option<&ColumnMeta>, current: Option<&FilterValue>) -> Self {
        let search_type = meta.map_or(SearchType::Text, |meta| meta.search_type);
        let current = current.filter(|value| value.fits(search_type));
        match search_type {
            SearchType::Text => Self::Text(current_text(current)),
            SearchType::Email => Self::Email(current_text(current)),
            SearchType::Number => Self::Number(match current {
                Some(FilterValue::Number(value)) => Some(*value),
                _ => None,
            }),
            SearchType::Date => Self::Date(match current {
                Some(FilterValue::Date(day)) => Some(*day),
                _ => None,
            }),
            SearchType::DateRange => Self::DateRange(match current {
                Some(FilterValue::DateRange(range)) => *range,
                _ => DateRange::default(),
            }),
            SearchType::Select => Self::Select {
                options: meta.map(|meta| meta.options.clone()).unwrap_or_default(),
                selected: match current {
                    Some(FilterValue::Select(option)) => Some(option.clone()),
                    _ => None,
                },
            },
        }
    }

    /// Builds the input for a table column from its metadata and active
    /// filter. Select columns without declared options offer the facets of
    /// the filtered rows.
    pub fn for_table_column<R: TableRecord>(
        table: &TableStateController<R>,
        column: &ColumnId,
    ) -> Option<Self> {
        let definition = table.column(column)?;
        let mut input = Self::for_column(definition.meta.as_ref(), table.filters().get(column));
        if let Self::Select { options, .. } = &mut input
            && options.is_empty()
        {
            *options = table.filter_options(column);
        }
        Some(input)
    }

    #[must_use]
    pub fn search_type(&self) -> SearchType {
        match self {
            Self::Text(_) => SearchType::Text,
            Self::Email(_) => SearchType::Email,
            Self::Number(_) => SearchType::Number,
            Self::Date(_) => SearchType::Date,
            Self::DateRange(_) => SearchType::DateRange,
            Self::Select { .. } => SearchType::Select,
        }
    }

    #[must_use]
    pub fn render(&self, header: &str) -> FilterControl {
        let (kind, text, placeholder) = match self {
            Self::Text(text) => (
                ControlKind::TextBox,
                text.clone(),
                format!("Filter {header}..."),
            ),
            Self::Email(text) => (
                ControlKind::EmailBox,
                text.clone(),
                format!("Filter {header} by email..."),
            ),
            Self::Number(value) => (
                ControlKind::NumberBox,
                value.map(|value| value.to_string()).unwrap_or_default(),
                format!("Exact {header}..."),
            ),
            Self::Date(day) => (
                ControlKind::DatePicker,
                day.map(|day| day.format(DAY_FORMAT).to_string())
                    .unwrap_or_default(),
                "Pick a date".to_string(),
            ),
            Self::DateRange(range) => (
                ControlKind::DateRangePicker,
                format_range(range),
                "Pick a date range".to_string(),
            ),
            Self::Select { selected, .. } => (
                ControlKind::Dropdown,
                selected.clone().unwrap_or_default(),
                "All".to_string(),
            ),
        };
        let options = match self {
            Self::Select { options, .. } => options.clone(),
            _ => vec![],
        };
        FilterControl {
            kind,
            text,
            placeholder,
            options,
        }
    }

    /// Applies one interaction and returns the normalized outgoing value, or
    /// `None` when the event does not change the filter.
    pub fn handle(&mut self, event: FilterInputEvent, dates: &DateParser) -> Option<FilterEmit> {
        if event == FilterInputEvent::Cleared {
            self.reset();
            return Some(FilterEmit::Clear);
        }

        match (self, event) {
            (Self::Text(text) | Self::Email(text), FilterInputEvent::Typed(raw)) => {
                *text = raw;
                Some(if text.is_empty() {
                    FilterEmit::Clear
                } else {
                    FilterEmit::Set(FilterValue::Text(text.clone()))
                })
            }
            (Self::Number(value), FilterInputEvent::Typed(raw)) => {
                *value = parse_number(&raw);
                Some(match value {
                    Some(number) => FilterEmit::Set(FilterValue::Number(*number)),
                    None => FilterEmit::Clear,
                })
            }
            (Self::Date(day), FilterInputEvent::DatePicked(picked)) => {
                *day = Some(picked);
                Some(FilterEmit::Set(FilterValue::Date(picked)))
            }
            (Self::Date(day), FilterInputEvent::Typed(raw)) => {
                if raw.trim().is_empty() {
                    *day = None;
                    return Some(FilterEmit::Clear);
                }
                let picked = dates.parse(&raw)?;
                *day = Some(picked);
                Some(FilterEmit::Set(FilterValue::Date(picked)))
            }
            (Self::DateRange(range), FilterInputEvent::RangeStartPicked(from)) => {
                range.from = from;
                Some(emit_range(range))
            }
            (Self::DateRange(range), FilterInputEvent::RangeEndPicked(to)) => {
                range.to = to;
                Some(emit_range(range))
            }
            (Self::Select { options, selected }, FilterInputEvent::OptionChosen(option)) => {
                if !options.is_empty() && !options.contains(&option) {
                    warn!("'{option}' is not one of the filter options");
                    return None;
                }
                *selected = Some(option.clone());
                Some(FilterEmit::Set(FilterValue::Select(option)))
            }
            (input, event) => {
                debug!("{} filter ignores {event:?}", input.search_type());
                None
            }
        }
    }

    /// Feeds a single line of text the way a keyboard-only host would:
    /// select inputs treat it as an option, date ranges as `from..to` with
    /// either side optional.
    pub fn enter_text(&mut self, raw: &str, dates: &DateParser) -> Option<FilterEmit> {
        match self {
            Self::Select { .. } if raw.is_empty() => self.handle(FilterInputEvent::Cleared, dates),
            Self::Select { .. } => {
                self.handle(FilterInputEvent::OptionChosen(raw.to_string()), dates)
            }
            Self::DateRange(_) => {
                let (from, to) = raw.split_once("..").unwrap_or((raw, ""));
                self.handle(FilterInputEvent::RangeStartPicked(dates.parse(from)), dates);
                self.handle(FilterInputEvent::RangeEndPicked(dates.parse(to)), dates)
            }
            _ => self.handle(FilterInputEvent::Typed(raw.to_string()), dates),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Text(text) | Self::Email(text) => text.clear(),
            Self::Number(value) => *value = None,
            Self::Date(day) => *day = None,
            Self::DateRange(range) => *range = DateRange::default(),
            Self::Select { selected, .. } => *selected = None,
        }
    }
}

fn current_text(current: Option<&FilterValue>) -> String {
    match current {
        Some(FilterValue::Text(text)) => text.clone(),
        _ => String::new(),
    }
}

/// Reversed bounds are swapped so the stored range is never empty.
fn emit_range(range: &mut DateRange) -> FilterEmit {
    if let (Some(from), Some(to)) = (range.from, range.to)
        && to < from
    {
        *range = DateRange {
            from: Some(to),
            to: Some(from),
        };
    }
    if range.is_open() {
        FilterEmit::Clear
    } else {
        FilterEmit::Set(FilterValue::DateRange(*range))
    }
}

fn format_range(range: &DateRange) -> String {
    if range.is_open() {
        return String::new();
    }
    let bound = |day: Option<NaiveDate>| {
        day.map_or_else(|| "…".to_string(), |day| day.format(DAY_FORMAT).to_string())
    };
    format!("{} – {}", bound(range.from), bound(range.to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn meta(search_type: SearchType) -> ColumnMeta {
        ColumnMeta {
            search_type,
            options: vec![],
        }
    }

    fn typed(input: &mut FilterInput, raw: &str) -> Option<FilterEmit> {
        input.handle(FilterInputEvent::Typed(raw.to_string()), &DateParser::default())
    }

    #[test]
    fn missing_metadata_defaults_to_text() {
        let input = FilterInput::for_column(None, None);
        assert_eq!(input.search_type(), SearchType::Text);
        assert_eq!(input.render("Name").kind, ControlKind::TextBox);
        assert_eq!(input.render("Name").placeholder, "Filter Name...");
    }

    #[test]
    fn text_emits_every_keystroke() {
        let mut input = FilterInput::for_column(Some(&meta(SearchType::Email)), None);
        assert_eq!(
            typed(&mut input, "o"),
            Some(FilterEmit::Set(FilterValue::Text("o".into())))
        );
        assert_eq!(
            typed(&mut input, "op"),
            Some(FilterEmit::Set(FilterValue::Text("op".into())))
        );
        assert_eq!(typed(&mut input, ""), Some(FilterEmit::Clear));
    }

    #[test]
    fn number_never_emits_nan() {
        let mut input = FilterInput::for_column(Some(&meta(SearchType::Number)), None);
        assert_eq!(
            typed(&mut input, "42"),
            Some(FilterEmit::Set(FilterValue::Number(42.0)))
        );
        assert_eq!(input.render("Qty").text, "42");
        assert_eq!(typed(&mut input, ""), Some(FilterEmit::Clear));
        assert_eq!(typed(&mut input, "forty"), Some(FilterEmit::Clear));
        assert_eq!(typed(&mut input, "NaN"), Some(FilterEmit::Clear));
        assert_eq!(input, FilterInput::Number(None));
    }

    #[test]
    fn date_emits_concrete_days() {
        let mut input = FilterInput::for_column(Some(&meta(SearchType::Date)), None);
        let dates = DateParser::default();
        assert_eq!(
            input.handle(FilterInputEvent::DatePicked(day(2024, 3, 5)), &dates),
            Some(FilterEmit::Set(FilterValue::Date(day(2024, 3, 5))))
        );
        assert_eq!(typed(&mut input, "not a day"), None);
        assert_eq!(input.render("Received").text, "2024-03-05");
        assert_eq!(
            input.handle(FilterInputEvent::Cleared, &dates),
            Some(FilterEmit::Clear)
        );
        assert_eq!(input.render("Received").text, "");
    }

    #[test]
    fn date_range_may_be_partial_and_is_ordered() {
        let mut input = FilterInput::for_column(Some(&meta(SearchType::DateRange)), None);
        let dates = DateParser::default();

        let partial = input.handle(
            FilterInputEvent::RangeStartPicked(Some(day(2024, 3, 31))),
            &dates,
        );
        assert_eq!(
            partial,
            Some(FilterEmit::Set(FilterValue::DateRange(DateRange {
                from: Some(day(2024, 3, 31)),
                to: None,
            })))
        );
        assert_eq!(input.render("Received").text, "2024-03-31 – …");

        let complete = input.handle(
            FilterInputEvent::RangeEndPicked(Some(day(2024, 3, 1))),
            &dates,
        );
        assert_eq!(
            complete,
            Some(FilterEmit::Set(FilterValue::DateRange(DateRange {
                from: Some(day(2024, 3, 1)),
                to: Some(day(2024, 3, 31)),
            })))
        );

        input.handle(FilterInputEvent::RangeStartPicked(None), &dates);
        assert_eq!(
            input.handle(FilterInputEvent::RangeEndPicked(None), &dates),
            Some(FilterEmit::Clear)
        );
    }

    #[test]
    fn select_rejects_free_text() {
        let status = ColumnMeta {
            search_type: SearchType::Select,
            options: vec!["Active".into(), "Inactive".into()],
        };
        let mut input = FilterInput::for_column(Some(&status), None);
        let dates = DateParser::default();

        assert_eq!(typed(&mut input, "Act"), None);
        assert_eq!(
            input.handle(FilterInputEvent::OptionChosen("Retired".into()), &dates),
            None
        );
        assert_eq!(
            input.enter_text("Inactive", &dates),
            Some(FilterEmit::Set(FilterValue::Select("Inactive".into())))
        );

        let control = input.render("Status");
        assert_eq!(control.kind, ControlKind::Dropdown);
        assert_eq!(control.text, "Inactive");
        assert_eq!(control.options, vec!["Active", "Inactive"]);
    }

    #[test]
    fn current_value_is_shown_when_it_fits() {
        let current = FilterValue::Number(7.0);
        let number = FilterInput::for_column(Some(&meta(SearchType::Number)), Some(&current));
        assert_eq!(number, FilterInput::Number(Some(7.0)));

        let text = FilterInput::for_column(Some(&meta(SearchType::Text)), Some(&current));
        assert_eq!(text, FilterInput::Text(String::new()));
    }

    #[test]
    fn range_text_entry() {
        let mut input = FilterInput::for_column(Some(&meta(SearchType::DateRange)), None);
        let emit = input.enter_text("2024-03-01..", &DateParser::default());
        assert_eq!(
            emit.and_then(FilterEmit::into_value),
            Some(FilterValue::DateRange(DateRange {
                from: Some(day(2024, 3, 1)),
                to: None,
            }))
        );
    }
}
