//! Presentation state for one table and the filter → sort → paginate
//! pipeline that derives the visible rows from it.
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use itertools::Itertools;
use tracing::{debug, warn};

use super::filter::{CompiledFilter, FilterState, FilterValue, SearchType};
use super::model::{
    CellValue, ColumnDefinition, ColumnId, FacetValue, PaginationState, TableError, TableRecord,
    TableRowId, TableSelection, TableSortDirection, TableSortSpec, compare_cells,
    format_page_range, format_selection_count, sort_indicator, sort_spec_on_click,
};
use crate::config::TableSettings;
use crate::dates::DateParser;

/// Initial configuration handed over by the hosting application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    pub page_size: usize,
    pub pagination_enabled: bool,
    pub selection_enabled: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            pagination_enabled: true,
            selection_enabled: true,
        }
    }
}

impl From<&TableSettings> for TableOptions {
    fn from(settings: &TableSettings) -> Self {
        Self {
            page_size: settings.default_page_size,
            pagination_enabled: settings.pagination_enabled,
            selection_enabled: settings.selection_enabled,
        }
    }
}

/// The independently mutable pieces of table state.
#[derive(Debug, Clone, PartialEq)]
pub struct TableState {
    /// At most one entry.
    pub sorting: Vec<TableSortSpec>,
    pub filters: FilterState,
    /// Columns absent from the map are visible.
    pub visibility: BTreeMap<ColumnId, bool>,
    pub selection: TableSelection,
    pub pagination: PaginationState,
}

/// Pagination metadata for a footer. Row numbers are one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_rows: usize,
    pub first_row: usize,
    pub last_row: usize,
}

impl PageInfo {
    #[must_use]
    pub fn summary(&self) -> String {
        format_page_range(self.first_row, self.last_row, self.total_rows)
    }
}

#[derive(Debug, Default)]
struct DerivedRows {
    /// Indices into `rows` passing every filter, in source order.
    filtered: Vec<usize>,
    /// `filtered` in display order.
    sorted: Vec<usize>,
    /// Row id → position in `sorted`.
    row_index: HashMap<TableRowId, usize>,
}

#[derive(Debug)]
pub struct TableStateController<R> {
    columns: Vec<ColumnDefinition<R>>,
    rows: Vec<R>,
    options: TableOptions,
    dates: DateParser,
    state: TableState,
    derived: DerivedRows,
}

impl<R: TableRecord> TableStateController<R> {
    /// Builds a controller. Column ids must be unique.
    pub fn new(
        columns: Vec<ColumnDefinition<R>>,
        rows: Vec<R>,
        options: TableOptions,
    ) -> Result<Self, TableError> {
        if let Some(duplicate) = first_duplicate_id(&columns) {
            return Err(TableError::DuplicateColumn(duplicate.clone()));
        }

        let mut controller = Self {
            columns,
            rows,
            options,
            dates: DateParser::default(),
            state: TableState {
                sorting: vec![],
                filters: FilterState::new(),
                visibility: BTreeMap::new(),
                selection: TableSelection::default(),
                pagination: PaginationState {
                    page_index: 0,
                    page_size: options.page_size.max(1),
                },
            },
            derived: DerivedRows::default(),
        };
        controller.refresh();
        Ok(controller)
    }

    /// Replaces the parser used when date filters meet text cells.
    #[must_use]
    pub fn with_date_parser(mut self, dates: DateParser) -> Self {
        self.dates = dates;
        self.refresh();
        self
    }

    // -------------------------------------------------------------------------
    // Read-only state
    // -------------------------------------------------------------------------

    pub fn columns(&self) -> &[ColumnDefinition<R>] {
        &self.columns
    }

    pub fn column(&self, id: &ColumnId) -> Option<&ColumnDefinition<R>> {
        self.columns.iter().find(|column| &column.id == id)
    }

    fn column_index(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|column| &column.id == id)
    }

    #[must_use]
    pub fn options(&self) -> TableOptions {
        self.options
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn sorting(&self) -> &[TableSortSpec] {
        &self.state.sorting
    }

    pub fn filters(&self) -> &FilterState {
        &self.state.filters
    }

    pub fn selection(&self) -> &TableSelection {
        &self.state.selection
    }

    #[must_use]
    pub fn pagination(&self) -> PaginationState {
        self.state.pagination
    }

    /// Every row handed to the table, unfiltered and in source order.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    // -------------------------------------------------------------------------
    // Row data
    // -------------------------------------------------------------------------

    /// Replaces the row data, keeping sort, filters and pagination.
    /// Selected ids that no longer exist are dropped.
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.rows = rows;
        let known: HashSet<TableRowId> = self.rows.iter().map(TableRecord::row_id).collect();
        self.state.selection.rows.retain(|id| known.contains(id));
        self.refresh();
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// Sets the sort. Only the first entry naming a sortable column is kept.
    pub fn set_sorting(&mut self, sorting: Vec<TableSortSpec>) {
        let active = sorting
            .into_iter()
            .find(|spec| match self.column(&spec.key) {
                Some(column) if column.sortable => true,
                Some(_) => {
                    debug!("Ignoring sort on unsortable column '{}'", spec.key);
                    false
                }
                None => {
                    warn!("Ignoring sort on unknown column '{}'", spec.key);
                    false
                }
            });
        self.state.sorting = active.into_iter().collect();
        self.refresh();
    }

    /// Header click: ascending first, then flips. Other columns are replaced.
    pub fn toggle_sort(&mut self, column: &ColumnId) {
        let next = sort_spec_on_click(&self.state.sorting, column);
        self.set_sorting(next);
    }

    pub fn clear_sorting(&mut self) {
        self.set_sorting(vec![]);
    }

    #[must_use]
    pub fn sort_indicator(&self, column: &ColumnId) -> Option<&'static str> {
        sort_indicator(&self.state.sorting, column)
    }

    // -------------------------------------------------------------------------
    // Filtering
    // -------------------------------------------------------------------------

    fn validate_filter(&self, id: &ColumnId, value: &FilterValue) -> Result<(), TableError> {
        let column = self
            .column(id)
            .ok_or_else(|| TableError::UnknownColumn(id.clone()))?;
        if !column.filterable {
            return Err(TableError::NotFilterable(id.clone()));
        }

        let search_type = column.declared_search_type();
        if !value.fits(search_type) {
            return Err(TableError::FilterTypeMismatch {
                column: id.clone(),
                search_type,
                value: value.clone(),
            });
        }

        if let (SearchType::Select, FilterValue::Select(option)) = (search_type, value) {
            let options = column.select_options();
            if !options.is_empty() && !options.contains(option) {
                return Err(TableError::UnknownOption {
                    column: id.clone(),
                    value: option.clone(),
                });
            }
        }
        Ok(())
    }

    /// Replaces every column filter at once.
    ///
    /// Entries that name unknown or unfilterable columns, or whose value does
    /// not fit the column's search type, are dropped. Empty values are
    /// treated as absent.
    pub fn set_column_filters(&mut self, filters: FilterState) {
        self.state.filters = filters
            .into_iter()
            .filter(|(id, value)| match self.validate_filter(id, value) {
                Ok(()) => !value.is_inert(),
                Err(err) => {
                    warn!("Dropping column filter: {err}");
                    false
                }
            })
            .collect();
        self.refresh();
    }

    /// Sets or clears (`None`) the filter of one column.
    pub fn try_set_column_filter(
        &mut self,
        column: &ColumnId,
        value: Option<FilterValue>,
    ) -> Result<(), TableError> {
        match value {
            Some(value) => {
                self.validate_filter(column, &value)?;
                if value.is_inert() {
                    self.state.filters.remove(column);
                } else {
                    self.state.filters.insert(column.clone(), value);
                }
            }
            None => {
                self.state.filters.remove(column);
            }
        }
        self.refresh();
        Ok(())
    }

    /// Like [`Self::try_set_column_filter`], logging instead of failing.
    pub fn set_column_filter(&mut self, column: &ColumnId, value: Option<FilterValue>) {
        if let Err(err) = self.try_set_column_filter(column, value) {
            warn!("Ignoring column filter: {err}");
        }
    }

    pub fn clear_column_filters(&mut self) {
        self.set_column_filters(FilterState::new());
    }

    // -------------------------------------------------------------------------
    // Visibility
    // -------------------------------------------------------------------------

    pub fn set_column_visibility(&mut self, visibility: BTreeMap<ColumnId, bool>) {
        self.state.visibility = visibility
            .into_iter()
            .filter(|(id, _)| {
                let known = self.column_index(id).is_some();
                if !known {
                    warn!("Ignoring visibility of unknown column '{id}'");
                }
                known
            })
            .collect();
    }

    pub fn toggle_column_visibility(&mut self, column: &ColumnId) {
        if self.column_index(column).is_none() {
            warn!("Ignoring visibility of unknown column '{column}'");
            return;
        }
        let visible = self.is_column_visible(column);
        self.state.visibility.insert(column.clone(), !visible);
    }

    #[must_use]
    pub fn is_column_visible(&self, column: &ColumnId) -> bool {
        self.state.visibility.get(column).copied().unwrap_or(true)
    }

    /// Columns to render, in definition order. Hidden columns still filter
    /// and sort.
    pub fn visible_columns(&self) -> Vec<&ColumnDefinition<R>> {
        self.columns
            .iter()
            .filter(|column| self.is_column_visible(&column.id))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Replaces the selection. Ids that match no row are dropped; ids of rows
    /// that the current filter hides are kept.
    pub fn set_row_selection(&mut self, selection: BTreeSet<TableRowId>) {
        if !self.options.selection_enabled {
            debug!("Selection is disabled, ignoring selection change");
            return;
        }
        let known: HashSet<TableRowId> = self.rows.iter().map(TableRecord::row_id).collect();
        self.state.selection.rows = selection
            .into_iter()
            .filter(|id| known.contains(id))
            .collect();
    }

    /// Flips one row. Returns whether the row is selected afterwards.
    pub fn toggle_row_selected(&mut self, id: TableRowId) -> bool {
        let mut rows = self.state.selection.rows.clone();
        if !rows.remove(&id) {
            rows.insert(id);
        }
        self.set_row_selection(rows);
        self.state.selection.contains(id)
    }

    /// Marks every row in the filtered set, keeping hidden marks.
    pub fn select_all_filtered(&mut self) {
        let mut rows = self.state.selection.rows.clone();
        rows.extend(self.derived.sorted.iter().map(|&row| self.rows[row].row_id()));
        self.set_row_selection(rows);
    }

    pub fn select_page(&mut self) {
        let mut rows = self.state.selection.rows.clone();
        rows.extend(self.page_row_ids());
        self.set_row_selection(rows);
    }

    pub fn clear_selection(&mut self) {
        self.state.selection.rows.clear();
    }

    #[must_use]
    pub fn is_selected(&self, id: TableRowId) -> bool {
        self.state.selection.contains(id)
    }

    /// Marked rows inside the filtered set.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.state
            .selection
            .rows
            .iter()
            .filter(|id| self.derived.row_index.contains_key(id))
            .count()
    }

    /// Marked rows the current filter excludes.
    #[must_use]
    pub fn hidden_selection_count(&self) -> usize {
        self.state.selection.len() - self.selected_count()
    }

    /// Bulk-action targets: marked rows inside the filtered set, in display order.
    pub fn selected_rows(&self) -> Vec<&R> {
        self.derived
            .sorted
            .iter()
            .map(|&row| &self.rows[row])
            .filter(|row| self.state.selection.contains(row.row_id()))
            .collect()
    }

    #[must_use]
    pub fn selection_summary(&self) -> String {
        format_selection_count(self.selected_count(), self.hidden_selection_count())
    }

    // -------------------------------------------------------------------------
    // Pagination
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn page_count(&self) -> usize {
        let rows = self.derived.sorted.len();
        if self.options.pagination_enabled {
            rows.div_ceil(self.state.pagination.page_size)
        } else {
            usize::from(rows > 0)
        }
    }

    /// Moves to `page_index`, clamped into the available pages.
    pub fn set_page_index(&mut self, page_index: usize) {
        self.state.pagination.page_index = page_index;
        self.clamp_page_index();
    }

    /// Changes the page size, keeping the first row of the current page in view.
    pub fn set_page_size(&mut self, page_size: usize) {
        let page_size = page_size.max(1);
        let first_row = self.state.pagination.page_index * self.state.pagination.page_size;
        self.state.pagination = PaginationState {
            page_index: first_row / page_size,
            page_size,
        };
        self.clamp_page_index();
    }

    #[must_use]
    pub fn can_previous_page(&self) -> bool {
        self.state.pagination.page_index > 0
    }

    #[must_use]
    pub fn can_next_page(&self) -> bool {
        self.state.pagination.page_index + 1 < self.page_count()
    }

    pub fn next_page(&mut self) {
        if self.can_next_page() {
            self.state.pagination.page_index += 1;
        }
    }

    pub fn previous_page(&mut self) {
        self.state.pagination.page_index = self.state.pagination.page_index.saturating_sub(1);
    }

    fn clamp_page_index(&mut self) {
        let last = self.page_count().saturating_sub(1);
        if self.state.pagination.page_index > last {
            debug!(
                "Clamping page index {} to {last}",
                self.state.pagination.page_index
            );
            self.state.pagination.page_index = last;
        }
    }

    fn page_range(&self) -> std::ops::Range<usize> {
        let rows = self.derived.sorted.len();
        if !self.options.pagination_enabled {
            return 0..rows;
        }
        let PaginationState {
            page_index,
            page_size,
        } = self.state.pagination;
        let start = (page_index * page_size).min(rows);
        start..(start + page_size).min(rows)
    }

    /// Rows of the current page in display order.
    pub fn page_rows(&self) -> Vec<&R> {
        self.derived.sorted[self.page_range()]
            .iter()
            .map(|&row| &self.rows[row])
            .collect()
    }

    pub fn page_row_ids(&self) -> Vec<TableRowId> {
        self.page_rows().into_iter().map(TableRecord::row_id).collect()
    }

    #[must_use]
    pub fn page_info(&self) -> PageInfo {
        let range = self.page_range();
        PageInfo {
            page_index: self.state.pagination.page_index,
            page_size: self.state.pagination.page_size,
            page_count: self.page_count(),
            total_rows: self.derived.sorted.len(),
            first_row: if range.is_empty() { 0 } else { range.start + 1 },
            last_row: range.end,
        }
    }

    // -------------------------------------------------------------------------
    // Derived rows
    // -------------------------------------------------------------------------

    /// Rows passing the filters.
    #[must_use]
    pub fn filtered_count(&self) -> usize {
        self.derived.sorted.len()
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.rows.len()
    }

    /// Every filtered row in display order, ignoring pagination.
    pub fn filtered_rows(&self) -> Vec<&R> {
        self.derived
            .sorted
            .iter()
            .map(|&row| &self.rows[row])
            .collect()
    }

    /// Distinct non-empty values of `column` among the filtered rows, with
    /// counts, in first-seen order.
    pub fn faceted_unique_values(&self, column: &ColumnId) -> Vec<FacetValue> {
        let Some(index) = self.column_index(column) else {
            return vec![];
        };
        self.facets_over(index, self.derived.filtered.iter().copied())
    }

    /// Option list for a select filter: declared options when the column has
    /// them, otherwise the facets in natural order. Facets for the option
    /// list ignore the column's own filter so a chosen value can be swapped
    /// for another.
    pub fn filter_options(&self, column: &ColumnId) -> Vec<String> {
        let Some(index) = self.column_index(column) else {
            return vec![];
        };
        let definition = &self.columns[index];
        if !definition.select_options().is_empty() {
            return definition.select_options().to_vec();
        }
        let compiled: Vec<CompiledFilter> = self
            .compiled_filters()
            .into_iter()
            .filter(|filter| filter.column != index)
            .collect();
        let rows = (0..self.rows.len()).filter(|&row| self.row_matches(row, &compiled));
        self.facets_over(index, rows)
            .into_iter()
            .map(|facet| facet.value)
            .sorted_by(|a, b| numeric_sort::cmp(&a.to_lowercase(), &b.to_lowercase()))
            .collect()
    }

    fn facets_over(&self, index: usize, rows: impl Iterator<Item = usize>) -> Vec<FacetValue> {
        let column = &self.columns[index];
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut facets: Vec<FacetValue> = Vec::new();
        for row in rows {
            let cell = column.value(&self.rows[row]);
            if cell.is_empty() {
                continue;
            }
            let value = cell.to_string();
            match positions.get(&value) {
                Some(&position) => facets[position].count += 1,
                None => {
                    positions.insert(value.clone(), facets.len());
                    facets.push(FacetValue { value, count: 1 });
                }
            }
        }
        facets
    }

    fn compiled_filters(&self) -> Vec<CompiledFilter> {
        self.state
            .filters
            .iter()
            .filter_map(|(id, value)| {
                self.column_index(id)
                    .map(|index| CompiledFilter::new(index, value))
            })
            .collect()
    }

    fn row_matches(&self, row: usize, compiled: &[CompiledFilter]) -> bool {
        compiled.iter().all(|filter| {
            let cell = self.columns[filter.column].value(&self.rows[row]);
            filter.matches(&cell, &self.dates)
        })
    }

    fn refresh(&mut self) {
        self.derived = self.derive_rows();
        self.clamp_page_index();
    }

    fn derive_rows(&self) -> DerivedRows {
        let compiled = self.compiled_filters();
        let filtered: Vec<usize> = (0..self.rows.len())
            .filter(|&row| self.row_matches(row, &compiled))
            .collect();

        let sorted = match self.state.sorting.first().and_then(|spec| {
            self.column_index(&spec.key)
                .map(|index| (index, spec.direction))
        }) {
            Some((index, direction)) => {
                let column = &self.columns[index];
                let mut keyed: Vec<(usize, CellValue)> = filtered
                    .iter()
                    .map(|&row| (row, column.value(&self.rows[row])))
                    .collect();
                keyed.sort_by(|(left_row, left), (right_row, right)| {
                    compare_for_display(left, right, direction).then(left_row.cmp(right_row))
                });
                keyed.into_iter().map(|(row, _)| row).collect()
            }
            None => filtered.clone(),
        };

        let row_index = sorted
            .iter()
            .enumerate()
            .map(|(position, &row)| (self.rows[row].row_id(), position))
            .collect();

        DerivedRows {
            filtered,
            sorted,
            row_index,
        }
    }
}

fn first_duplicate_id<R>(columns: &[ColumnDefinition<R>]) -> Option<&ColumnId> {
    let mut seen = HashSet::new();
    columns
        .iter()
        .map(|column| &column.id)
        .find(|id| !seen.insert(*id))
}

/// Empty cells sort last in both directions.
fn compare_for_display(left: &CellValue, right: &CellValue, direction: TableSortDirection) -> Ordering {
    match (left, right) {
        (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
        (CellValue::Empty, _) => Ordering::Greater,
        (_, CellValue::Empty) => Ordering::Less,
        _ => match direction {
            TableSortDirection::Ascending => compare_cells(left, right),
            TableSortDirection::Descending => compare_cells(left, right).reverse(),
        },
    }
}
