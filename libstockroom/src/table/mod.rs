pub mod controller;
pub mod filter;
pub mod model;

pub use controller::{PageInfo, TableOptions, TableState, TableStateController};
pub use filter::{DateRange, FilterState, FilterValue, SearchType};
pub use model::{
    CellValue, ColumnDefinition, ColumnId, ColumnMeta, FacetValue, PaginationState, TableError,
    TableRecord, TableRowId, TableSelection, TableSortDirection, TableSortSpec,
    format_page_range, format_selection_count, sort_indicator, sort_spec_on_click,
};
