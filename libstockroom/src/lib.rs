#![deny(unused_crate_dependencies)]

pub mod actions;
pub mod badge;
pub mod config;
pub mod dates;
pub mod debounce;
pub mod filter_input;
pub mod logs;
pub mod search;
pub mod table;
pub mod timer;

pub use actions::{ActionItem, ActionKind, ActionMenuFactory, ActionTone, RowActionMenu};
pub use badge::{BadgeIcon, BadgeStyle, BadgeVariant, StatusBadge, StatusBadgeRenderer};
pub use config::ExplorerConfig;
pub use debounce::{DebounceStabilizer, MaxWaitPolicy};
pub use filter_input::{ControlKind, FilterControl, FilterEmit, FilterInput, FilterInputEvent};
pub use search::{GlobalSearchDispatcher, QueryKind, SearchTargets, TypeClassifier};
pub use table::{
    CellValue, ColumnDefinition, ColumnId, ColumnMeta, DateRange, FilterState, FilterValue,
    SearchType, TableError, TableOptions, TableRecord, TableRowId, TableSortDirection,
    TableSortSpec, TableStateController,
};
