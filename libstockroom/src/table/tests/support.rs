use chrono::NaiveDate;

use super::*;

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Part {
    pub id: u64,
    pub name: &'static str,
    pub quantity: Option<i64>,
    pub received: Option<NaiveDate>,
    pub status: &'static str,
}

impl TableRecord for Part {
    fn row_id(&self) -> TableRowId {
        TableRowId(self.id)
    }
}

pub(super) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn columns() -> Vec<ColumnDefinition<Part>> {
    vec![
        ColumnDefinition::new("id", "ID", |part: &Part| CellValue::from(part.id as i64))
            .search_type(SearchType::Number),
        ColumnDefinition::new("name", "Name", |part: &Part| CellValue::from(part.name)),
        ColumnDefinition::new("quantity", "Qty", |part: &Part| CellValue::from(part.quantity))
            .search_type(SearchType::Number),
        ColumnDefinition::new("received", "Received", |part: &Part| {
            CellValue::from(part.received)
        })
        .search_type(SearchType::Date),
        ColumnDefinition::new("status", "Status", |part: &Part| CellValue::from(part.status))
            .search_type(SearchType::Select)
            .options(["Active", "Inactive", "Discontinued"]),
        ColumnDefinition::new("notes", "Notes", |_: &Part| CellValue::Empty)
            .sortable(false)
            .filterable(false),
    ]
}

/// Twelve parts. Every third one has quantity 42, the rest are distinct.
pub(super) fn parts() -> Vec<Part> {
    const NAMES: [&str; 12] = [
        "Hex bolt M8",
        "Washer 8mm",
        "Bin 10",
        "bin 9",
        "Hinge",
        "Anchor",
        "Bracket",
        "Zip tie",
        "Cable gland",
        "Spring pin",
        "Rivet",
        "Nut M8",
    ];
    NAMES
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let i = i as u64;
            Part {
                id: i + 1,
                name,
                quantity: match i {
                    4 => None,
                    i if i % 3 == 0 => Some(42),
                    i => Some(i as i64 * 10),
                },
                received: Some(day(2024, 3, (i % 4) as u32 + 1)),
                status: if i % 2 == 0 { "Active" } else { "Inactive" },
            }
        })
        .collect()
}

pub(super) fn controller(options: TableOptions) -> TableStateController<Part> {
    TableStateController::new(columns(), parts(), options).expect("valid columns")
}

pub(super) fn ids(rows: &[&Part]) -> Vec<u64> {
    rows.iter().map(|part| part.id).collect()
}

pub(super) fn col(id: &str) -> ColumnId {
    ColumnId::from(id)
}
