use std::time::{Duration, Instant};

use tracing::debug;

use super::classifier::{QueryKind, TypeClassifier};
use crate::config::SearchSettings;
use crate::debounce::{DebounceStabilizer, MaxWaitPolicy};
use crate::table::{
    ColumnDefinition, ColumnId, FilterValue, SearchType, TableRecord, TableStateController,
};

/// Columns the global search writes to, per query tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTargets {
    pub date_columns: Vec<ColumnId>,
    pub numeric_columns: Vec<ColumnId>,
    /// Email queries go to this column only.
    pub email_column: Option<ColumnId>,
    pub text_columns: Vec<ColumnId>,
}

impl SearchTargets {
    /// Derives targets from the declared search types of filterable columns.
    /// The first email column becomes the email target.
    pub fn from_columns<R>(columns: &[ColumnDefinition<R>]) -> Self {
        let mut targets = Self::default();
        for column in columns.iter().filter(|column| column.filterable) {
            let id = column.id.clone();
            match column.declared_search_type() {
                SearchType::Date => targets.date_columns.push(id),
                SearchType::Number => targets.numeric_columns.push(id),
                SearchType::Email => {
                    targets.email_column.get_or_insert(id);
                }
                SearchType::Text => targets.text_columns.push(id),
                SearchType::DateRange | SearchType::Select => {}
            }
        }
        targets
    }

    /// Every column any tier may write.
    pub fn managed_columns(&self) -> impl Iterator<Item = &ColumnId> {
        self.date_columns
            .iter()
            .chain(&self.numeric_columns)
            .chain(&self.email_column)
            .chain(&self.text_columns)
    }
}

/// Debounces a free-text query and broadcasts it to the table as typed
/// column filters.
///
/// Each dispatch first clears every column in [`SearchTargets`] and then
/// writes the tier of the current query, so the filters always reflect the
/// latest stabilized query and an empty query leaves none of them behind.
/// Column filters on other columns are kept.
#[derive(Debug, Clone)]
pub struct GlobalSearchDispatcher {
    targets: SearchTargets,
    classifier: TypeClassifier,
    query: DebounceStabilizer<String>,
}

impl GlobalSearchDispatcher {
    #[must_use]
    pub fn new(targets: SearchTargets, classifier: TypeClassifier, delay: Duration) -> Self {
        Self {
            targets,
            classifier,
            query: DebounceStabilizer::new(String::new(), delay),
        }
    }

    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration, policy: MaxWaitPolicy) -> Self {
        self.query = self.query.with_max_wait(max_wait, policy);
        self
    }

    #[must_use]
    pub fn from_settings(targets: SearchTargets, settings: &SearchSettings) -> Self {
        let dispatcher = Self::new(
            targets,
            TypeClassifier::new(settings.date_parser()),
            settings.delay(),
        );
        match settings.max_wait() {
            Some(max_wait) => dispatcher.with_max_wait(max_wait, settings.max_wait_policy),
            None => dispatcher,
        }
    }

    pub fn targets(&self) -> &SearchTargets {
        &self.targets
    }

    pub fn classifier(&self) -> &TypeClassifier {
        &self.classifier
    }

    /// The last stabilized query.
    pub fn query(&self) -> &str {
        self.query.value()
    }

    /// What the user has typed so far.
    pub fn raw_query(&self) -> &str {
        self.query.raw()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.query.is_pending()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.query.next_deadline()
    }

    /// Records a keystroke. Nothing reaches the table until [`Self::poll`]
    /// observes a stabilized value.
    pub fn on_input(&mut self, raw: impl Into<String>, now: Instant) -> bool {
        self.query.update(raw.into(), now)
    }

    /// Dispatches the stabilized query once its timer fires. Returns the
    /// committed query's classification, `None` when nothing was committed
    /// or the query was cleared.
    pub fn poll<R: TableRecord>(
        &mut self,
        now: Instant,
        table: &mut TableStateController<R>,
    ) -> Option<QueryKind> {
        let query = self.query.poll(now)?.clone();
        self.dispatch(&query, table)
    }

    /// Writes `query` to the table immediately, bypassing the debounce.
    pub fn dispatch<R: TableRecord>(
        &self,
        query: &str,
        table: &mut TableStateController<R>,
    ) -> Option<QueryKind> {
        let mut filters = table.filters().clone();
        for column in self.targets.managed_columns() {
            filters.remove(column);
        }

        let kind = (!query.trim().is_empty()).then(|| self.classifier.classify(query));
        let (columns, value): (Vec<&ColumnId>, Option<FilterValue>) = match &kind {
            None => (vec![], None),
            Some(QueryKind::Date(day)) => (
                self.targets.date_columns.iter().collect(),
                Some(FilterValue::Date(*day)),
            ),
            Some(QueryKind::Numeric(number)) => (
                self.targets.numeric_columns.iter().collect(),
                Some(FilterValue::Number(*number)),
            ),
            Some(QueryKind::Email(email)) => (
                self.targets.email_column.iter().collect(),
                Some(FilterValue::Text(email.clone())),
            ),
            Some(QueryKind::Text(text)) => (
                self.targets.text_columns.iter().collect(),
                Some(FilterValue::Text(text.clone())),
            ),
        };

        if let Some(value) = value {
            for column in &columns {
                filters.insert((*column).clone(), value.clone());
            }
        }

        match &kind {
            Some(kind) => debug!("Global search {kind} targets {} column(s)", columns.len()),
            None => debug!("Global search cleared"),
        }
        table.set_column_filters(filters);
        kind
    }

    /// Cancels any pending query. Call when the hosting view goes away.
    pub fn teardown(&mut self) {
        self.query.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use test_log::test;

    use super::*;
    use crate::table::{CellValue, TableOptions, TableRowId};

    #[derive(Debug, Clone)]
    struct Item {
        id: u64,
        name: &'static str,
        supplier: &'static str,
        quantity: i64,
        received: NaiveDate,
        status: &'static str,
    }

    impl TableRecord for Item {
        fn row_id(&self) -> TableRowId {
            TableRowId(self.id)
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn columns() -> Vec<ColumnDefinition<Item>> {
        vec![
            ColumnDefinition::new("name", "Name", |item: &Item| item.name.into()),
            ColumnDefinition::new("supplier", "Supplier", |item: &Item| item.supplier.into())
                .search_type(SearchType::Email),
            ColumnDefinition::new("quantity", "Qty", |item: &Item| item.quantity.into())
                .search_type(SearchType::Number),
            ColumnDefinition::new("received", "Received", |item: &Item| {
                CellValue::Date(item.received)
            })
            .search_type(SearchType::Date),
            ColumnDefinition::new("status", "Status", |item: &Item| item.status.into())
                .search_type(SearchType::Select),
        ]
    }

    fn table() -> TableStateController<Item> {
        let items = vec![
            Item {
                id: 1,
                name: "Hex bolt",
                supplier: "sales@boltco.com",
                quantity: 42,
                received: day(2024, 1, 1),
                status: "Active",
            },
            Item {
                id: 2,
                name: "Washer",
                supplier: "ops@acme.io",
                quantity: 7,
                received: day(2023, 6, 12),
                status: "Active",
            },
            Item {
                id: 3,
                name: "Carriage bolt",
                supplier: "ops@acme.io",
                quantity: 2024,
                received: day(2024, 2, 9),
                status: "Inactive",
            },
        ];
        TableStateController::new(columns(), items, TableOptions::default()).expect("columns")
    }

    fn dispatcher() -> GlobalSearchDispatcher {
        GlobalSearchDispatcher::new(
            SearchTargets::from_columns(&columns()),
            TypeClassifier::default(),
            Duration::from_millis(300),
        )
    }

    fn visible_ids(table: &TableStateController<Item>) -> Vec<u64> {
        table.filtered_rows().iter().map(|item| item.id).collect()
    }

    #[test]
    fn targets_follow_declared_search_types() {
        let targets = SearchTargets::from_columns(&columns());
        assert_eq!(targets.text_columns, vec![ColumnId::from("name")]);
        assert_eq!(targets.email_column, Some(ColumnId::from("supplier")));
        assert_eq!(targets.numeric_columns, vec![ColumnId::from("quantity")]);
        assert_eq!(targets.date_columns, vec![ColumnId::from("received")]);
        assert_eq!(targets.managed_columns().count(), 4);
    }

    #[test]
    fn year_query_filters_date_columns_only() {
        let mut table = table();
        let kind = dispatcher().dispatch("2024", &mut table);

        assert_eq!(kind, Some(QueryKind::Date(day(2024, 1, 1))));
        assert_eq!(table.filters().len(), 1);
        assert_eq!(
            table.filters().get(&ColumnId::from("received")),
            Some(&FilterValue::Date(day(2024, 1, 1)))
        );
        assert_eq!(visible_ids(&table), vec![1]);
    }

    #[test]
    fn each_tier_reaches_its_columns() {
        let mut table = table();
        let dispatcher = dispatcher();

        dispatcher.dispatch("7", &mut table);
        assert_eq!(visible_ids(&table), vec![2]);

        dispatcher.dispatch("ops@acme.io", &mut table);
        assert_eq!(visible_ids(&table), vec![2, 3]);
        assert!(table.filters().get(&ColumnId::from("name")).is_none());

        dispatcher.dispatch("BOLT", &mut table);
        assert_eq!(visible_ids(&table), vec![1, 3]);
        assert_eq!(table.filters().len(), 1);
    }

    #[test]
    fn clearing_query_resets_every_managed_filter() {
        let mut table = table();
        let dispatcher = dispatcher();
        table.set_column_filter(
            &ColumnId::from("status"),
            Some(FilterValue::Select("Active".into())),
        );
        // Filters left behind by per-column inputs on managed columns.
        table.set_column_filter(&ColumnId::from("name"), Some(FilterValue::Text("x".into())));

        dispatcher.dispatch("42", &mut table);
        assert!(table.filters().get(&ColumnId::from("name")).is_none());
        assert_eq!(visible_ids(&table), vec![1]);

        assert_eq!(dispatcher.dispatch("", &mut table), None);
        assert_eq!(table.filters().len(), 1);
        assert!(table.filters().get(&ColumnId::from("status")).is_some());
        assert_eq!(visible_ids(&table), vec![1, 2]);
    }

    #[test]
    fn keystrokes_are_dispatched_after_quiet_period() {
        let start = Instant::now();
        let mut table = table();
        let mut dispatcher = dispatcher();

        for (offset, raw) in [(0, "b"), (80, "bo"), (150, "bol"), (210, "bolt")] {
            let now = start + Duration::from_millis(offset);
            dispatcher.on_input(raw, now);
            assert_eq!(dispatcher.poll(now, &mut table), None);
            assert_eq!(table.filtered_count(), 3);
        }
        assert_eq!(dispatcher.raw_query(), "bolt");
        assert_eq!(dispatcher.query(), "");
        assert_eq!(
            dispatcher.next_deadline(),
            Some(start + Duration::from_millis(510))
        );

        let kind = dispatcher.poll(start + Duration::from_millis(510), &mut table);
        assert_eq!(kind, Some(QueryKind::Text("bolt".into())));
        assert_eq!(dispatcher.query(), "bolt");
        assert_eq!(visible_ids(&table), vec![1, 3]);

        dispatcher.on_input("", start + Duration::from_millis(600));
        assert_eq!(dispatcher.poll(start + Duration::from_millis(900), &mut table), None);
        assert_eq!(table.filtered_count(), 3);
    }

    #[test]
    fn teardown_drops_pending_query() {
        let start = Instant::now();
        let mut table = table();
        let mut dispatcher = dispatcher();

        dispatcher.on_input("washer", start);
        dispatcher.teardown();

        assert!(!dispatcher.is_pending());
        assert_eq!(dispatcher.poll(start + Duration::from_secs(5), &mut table), None);
        assert!(table.filters().is_empty());
    }
}
