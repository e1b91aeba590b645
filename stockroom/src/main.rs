#![deny(unused_crate_dependencies)]

mod product;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use clap::Parser;
use eyre::{Context, Result, bail};
use itertools::Itertools;
use libstockroom::logs::{self, take_recorded};
use libstockroom::{
    ActionKind, ActionMenuFactory, CellValue, ColumnId, ExplorerConfig, FilterInput,
    GlobalSearchDispatcher, StatusBadgeRenderer, TableOptions, TableRecord, TableRowId,
    TableStateController,
};
use tracing::{Level, info, warn};

use crate::product::{Product, columns, load_products, search_targets};

/// Simulated gap between keystrokes when replaying `--search`.
const KEYSTROKE_INTERVAL: Duration = Duration::from_millis(40);

#[derive(clap::Parser)]
#[command(version, about)]
struct Args {
    /// Product export in JSON format.
    products: PathBuf,
    /// Global search query. Classified as date, number, email or text and
    /// applied to the matching columns.
    #[clap(long)]
    search: Option<String>,
    /// Column filter as `column=value`. Date ranges are written `from..to`.
    #[clap(long, value_name = "COLUMN=VALUE")]
    filter: Vec<String>,
    /// Toggle the sort of a column. Repeat to flip the direction.
    #[clap(long, value_name = "COLUMN")]
    sort: Vec<String>,
    /// One-based page number.
    #[clap(long, default_value_t = 1)]
    page: usize,
    #[clap(long)]
    page_size: Option<usize>,
    /// Mark a product id as selected.
    #[clap(long, value_name = "ID")]
    select: Vec<u64>,
    /// Delete a product through its row action before rendering.
    #[clap(long, value_name = "ID")]
    delete: Vec<u64>,
    /// Hide a column.
    #[clap(long, value_name = "COLUMN")]
    hide: Vec<String>,
    /// List the distinct values of a column among the filtered rows.
    #[clap(long, value_name = "COLUMN")]
    facets: Option<String>,
    /// Ignore user and local configuration files.
    #[clap(long)]
    default_config: bool,
}

fn main() -> Result<()> {
    simple_eyre::install()?;
    logs::start_logging()?;

    let args = Args::parse();
    let config = ExplorerConfig::new(args.default_config)?;
    let dates = config.search.date_parser();
    let badges = StatusBadgeRenderer::from_settings(&config.status)
        .context("Invalid [status] configuration")?;

    let products = load_products(&args.products, &dates)?;
    info!("Loaded {} products", products.len());

    let mut table = TableStateController::new(
        columns(),
        products.clone(),
        TableOptions::from(&config.table),
    )?
    .with_date_parser(dates.clone());

    let deleted = Arc::new(Mutex::new(Vec::<TableRowId>::new()));
    let actions = {
        let deleted = Arc::clone(&deleted);
        ActionMenuFactory::new()
            .on_view(|product: &Product| info!("View {}", product.sku))
            .on_edit(|product: &Product| info!("Edit {}", product.sku))
            .custom_action("Restock", Some("truck"), |product: &Product| {
                info!("Restock {} (on hand {})", product.sku, product.quantity);
            })
            .on_delete(move |product: &Product| {
                if let Ok(mut deleted) = deleted.lock() {
                    deleted.push(product.row_id());
                }
            })
    };

    for id in &args.delete {
        let Some(product) = products.iter().find(|product| product.id == *id) else {
            bail!("No product with id {id}");
        };
        actions.build(product).invoke(ActionKind::Delete);
    }
    let deleted: BTreeSet<TableRowId> = deleted
        .lock()
        .map(|deleted| deleted.iter().copied().collect())
        .unwrap_or_default();
    if !deleted.is_empty() {
        table.set_rows(
            products
                .into_iter()
                .filter(|product| !deleted.contains(&product.row_id()))
                .collect(),
        );
    }

    if let Some(page_size) = args.page_size {
        if !config.table.page_size_options.contains(&page_size) {
            warn!(
                "Page size {page_size} is not one of the offered sizes ({})",
                config.table.page_size_options.iter().join(", ")
            );
        }
        table.set_page_size(page_size);
    }
    for column in &args.hide {
        table.toggle_column_visibility(&ColumnId::from(column.as_str()));
    }

    for filter in &args.filter {
        let Some((column, value)) = filter.split_once('=') else {
            bail!("Filter '{filter}' is not of the form column=value");
        };
        let column = ColumnId::from(column.trim());
        let Some(mut input) = FilterInput::for_table_column(&table, &column) else {
            bail!("Unknown column '{column}'");
        };
        match input.enter_text(value.trim(), &dates) {
            Some(emit) => table
                .try_set_column_filter(&column, emit.into_value())
                .with_context(|| format!("Cannot apply filter '{filter}'"))?,
            None => bail!("'{value}' is not a valid {} filter", input.search_type()),
        }
    }

    if let Some(query) = &args.search {
        let mut search = GlobalSearchDispatcher::from_settings(search_targets(), &config.search);
        let mut now = Instant::now();
        let mut typed = String::new();
        for c in query.chars() {
            typed.push(c);
            search.on_input(typed.as_str(), now);
            search.poll(now, &mut table);
            now += KEYSTROKE_INTERVAL;
        }
        while let Some(deadline) = search.next_deadline() {
            if let Some(kind) = search.poll(deadline, &mut table) {
                println!("Search: {kind}");
            }
        }
        search.teardown();
    }

    for column in &args.sort {
        table.toggle_sort(&ColumnId::from(column.as_str()));
    }
    table.set_page_index(args.page.saturating_sub(1));
    table.set_row_selection(args.select.iter().copied().map(TableRowId).collect());

    print_table(&table, &badges);

    println!();
    println!(
        "Actions: {}",
        actions.items().iter().map(|item| &item.label).join(" | ")
    );
    let info = table.page_info();
    println!(
        "{} (page {}/{})",
        info.summary(),
        info.page_index + 1,
        info.page_count.max(1)
    );
    let selection = table.selection_summary();
    if !selection.is_empty() {
        println!("{selection}");
    }

    if let Some(column) = &args.facets {
        println!();
        println!("Values of {column}:");
        for facet in table.faceted_unique_values(&ColumnId::from(column.as_str())) {
            println!("  {} ({})", facet.value, facet.count);
        }
    }

    let warnings = take_recorded(Level::WARN);
    if !warnings.is_empty() {
        println!();
        for warning in warnings {
            println!("{}: {}", warning.level, warning.msg);
        }
    }

    Ok(())
}

fn print_table(table: &TableStateController<Product>, badges: &StatusBadgeRenderer) {
    let columns = table.visible_columns();
    let header: Vec<String> = columns
        .iter()
        .map(|column| match table.sort_indicator(&column.id) {
            Some(arrow) => format!("{} {arrow}", column.header),
            None => column.header.clone(),
        })
        .collect();

    let rows: Vec<Vec<String>> = table
        .page_rows()
        .into_iter()
        .map(|product| {
            let mark = if table.is_selected(product.row_id()) {
                "*"
            } else {
                " "
            };
            std::iter::once(mark.to_string())
                .chain(columns.iter().map(|column| {
                    match (column.id.as_str(), column.value(product)) {
                        ("status", CellValue::Text(status)) => {
                            let badge = badges.render(&status);
                            match badge.icon {
                                Some(icon) => format!("[{icon}] {}", badge.label),
                                None => badge.label,
                            }
                        }
                        (_, cell) => cell.to_string(),
                    }
                }))
                .collect()
        })
        .collect();

    let header: Vec<String> = std::iter::once(String::new()).chain(header).collect();
    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .join("  ")
            .trim_end()
            .to_string()
    };
    println!("{}", line(&header));
    for row in &rows {
        println!("{}", line(row));
    }
}
