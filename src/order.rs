//! The order table: loading order records from CSV and filtering them by purchase date.
//!
//! Each row of the source is one order-item-level fact that has already been
//! joined with its product category, payment and customer location. The table
//! is loaded once, sorted by purchase timestamp, and never modified afterwards.

use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use time::{
    Date, PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::date_range::DateRange;

/// The label used when a record has no value for a text column.
pub const UNKNOWN_LABEL: &str = "unknown";

/// The columns that must be present in the header of the order data.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "order_id",
    "order_purchase_timestamp",
    "product_category_name_english",
    "payment_type",
    "order_item_id_x",
    "customer_state",
];

const TIMESTAMP_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The errors that stop the order data from being loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be opened or read.
    #[error("could not read order data from \"{}\": {source}", .path.display())]
    Io {
        /// The path that was being read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The data is not well-formed CSV, e.g. a row has the wrong number of fields.
    #[error("could not parse the order data as CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The header row does not contain every column in [REQUIRED_COLUMNS].
    #[error("the order data is missing the required columns: {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
}

/// A single order item joined with its category, payment and customer location.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    /// The order this item belongs to. Not unique per record.
    pub order_id: String,
    /// When the order was placed.
    pub purchased_at: PrimitiveDateTime,
    /// The English product category name.
    pub category: Option<String>,
    /// How the order was paid for, e.g. "credit_card" or "boleto".
    pub payment_type: Option<String>,
    /// The per-order item number, summed as a proxy for the number of items.
    pub item_count: Option<f64>,
    /// The two letter code of the customer's state.
    pub customer_state: Option<String>,
}

impl OrderRecord {
    /// Create a record with only the order ID and purchase timestamp set.
    ///
    /// Use the builder methods to fill in the remaining fields.
    pub fn build(order_id: &str, purchased_at: PrimitiveDateTime) -> Self {
        Self {
            order_id: order_id.to_owned(),
            purchased_at,
            category: None,
            payment_type: None,
            item_count: None,
            customer_state: None,
        }
    }

    /// Set the product category.
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }

    /// Set the payment type.
    pub fn payment_type(mut self, payment_type: &str) -> Self {
        self.payment_type = Some(payment_type.to_owned());
        self
    }

    /// Set the item count.
    pub fn item_count(mut self, item_count: f64) -> Self {
        self.item_count = Some(item_count);
        self
    }

    /// Set the customer's state.
    pub fn customer_state(mut self, customer_state: &str) -> Self {
        self.customer_state = Some(customer_state.to_owned());
        self
    }

    /// The category name, or [UNKNOWN_LABEL] if the record has none.
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    /// The payment type, or [UNKNOWN_LABEL] if the record has none.
    pub fn payment_type_label(&self) -> &str {
        self.payment_type.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    /// The customer's state, or [UNKNOWN_LABEL] if the record has none.
    pub fn customer_state_label(&self) -> &str {
        self.customer_state.as_deref().unwrap_or(UNKNOWN_LABEL)
    }
}

/// A row as it appears in the CSV file, before the timestamp is parsed.
#[derive(Debug, Deserialize)]
struct CsvOrderRow {
    order_id: String,
    order_purchase_timestamp: String,
    #[serde(rename = "product_category_name_english")]
    category: Option<String>,
    payment_type: Option<String>,
    #[serde(rename = "order_item_id_x", deserialize_with = "csv::invalid_option")]
    item_count: Option<f64>,
    customer_state: Option<String>,
}

impl CsvOrderRow {
    fn into_record(self, purchased_at: PrimitiveDateTime) -> OrderRecord {
        OrderRecord {
            order_id: self.order_id,
            purchased_at,
            category: self.category,
            payment_type: self.payment_type,
            item_count: self.item_count,
            customer_state: self.customer_state,
        }
    }
}

/// All of the order records, sorted by purchase timestamp.
#[derive(Debug, Default)]
pub struct OrderTable {
    records: Vec<OrderRecord>,
    dropped_rows: usize,
}

impl OrderTable {
    /// Create a table from `records` in any order.
    pub fn new(mut records: Vec<OrderRecord>) -> Self {
        // Stable, so records with the same timestamp keep their source order.
        records.sort_by_key(|record| record.purchased_at);

        Self {
            records,
            dropped_rows: 0,
        }
    }

    /// The number of source rows dropped because their timestamp could not be parsed.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// A view over every record in the table.
    pub fn view(&self) -> OrderView<'_> {
        OrderView {
            records: &self.records,
        }
    }

    /// The records purchased on a day within `range`.
    pub fn filter(&self, range: DateRange) -> OrderView<'_> {
        self.view().filter(range)
    }

    /// The dates of the first and last purchase, or `None` if the table is empty.
    pub fn date_bounds(&self) -> Option<DateRange> {
        self.view().date_bounds()
    }

    /// The number of records in the table.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A borrowed, timestamp-sorted subset of an [OrderTable].
#[derive(Debug, Clone, Copy)]
pub struct OrderView<'a> {
    records: &'a [OrderRecord],
}

impl<'a> OrderView<'a> {
    /// The records purchased on a day within `range`, both ends inclusive.
    ///
    /// The end date covers its whole day, so a purchase at 23:59 on the end
    /// date is included.
    pub fn filter(self, range: DateRange) -> OrderView<'a> {
        let start = self
            .records
            .partition_point(|record| record.purchased_at.date() < range.start());
        let end = self
            .records
            .partition_point(|record| record.purchased_at.date() <= range.end());

        OrderView {
            records: &self.records[start..end],
        }
    }

    /// The records in this view, sorted by purchase timestamp.
    pub fn records(&self) -> &'a [OrderRecord] {
        self.records
    }

    /// The dates of the first and last purchase, or `None` if the view is empty.
    pub fn date_bounds(&self) -> Option<DateRange> {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => Some(DateRange::new(
                first.purchased_at.date(),
                last.purchased_at.date(),
            )),
            _ => None,
        }
    }

    /// The number of records in the view.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the view has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Load the order table from the CSV file at `path`.
///
/// # Errors
/// Returns a [LoadError] if the file cannot be opened, is not valid CSV, or
/// is missing any of the [REQUIRED_COLUMNS].
pub fn load_orders(path: &Path) -> Result<OrderTable, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;

    read_orders(file)
}

/// Read the order table from CSV data with a header row.
///
/// Rows whose purchase timestamp cannot be parsed are dropped and counted in
/// [OrderTable::dropped_rows]. Columns other than [REQUIRED_COLUMNS] are ignored.
///
/// # Errors
/// Returns a [LoadError] if the data is not valid CSV or is missing any of the
/// [REQUIRED_COLUMNS].
pub fn read_orders<R: io::Read>(reader: R) -> Result<OrderTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    check_required_columns(reader.headers()?)?;

    let mut records = Vec::new();
    let mut dropped_rows = 0;

    for (row_number, row) in reader.deserialize::<CsvOrderRow>().enumerate() {
        let row = row?;

        match parse_timestamp(&row.order_purchase_timestamp) {
            Some(purchased_at) => records.push(row.into_record(purchased_at)),
            None => {
                tracing::debug!(
                    "Dropping row {row_number} (order {}): invalid purchase timestamp {:?}",
                    row.order_id,
                    row.order_purchase_timestamp
                );
                dropped_rows += 1;
            }
        }
    }

    if dropped_rows > 0 {
        tracing::warn!("Dropped {dropped_rows} rows with an invalid purchase timestamp");
    }

    Ok(OrderTable {
        dropped_rows,
        ..OrderTable::new(records)
    })
}

fn check_required_columns(headers: &csv::StringRecord) -> Result<(), LoadError> {
    let missing_columns: Vec<_> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|column| !headers.iter().any(|header| header == *column))
        .collect();

    if missing_columns.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MissingColumns(missing_columns))
    }
}

/// Parses a purchase timestamp, returning `None` if `text` matches none of the accepted formats.
///
/// A bare date is interpreted as midnight on that day.
fn parse_timestamp(text: &str) -> Option<PrimitiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(text, format).ok())
        .or_else(|| {
            Date::parse(text, DATE_FORMAT)
                .ok()
                .map(|date| date.midnight())
        })
}
