//! Writes dashboard aggregates to CSV files for inspection outside the app.
//!
//! Nothing reads these files back; they are overwritten on every dashboard build.

use std::{fs, path::Path};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::{
    Error,
    dashboard::aggregation::{MonthlyCount, StateCategoryCount, format_month_label},
};

pub(super) const MONTHLY_ORDERS_FILE: &str = "monthly_orders.csv";
pub(super) const TOP_CATEGORIES_BY_STATE_FILE: &str = "top_categories_by_state.csv";

#[derive(Serialize)]
struct MonthlyOrdersRow {
    month: String,
    order_count: usize,
}

#[derive(Serialize)]
struct StateCategoryRow<'a> {
    customer_state: &'a str,
    product_category: &'a str,
    order_count: usize,
}

/// Writes the monthly order counts and top categories by state into `export_dir`.
///
/// The directory is created if it does not exist.
///
/// # Errors
/// Returns [Error::Export] if the directory or either file cannot be written.
pub(super) fn export_aggregates(
    export_dir: &Path,
    monthly_counts: &[MonthlyCount],
    state_counts: &[StateCategoryCount],
) -> Result<(), Error> {
    fs::create_dir_all(export_dir).map_err(|error| {
        Error::Export(format!(
            "could not create directory \"{}\": {error}",
            export_dir.display()
        ))
    })?;

    write_csv(
        &export_dir.join(MONTHLY_ORDERS_FILE),
        monthly_counts.iter().map(|monthly| MonthlyOrdersRow {
            month: format_month_label(monthly.month),
            order_count: monthly.count,
        }),
    )?;

    write_csv(
        &export_dir.join(TOP_CATEGORIES_BY_STATE_FILE),
        state_counts.iter().map(|count| StateCategoryRow {
            customer_state: &count.state,
            product_category: &count.category,
            order_count: count.count,
        }),
    )
}

/// Writes `rows` to a temporary file in the same directory and renames it over `path`.
///
/// The rename is atomic, so a concurrent export never sees a partially written file.
fn write_csv<T: Serialize>(path: &Path, rows: impl Iterator<Item = T>) -> Result<(), Error> {
    let to_export_error =
        |error: String| Error::Export(format!("could not write \"{}\": {error}", path.display()));

    let directory = path.parent().unwrap_or(Path::new("."));
    let mut temp_file =
        NamedTempFile::new_in(directory).map_err(|error| to_export_error(error.to_string()))?;

    {
        let mut writer = csv::Writer::from_writer(temp_file.as_file_mut());

        for row in rows {
            writer
                .serialize(row)
                .map_err(|error| to_export_error(error.to_string()))?;
        }

        writer
            .flush()
            .map_err(|error| to_export_error(error.to_string()))?;
    }

    temp_file
        .persist(path)
        .map_err(|error| to_export_error(error.error.to_string()))?;

    tracing::debug!("Exported dashboard aggregates to {}", path.display());

    Ok(())
}
