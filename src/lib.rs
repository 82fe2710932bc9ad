//! An analytics dashboard for a static e-commerce order dataset.
//!
//! The order data is loaded once from a CSV file into an in-memory
//! [OrderTable]. The web app lets the user pick a purchase date range, and
//! serves HTML pages with charts of the orders placed within that range:
//! the best selling product categories, how customers paid, how many orders
//! were placed each month, and which categories sell best in each state.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod config;
mod dashboard;
mod date_range;
mod endpoints;
mod error_pages;
mod html;
mod logging;
mod order;
mod routing;
#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use config::{DEFAULT_TOP_CATEGORIES, DEFAULT_TOP_STATE_CATEGORIES, DashboardConfig};
pub use dashboard::DashboardState;
pub use date_range::{DateRange, DateRangeQuery};
pub use logging::{add_tracing_layer, setup_logging};
pub use order::{
    LoadError, OrderRecord, OrderTable, OrderView, REQUIRED_COLUMNS, UNKNOWN_LABEL, load_orders,
    read_orders,
};
pub use routing::build_router;

use crate::error_pages::{error_page_response, internal_server_error_response};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur while serving the dashboard.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A date in the date range query could not be parsed.
    ///
    /// Callers should pass in the text that failed to parse.
    #[error("\"{0}\" is not a valid date, expected the format YYYY-MM-DD")]
    InvalidDate(String),

    /// The dashboard aggregates could not be written to the export directory.
    ///
    /// Exports are a convenience for inspecting the aggregates, so this error
    /// should be logged and never shown to the client.
    #[error("could not export dashboard aggregates: {0}")]
    Export(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidDate(text) => error_page_response(
                StatusCode::BAD_REQUEST,
                "Invalid date",
                &format!(
                    "\"{text}\" is not a valid date. Pick the dates with the date picker, \
                    or use the format YYYY-MM-DD."
                ),
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                internal_server_error_response()
            }
        }
    }
}
