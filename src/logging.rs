//! Logging setup for the server: a pretty stdout log, a debug log file and per-request spans.

use std::{fs::OpenOptions, io, path::Path, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `INFO` and above is written to stdout, and everything from `DEBUG` up is
/// appended to the file at `log_path`.
///
/// # Errors
/// Returns an error if the log file cannot be opened for appending.
pub fn setup_logging(log_path: &Path) -> Result<(), io::Error> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();

    Ok(())
}

/// Wrap every request to `router` in a `debug` span with the method, URI and matched route.
pub fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are handled.
        .on_failure(());

    router.layer(tracing_layer)
}
