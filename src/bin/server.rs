use std::{net::SocketAddr, path::PathBuf, process::exit};

use axum_server::Handle;
use clap::Parser;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use olist_dashboard::{
    AppState, DashboardConfig, add_tracing_layer, build_router, graceful_shutdown, load_orders,
    setup_logging,
};

/// The web server for the e-commerce order dashboard.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the CSV file with the order data.
    #[arg(long, default_value = "dashboard/Main_data.csv")]
    data_path: PathBuf,

    /// The port to serve the dashboard from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Directory to write the monthly and per state aggregates to as CSV files.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// The number of categories in the top categories chart.
    #[arg(long, default_value_t = olist_dashboard::DEFAULT_TOP_CATEGORIES)]
    top_categories: usize,

    /// The number of categories to compare across customer states.
    #[arg(long, default_value_t = olist_dashboard::DEFAULT_TOP_STATE_CATEGORIES)]
    top_state_categories: usize,

    /// File path to append the debug log to.
    #[arg(long, default_value = "debug.log")]
    log_path: PathBuf,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    setup_logging(&args.log_path).expect("Could not create log file");

    let orders = match load_orders(&args.data_path) {
        Ok(orders) => orders,
        Err(error) => {
            tracing::error!("{error}");
            exit(1);
        }
    };

    tracing::info!(
        "Loaded {} order records from {} ({} rows dropped)",
        orders.len(),
        args.data_path.display(),
        orders.dropped_rows()
    );

    match orders.date_bounds() {
        Some(bounds) => tracing::info!(
            "Orders were purchased from {} to {}",
            bounds.start(),
            bounds.end()
        ),
        None => tracing::warn!("The order data has no rows, the dashboard will be empty"),
    }

    let config = DashboardConfig {
        top_categories: args.top_categories,
        top_state_categories: args.top_state_categories,
        export_dir: args.export_dir,
    };
    let state = AppState::new(orders, config);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    tracing::info!("HTTP server listening on http://{}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("Could not start the server");
}
