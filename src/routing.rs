//! Application router configuration.

use axum::{Router, response::Redirect, routing::get};

use crate::{
    AppState,
    dashboard::{get_dashboard_json, get_dashboard_page},
    endpoints,
    error_pages::{get_404_not_found, get_internal_server_error_page},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::DASHBOARD_API, get(get_dashboard_json))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
