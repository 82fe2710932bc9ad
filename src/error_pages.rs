//! The pages to display when a route does not exist or something goes wrong on the server.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

/// Route handler for requests that do not match any route.
pub async fn get_404_not_found() -> Response {
    error_page_response(
        StatusCode::NOT_FOUND,
        "Page not found.",
        "Check the address, or head back to the dashboard.",
    )
}

/// Route handler for the internal server error page.
pub async fn get_internal_server_error_page() -> Response {
    internal_server_error_response()
}

/// The generic 500 page, for errors whose details should stay in the server logs.
pub fn internal_server_error_response() -> Response {
    error_page_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Sorry, something went wrong.",
        "Try again later or check the server logs",
    )
}

/// An error page showing the status code, what went wrong and how to fix it.
pub fn error_page_response(status: StatusCode, description: &str, fix: &str) -> Response {
    let title = status.canonical_reason().unwrap_or("Error");
    let header = status.as_str();

    (
        status,
        Html(error_view(title, header, description, fix).into_string()),
    )
        .into_response()
}
