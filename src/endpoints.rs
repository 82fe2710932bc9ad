//! The API endpoints URIs.

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The dashboard page.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The dashboard aggregates as JSON.
pub const DASHBOARD_API: &str = "/api/dashboard";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
