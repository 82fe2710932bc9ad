//! Dashboard module
//!
//! Provides an overview page with charts of the orders placed in a date range.
//! Includes a JSON endpoint with the same aggregates and optional CSV exports.

mod aggregation;
mod cards;
mod charts;
mod export;
mod handlers;
mod tables;

pub use handlers::{DashboardState, get_dashboard_json, get_dashboard_page};
