//! Implements a struct that holds the state of the dashboard server.

use std::sync::Arc;

use crate::{DashboardConfig, OrderTable};

/// The state of the dashboard server.
///
/// The order table is never modified after it is loaded, so it is shared
/// between requests without a lock.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The order data to aggregate.
    pub orders: Arc<OrderTable>,

    /// The settings for building the dashboard.
    pub config: DashboardConfig,
}

impl AppState {
    /// Create a new [AppState] that serves `orders`.
    pub fn new(orders: OrderTable, config: DashboardConfig) -> Self {
        Self {
            orders: Arc::new(orders),
            config,
        }
    }
}
