//! Settings that control what the dashboard shows and where it writes its exports.

use std::path::PathBuf;

/// The default number of categories in the top categories chart.
pub const DEFAULT_TOP_CATEGORIES: usize = 10;
/// The default number of categories compared across customer states.
pub const DEFAULT_TOP_STATE_CATEGORIES: usize = 5;

/// Configuration for building the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// How many categories to show in the top categories chart.
    pub top_categories: usize,
    /// How many of the best selling categories to break down by customer state.
    pub top_state_categories: usize,
    /// If set, the monthly order counts and top categories by state are
    /// written to CSV files in this directory every time the dashboard is built.
    pub export_dir: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_categories: DEFAULT_TOP_CATEGORIES,
            top_state_categories: DEFAULT_TOP_STATE_CATEGORIES,
            export_dir: None,
        }
    }
}
