//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - Route handlers for the dashboard page and the JSON aggregates
//! - HTML view functions for the date range picker and dashboard content
//! - The state used by the handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use axum_htmx::HxRequest;
use maud::{Markup, html};
use serde::Serialize;

use crate::{
    AppState, DashboardConfig, DateRange, DateRangeQuery, Error, OrderTable, OrderView,
    dashboard::{
        aggregation::{
            CategoryCount, MonthlyCount, PaymentCategoryTotal, PaymentTypeCount,
            StateCategoryCount, SummaryStatistics, category_sales, monthly_order_counts,
            payment_type_counts, payment_type_totals, summary_statistics, top_categories,
            top_categories_by_state,
        },
        cards::summary_cards_view,
        charts::{
            DashboardChart, categories_by_state_chart, charts_script, charts_view,
            monthly_orders_chart, payment_types_chart, top_categories_chart,
        },
        export::export_aggregates,
        tables::payment_category_table,
    },
    date_range::format_date,
    endpoints,
    html::{
        ECHARTS_SCRIPT_URL, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
    },
};

/// The state needed for displaying the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The order data to aggregate.
    pub orders: Arc<OrderTable>,
    /// The settings for building the dashboard.
    pub config: DashboardConfig,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            orders: state.orders.clone(),
            config: state.config.clone(),
        }
    }
}

/// Holds all the aggregates needed to render the dashboard.
#[derive(Debug, Serialize)]
struct DashboardData {
    summary: SummaryStatistics,
    category_sales: Vec<CategoryCount>,
    top_categories: Vec<CategoryCount>,
    payment_types: Vec<PaymentTypeCount>,
    payment_category_totals: Vec<PaymentCategoryTotal>,
    monthly_orders: Vec<MonthlyCount>,
    top_categories_by_state: Vec<StateCategoryCount>,
}

/// The body of the JSON aggregates endpoint.
#[derive(Debug, Serialize)]
struct DashboardResponse {
    /// The first day of the applied range, `None` if there is no order data.
    start: Option<String>,
    /// The last day of the applied range, `None` if there is no order data.
    end: Option<String>,
    #[serde(flatten)]
    data: DashboardData,
}

/// Display the dashboard for the date range in the query string.
///
/// HTMX requests, sent when a date picker changes, get only the content of
/// `#dashboard-content` so the page header and scripts are not reloaded.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    HxRequest(is_htmx_request): HxRequest,
    Query(query): Query<DateRangeQuery>,
) -> Result<Response, Error> {
    let Some(bounds) = state.orders.date_bounds() else {
        let content = dashboard_no_data_content();

        return Ok(if is_htmx_request {
            content.into_response()
        } else {
            dashboard_page(&content).into_response()
        });
    };

    let range = query.resolve(bounds).inspect_err(|error| {
        tracing::debug!("Rejected dashboard date range {query:?}: {error}");
    })?;
    let orders = state.orders.filter(range);
    let data = build_dashboard_data(orders, &state.config);
    export_dashboard_data(&data, &state.config).await;
    let charts = build_dashboard_charts(&data, &state.config);

    let content = dashboard_content(range, bounds, &data, &charts);

    if is_htmx_request {
        Ok(content.into_response())
    } else {
        Ok(dashboard_page(&content).into_response())
    }
}

/// Get the dashboard aggregates for the date range in the query string as JSON.
pub async fn get_dashboard_json(
    State(state): State<DashboardState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Response, Error> {
    let Some(bounds) = state.orders.date_bounds() else {
        let data = build_dashboard_data(state.orders.view(), &state.config);
        export_dashboard_data(&data, &state.config).await;

        return Ok(Json(DashboardResponse {
            start: None,
            end: None,
            data,
        })
        .into_response());
    };

    let range = query.resolve(bounds)?;
    let data = build_dashboard_data(state.orders.filter(range), &state.config);
    export_dashboard_data(&data, &state.config).await;

    Ok(Json(DashboardResponse {
        start: Some(format_date(range.start())),
        end: Some(format_date(range.end())),
        data,
    })
    .into_response())
}

/// Runs every aggregation over `orders`.
fn build_dashboard_data(orders: OrderView<'_>, config: &DashboardConfig) -> DashboardData {
    let records = orders.records();

    DashboardData {
        summary: summary_statistics(records),
        category_sales: category_sales(records),
        top_categories: top_categories(records, config.top_categories),
        payment_types: payment_type_counts(records),
        payment_category_totals: payment_type_totals(records),
        monthly_orders: monthly_order_counts(records),
        top_categories_by_state: top_categories_by_state(records, config.top_state_categories),
    }
}

/// Writes the monthly and per state aggregates to the export directory, if one is configured.
///
/// The files are written on the blocking thread pool. Export failures are only logged.
async fn export_dashboard_data(data: &DashboardData, config: &DashboardConfig) {
    let Some(export_dir) = config.export_dir.clone() else {
        return;
    };
    let monthly_orders = data.monthly_orders.clone();
    let top_categories_by_state = data.top_categories_by_state.clone();

    let result = tokio::task::spawn_blocking(move || {
        export_aggregates(&export_dir, &monthly_orders, &top_categories_by_state)
    })
    .await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(error)) => tracing::warn!("{error}"),
        Err(error) => tracing::warn!("The export task did not finish: {error}"),
    }
}

/// Creates the dashboard charts from the aggregates.
///
/// The chart options are serialized for ECharts consumption.
fn build_dashboard_charts(data: &DashboardData, config: &DashboardConfig) -> [DashboardChart; 4] {
    [
        DashboardChart {
            id: "top-categories-chart",
            options: top_categories_chart(&data.top_categories, config.top_categories)
                .to_string(),
        },
        DashboardChart {
            id: "payment-types-chart",
            options: payment_types_chart(&data.payment_types).to_string(),
        },
        DashboardChart {
            id: "monthly-orders-chart",
            options: monthly_orders_chart(&data.monthly_orders).to_string(),
        },
        DashboardChart {
            id: "categories-by-state-chart",
            options: categories_by_state_chart(
                &data.top_categories_by_state,
                config.top_state_categories,
            )
            .to_string(),
        },
    ]
}

fn dashboard_page(content: &Markup) -> Markup {
    let content = html!(
        header class="px-2 lg:px-6 pt-6 mx-auto max-w-screen-2xl text-gray-900 dark:text-white"
        {
            h1 class="text-2xl font-bold" { "E-Commerce Order Dashboard" }
        }

        div
            id="dashboard-content"
            class="px-2 lg:px-6 py-4 lg:py-6 mx-auto max-w-screen-2xl text-gray-900 dark:text-white"
        {
            (content)
        }
    );

    base("Dashboard", &[ECHARTS_SCRIPT_URL], &content)
}

/// Renders the message shown when the order data has no rows at all.
fn dashboard_no_data_content() -> Markup {
    html!(
        div class=(PAGE_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold" { "Nothing here yet..." }

            p
            {
                "Charts will show up here once the order data file has some
                orders with valid purchase timestamps. Check the server logs
                for rows that could not be read."
            }
        }
    )
}

/// Renders the date picker sidebar next to the summary cards, charts and table.
fn dashboard_content(
    range: DateRange,
    bounds: DateRange,
    data: &DashboardData,
    charts: &[DashboardChart],
) -> Markup {
    let start = format_date(range.start());
    let end = format_date(range.end());

    html!(
        div class="flex flex-col lg:flex-row gap-6 w-full"
        {
            aside class="w-full lg:w-64 shrink-0"
            {
                (date_range_form(range, bounds))
            }

            div class="flex flex-col grow min-w-0"
            {
                p id="date-range-message" class="mb-4 text-gray-600 dark:text-gray-400"
                {
                    "Showing data from " (start) " to " (end)
                }

                (summary_cards_view(&data.summary))
                (charts_view(charts))
                (payment_category_table(&data.payment_category_totals))
            }
        }

        (charts_script(charts))
    )
}

fn date_range_form(range: DateRange, bounds: DateRange) -> Markup {
    let min = format_date(bounds.start());
    let max = format_date(bounds.end());

    html!(
        form
            action=(endpoints::DASHBOARD_VIEW)
            method="get"
            hx-get=(endpoints::DASHBOARD_VIEW)
            hx-target="#dashboard-content"
            hx-swap="innerHTML"
            hx-trigger="change"
            hx-push-url="true"
            hx-indicator="#indicator"
            class="bg-white dark:bg-gray-800 p-4 rounded-lg shadow-md space-y-4"
        {
            h2 class="text-lg font-semibold" { "Date Range" }

            div
            {
                label for="start" class=(FORM_LABEL_STYLE) { "Start date" }
                input
                    id="start"
                    name="start"
                    type="date"
                    value=(format_date(range.start()))
                    min=(min)
                    max=(max)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end" class=(FORM_LABEL_STYLE) { "End date" }
                input
                    id="end"
                    name="end"
                    type="date"
                    value=(format_date(range.end()))
                    min=(min)
                    max=(max)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="flex items-center justify-between"
            {
                button
                    type="submit"
                    class="px-4 py-2 text-sm font-medium text-white bg-blue-600
                        hover:bg-blue-700 rounded"
                {
                    "Apply"
                }

                span
                    id="indicator"
                    class="htmx-indicator text-sm text-gray-600 dark:text-gray-400"
                {
                    "Loading..."
                }

                a
                    href=(endpoints::DASHBOARD_VIEW)
                    class="text-sm text-blue-600 hover:underline dark:text-blue-500"
                {
                    "Reset"
                }
            }
        }
    )
}
