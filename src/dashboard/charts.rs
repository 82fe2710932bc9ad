//! Chart generation and rendering for the dashboard.
//!
//! This module creates interactive ECharts visualizations for the order data:
//! - **Top Categories Chart**: Horizontal bar chart of the best selling categories
//! - **Payment Types Chart**: Bar chart of how many order items were paid with each method
//! - **Monthly Orders Chart**: Line chart of order items per month
//! - **Categories by State Chart**: Grouped horizontal bar chart of the top categories per state
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization code.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::{Line, bar::Bar},
};
use maud::{Markup, PreEscaped, html};

use crate::dashboard::aggregation::{
    CategoryCount, MonthlyCount, PaymentTypeCount, StateCategoryCount, format_month_label,
    group_state_counts_by_category,
};

const EMPTY_SUBTEXT: &str = "No orders in the selected date range";

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for dashboard charts.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        data-chart
                        class="min-h-[420px] rounded bg-white dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Resizes every chart on the page. Registered once per page, however many
/// times htmx swaps in new charts.
const RESIZE_LISTENER_SCRIPT: &str = r#"if (!window.resizeDashboardCharts) {
    window.resizeDashboardCharts = () => {
        document.querySelectorAll("[data-chart]").forEach((chartDom) => {
            const chart = echarts.getInstanceByDom(chartDom);
            if (chart) {
                chart.resize();
            }
        });
    };
    window.addEventListener('resize', window.resizeDashboardCharts);
}"#;

/// Generates the inline script that initializes the ECharts instances.
///
/// The script must come after the chart containers. It runs both on the
/// initial page load and when htmx swaps in new dashboard content, so any
/// chart already attached to a container is disposed first.
pub(super) fn charts_script(charts: &[DashboardChart]) -> Markup {
    let chart_scripts = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const existing = echarts.getInstanceByDom(chartDom);
                    if (existing) {{
                        existing.dispose();
                    }}
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let script_content = format!("{RESIZE_LISTENER_SCRIPT}\n{chart_scripts}");

    html!(
        script { (PreEscaped(script_content)) }
    )
}

/// Horizontal bar chart of the categories with the most order items, largest at the top.
pub(super) fn top_categories_chart(top_categories: &[CategoryCount], top_n: usize) -> Chart {
    // ECharts draws the first category at the bottom of the y-axis.
    let labels: Vec<String> = top_categories
        .iter()
        .rev()
        .map(|sale| sale.category.clone())
        .collect();
    let values: Vec<f64> = top_categories
        .iter()
        .rev()
        .map(|sale| sale.count as f64)
        .collect();

    Chart::new()
        .title(chart_title(
            &format!("Top {top_n} Product Categories"),
            "By number of order items",
            labels.is_empty(),
        ))
        .tooltip(count_tooltip())
        .grid(chart_grid())
        .x_axis(
            Axis::new()
                .type_(AxisType::Value)
                .name("Order items")
                .axis_label(AxisLabel::new().formatter(count_formatter())),
        )
        .y_axis(Axis::new().type_(AxisType::Category).data(labels))
        .series(Bar::new().name("Order items").data(values))
}

/// Bar chart of the number of order items paid with each payment type.
pub(super) fn payment_types_chart(payment_types: &[PaymentTypeCount]) -> Chart {
    let labels: Vec<String> = payment_types
        .iter()
        .map(|payment| payment.payment_type.clone())
        .collect();
    let values: Vec<f64> = payment_types
        .iter()
        .map(|payment| payment.count as f64)
        .collect();

    Chart::new()
        .title(chart_title(
            "Payment Methods",
            "Most used payment methods",
            labels.is_empty(),
        ))
        .tooltip(count_tooltip())
        .grid(chart_grid())
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(count_formatter())),
        )
        .series(Bar::new().name("Order items").data(values))
}

/// Line chart of the number of order items per month.
pub(super) fn monthly_orders_chart(monthly_counts: &[MonthlyCount]) -> Chart {
    let labels: Vec<String> = monthly_counts
        .iter()
        .map(|monthly| format_month_label(monthly.month))
        .collect();
    let values: Vec<f64> = monthly_counts
        .iter()
        .map(|monthly| monthly.count as f64)
        .collect();

    Chart::new()
        .title(chart_title(
            "Sales Trend",
            "Order items per month",
            labels.is_empty(),
        ))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(count_formatter()),
        )
        .grid(chart_grid())
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .name("Month")
                .data(labels),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .name("Order items")
                .axis_label(AxisLabel::new().formatter(count_formatter())),
        )
        .series(Line::new().name("Order items").data(values))
}

/// Grouped horizontal bar chart with one bar per top category for each customer state.
pub(super) fn categories_by_state_chart(counts: &[StateCategoryCount], top_n: usize) -> Chart {
    let (states, series_data) = group_state_counts_by_category(counts);

    let mut chart = Chart::new()
        .title(
            chart_title(
                &format!("Top {top_n} Categories by Customer State"),
                "Order items per state",
                states.is_empty(),
            )
            .left(20)
            .top("1%"),
        )
        .tooltip(count_tooltip())
        .legend(Legend::new().left(20).top(50))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(110)
                .contain_label(true),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Value)
                .name("Order items")
                .axis_label(AxisLabel::new().formatter(count_formatter())),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Category)
                .name("State")
                .data(states),
        );

    for (category, data) in series_data {
        chart = chart.series(Bar::new().name(category).data(data));
    }

    chart
}

fn chart_title(text: &str, subtext: &str, is_empty: bool) -> Title {
    let subtext = if is_empty { EMPTY_SUBTEXT } else { subtext };

    Title::new().text(text).subtext(subtext)
}

fn chart_grid() -> Grid {
    Grid::new()
        .left("3%")
        .right("4%")
        .bottom("3%")
        .contain_label(true)
}

#[inline]
fn count_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const countFormatter = new Intl.NumberFormat('en-US');
            return (number) ? countFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for count values
fn count_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(count_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
