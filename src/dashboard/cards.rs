//! Headline cards summarising the orders in the selected date range.

use maud::{Markup, html};

use crate::{dashboard::aggregation::SummaryStatistics, html::format_count};

/// Renders one card each for the number of orders, order items, categories and states.
pub(super) fn summary_cards_view(statistics: &SummaryStatistics) -> Markup {
    let cards = [
        ("Orders", statistics.orders),
        ("Order Items", statistics.items),
        ("Product Categories", statistics.categories),
        ("Customer States", statistics.states),
    ];

    html! {
        section id="summary" class="w-full mx-auto mb-4" {
            div class="grid grid-cols-2 lg:grid-cols-4 gap-4" {
                @for (label, value) in cards {
                    (summary_card(label, value))
                }
            }
        }
    }
}

fn summary_card(label: &str, value: usize) -> Markup {
    html! {
        div
            class="bg-white dark:bg-gray-800 border border-gray-200
                   dark:border-gray-700 rounded-lg p-4 shadow-md"
            aria-label=(format!("{label}: {value}"))
        {
            p class="text-sm text-gray-600 dark:text-gray-400" { (label) }
            p class="text-2xl font-bold" { (format_count(value as f64)) }
        }
    }
}
