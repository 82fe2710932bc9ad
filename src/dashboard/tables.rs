//! Table view of the item totals for each payment type and product category.

use maud::{Markup, html};

use crate::{
    dashboard::aggregation::PaymentCategoryTotal,
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_count},
};

const TABLE_HEADER_CELL_STYLE: &str = "px-6 py-3";
const TABLE_NUMBER_CELL_STYLE: &str = "text-right whitespace-nowrap";

/// Renders a table of the summed item counts for each payment type and category.
///
/// The rows keep the order of `totals`, which groups them by payment type.
/// The first row of each payment type shows the payment type, the rest leave
/// that cell blank so the groups are easy to scan.
pub(super) fn payment_category_table(totals: &[PaymentCategoryTotal]) -> Markup {
    html! {
        section id="payment-category-totals" class="w-full mx-auto mb-8" {
            h3 class="text-xl font-semibold mb-4" { "Items by Payment Method and Category" }

            @if totals.is_empty() {
                p class="text-gray-600 dark:text-gray-400" {
                    "No orders in the selected date range."
                }
            } @else {
                div class="overflow-x-auto max-h-[480px] overflow-y-auto rounded-lg shadow" {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" {
                        thead class=(TABLE_HEADER_STYLE) {
                            tr {
                                th scope="col" class=(TABLE_HEADER_CELL_STYLE) { "Payment Method" }
                                th scope="col" class=(TABLE_HEADER_CELL_STYLE) { "Product Category" }
                                th scope="col" class={(TABLE_HEADER_CELL_STYLE) " text-right"} {
                                    "Total Items"
                                }
                            }
                        }
                        tbody {
                            @for (index, total) in totals.iter().enumerate() {
                                @let is_first_of_group = index == 0
                                    || totals[index - 1].payment_type != total.payment_type;

                                tr class=(TABLE_ROW_STYLE) {
                                    th
                                        scope="row"
                                        class={(TABLE_CELL_STYLE) " font-medium text-gray-900 dark:text-white"}
                                    {
                                        @if is_first_of_group {
                                            (total.payment_type)
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (total.category) }
                                    td class={(TABLE_CELL_STYLE) " " (TABLE_NUMBER_CELL_STYLE)} {
                                        (format_count(total.total_items))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
