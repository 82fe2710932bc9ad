//! Order data aggregation for the dashboard charts and tables.
//!
//! Each function groups the filtered order records by one or more keys and
//! counts or sums each group. The output order is fully determined by the
//! data, never by the order of the input records, so the charts are stable
//! between renders.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Serialize, Serializer};
use time::{Date, Duration, Month};

use crate::OrderRecord;

/// The number of records in a product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(super) struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// The number of records paid for with a payment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(super) struct PaymentTypeCount {
    pub payment_type: String,
    pub count: usize,
}

/// The summed item count for a payment type and product category pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct PaymentCategoryTotal {
    pub payment_type: String,
    pub category: String,
    pub total_items: f64,
}

/// The number of records purchased in a calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(super) struct MonthlyCount {
    /// The first day of the month.
    #[serde(serialize_with = "serialize_month")]
    pub month: Date,
    pub count: usize,
}

/// The number of records for a product category from customers in one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(super) struct StateCategoryCount {
    pub state: String,
    pub category: String,
    pub count: usize,
}

/// Headline numbers for the filtered orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(super) struct SummaryStatistics {
    /// Order items, i.e. records.
    pub items: usize,
    /// Distinct order IDs.
    pub orders: usize,
    pub categories: usize,
    pub states: usize,
}

/// Counts records per product category.
///
/// Records without a category are counted under [crate::UNKNOWN_LABEL], so the
/// counts always add up to `orders.len()`.
///
/// # Returns
/// Category counts sorted by count, largest first, with ties in alphabetical order.
pub(super) fn category_sales(orders: &[OrderRecord]) -> Vec<CategoryCount> {
    count_by(orders, OrderRecord::category_label)
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_owned(),
            count,
        })
        .collect()
}

/// Gets the `top_n` categories with the most records.
///
/// # Returns
/// At most `top_n` category counts in the same order as [category_sales].
pub(super) fn top_categories(orders: &[OrderRecord], top_n: usize) -> Vec<CategoryCount> {
    let mut sales = category_sales(orders);
    sales.truncate(top_n);
    sales
}

/// Counts records per payment type.
///
/// # Returns
/// Payment type counts sorted by count, largest first, with ties in alphabetical order.
pub(super) fn payment_type_counts(orders: &[OrderRecord]) -> Vec<PaymentTypeCount> {
    count_by(orders, OrderRecord::payment_type_label)
        .into_iter()
        .map(|(payment_type, count)| PaymentTypeCount {
            payment_type: payment_type.to_owned(),
            count,
        })
        .collect()
}

/// Sums the item count for each payment type and product category pair.
///
/// Missing item counts add nothing to their group.
///
/// # Returns
/// Totals sorted by payment type, then by total (largest first), then by category.
pub(super) fn payment_type_totals(orders: &[OrderRecord]) -> Vec<PaymentCategoryTotal> {
    let mut totals: HashMap<(&str, &str), f64> = HashMap::new();

    for order in orders {
        let key = (order.payment_type_label(), order.category_label());
        *totals.entry(key).or_insert(0.0) += order.item_count.unwrap_or(0.0);
    }

    let mut totals: Vec<_> = totals
        .into_iter()
        .map(|((payment_type, category), total_items)| PaymentCategoryTotal {
            payment_type: payment_type.to_owned(),
            category: category.to_owned(),
            total_items,
        })
        .collect();

    totals.sort_by(|a, b| {
        a.payment_type
            .cmp(&b.payment_type)
            .then_with(|| b.total_items.total_cmp(&a.total_items))
            .then_with(|| a.category.cmp(&b.category))
    });

    totals
}

/// Counts records per calendar month of their purchase date.
///
/// # Returns
/// One entry for every month from the first to the last purchase, in
/// chronological order. Months without any records have a count of zero.
pub(super) fn monthly_order_counts(orders: &[OrderRecord]) -> Vec<MonthlyCount> {
    let mut counts: BTreeMap<Date, usize> = BTreeMap::new();

    for order in orders {
        *counts
            .entry(month_start(order.purchased_at.date()))
            .or_insert(0) += 1;
    }

    let (Some(&first), Some(&last)) = (counts.keys().next(), counts.keys().next_back()) else {
        return Vec::new();
    };

    let mut monthly_counts = Vec::new();
    let mut month = first;

    while month <= last {
        monthly_counts.push(MonthlyCount {
            month,
            count: counts.get(&month).copied().unwrap_or(0),
        });

        match next_month(month) {
            Some(next) => month = next,
            None => break,
        }
    }

    monthly_counts
}

/// Counts records per customer state for the `top_n` categories with the most records.
///
/// The top categories are chosen across all of `orders`, not per state, and
/// records in any other category are left out entirely.
///
/// # Returns
/// Counts sorted by state, then by the category's overall rank.
pub(super) fn top_categories_by_state(
    orders: &[OrderRecord],
    top_n: usize,
) -> Vec<StateCategoryCount> {
    let top = top_categories(orders, top_n);
    let rank: HashMap<&str, usize> = top
        .iter()
        .enumerate()
        .map(|(rank, category)| (category.category.as_str(), rank))
        .collect();

    let mut counts: HashMap<(&str, &str), usize> = HashMap::new();

    for order in orders {
        let category = order.category_label();

        if rank.contains_key(category) {
            *counts
                .entry((order.customer_state_label(), category))
                .or_insert(0) += 1;
        }
    }

    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|((state_a, category_a), _), ((state_b, category_b), _)| {
        state_a
            .cmp(state_b)
            .then_with(|| rank[category_a].cmp(&rank[category_b]))
    });

    counts
        .into_iter()
        .map(|((state, category), count)| StateCategoryCount {
            state: state.to_owned(),
            category: category.to_owned(),
            count,
        })
        .collect()
}

/// Pivots state/category counts into one series per category for a grouped bar chart.
///
/// # Returns
/// Tuple of (states in alphabetical order, category series). Categories are
/// ordered by their total count, largest first, and each series has one
/// entry per state with `None` where the state has no records for the category.
pub(super) fn group_state_counts_by_category(
    counts: &[StateCategoryCount],
) -> (Vec<String>, Vec<(String, Vec<Option<f64>>)>) {
    let mut states: Vec<&str> = counts
        .iter()
        .map(|count| count.state.as_str())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    states.sort();

    let state_index: HashMap<&str, usize> = states
        .iter()
        .enumerate()
        .map(|(index, state)| (*state, index))
        .collect();

    let mut series: HashMap<&str, (usize, Vec<Option<f64>>)> = HashMap::new();

    for count in counts {
        let (total, values) = series
            .entry(count.category.as_str())
            .or_insert_with(|| (0, vec![None; states.len()]));
        *total += count.count;
        values[state_index[count.state.as_str()]] = Some(count.count as f64);
    }

    let mut series: Vec<_> = series.into_iter().collect();
    series.sort_by(|(category_a, (total_a, _)), (category_b, (total_b, _))| {
        total_b.cmp(total_a).then_with(|| category_a.cmp(category_b))
    });

    let series = series
        .into_iter()
        .map(|(category, (_, values))| (category.to_owned(), values))
        .collect();
    let states = states.into_iter().map(str::to_owned).collect();

    (states, series)
}

/// Counts the records, distinct orders, categories and states in `orders`.
pub(super) fn summary_statistics(orders: &[OrderRecord]) -> SummaryStatistics {
    let distinct = |label: fn(&OrderRecord) -> &str| {
        orders.iter().map(label).collect::<HashSet<_>>().len()
    };

    SummaryStatistics {
        items: orders.len(),
        orders: distinct(|order| order.order_id.as_str()),
        categories: distinct(OrderRecord::category_label),
        states: distinct(OrderRecord::customer_state_label),
    }
}

/// Formats the month of `date` as "YYYY-MM".
pub(super) fn format_month_label(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

fn serialize_month<S: Serializer>(month: &Date, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_month_label(*month))
}

/// The first day of the month containing `date`.
fn month_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// The first day of the month after `month`, or `None` past the largest representable date.
fn next_month(month: Date) -> Option<Date> {
    let (year, next) = match month.month() {
        Month::December => (month.year() + 1, Month::January),
        month_of_year => (month.year(), month_of_year.next()),
    };

    Date::from_calendar_date(year, next, 1).ok()
}

/// Counts records by `key`, sorted by count descending and then by key.
fn count_by<'a>(orders: &'a [OrderRecord], key: fn(&OrderRecord) -> &str) -> Vec<(&'a str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for order in orders {
        *counts.entry(key(order)).or_insert(0) += 1;
    }

    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|(key_a, count_a), (key_b, count_b)| {
        count_b.cmp(count_a).then_with(|| key_a.cmp(key_b))
    });

    counts
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use time::{
        PrimitiveDateTime,
        macros::{date, datetime},
    };

    use crate::{
        OrderRecord, OrderTable, UNKNOWN_LABEL,
        dashboard::aggregation::{
            CategoryCount, MonthlyCount, PaymentTypeCount, StateCategoryCount, category_sales,
            format_month_label, group_state_counts_by_category, monthly_order_counts,
            payment_type_counts, payment_type_totals, summary_statistics, top_categories,
            top_categories_by_state,
        },
        date_range::DateRange,
    };

    fn order(category: &str, purchased_at: PrimitiveDateTime) -> OrderRecord {
        OrderRecord::build("order", purchased_at).category(category)
    }

    fn order_in_state(category: &str, state: &str) -> OrderRecord {
        order(category, datetime!(2018-01-01 12:00)).customer_state(state)
    }

    fn category_count(category: &str, count: usize) -> CategoryCount {
        CategoryCount {
            category: category.to_owned(),
            count,
        }
    }

    fn state_count(state: &str, category: &str, count: usize) -> StateCategoryCount {
        StateCategoryCount {
            state: state.to_owned(),
            category: category.to_owned(),
            count,
        }
    }

    fn mixed_orders() -> Vec<OrderRecord> {
        vec![
            order_in_state("toys", "SP"),
            order_in_state("toys", "RJ"),
            order_in_state("toys", "SP"),
            order_in_state("books", "SP"),
            order_in_state("books", "MG"),
            order_in_state("garden", "RJ"),
            order_in_state("garden", "RJ"),
            order_in_state("auto", "SP"),
            order_in_state("pets", "MG"),
        ]
    }

    #[test]
    fn category_sales_sorts_by_count_then_name() {
        let orders = mixed_orders();

        let result = category_sales(&orders);

        assert_eq!(
            result,
            vec![
                category_count("toys", 3),
                category_count("books", 2),
                category_count("garden", 2),
                category_count("auto", 1),
                category_count("pets", 1),
            ]
        );
    }

    #[test]
    fn category_sales_buckets_missing_categories() {
        let orders = vec![
            OrderRecord::build("a", datetime!(2018-01-01 12:00)),
            OrderRecord::build("b", datetime!(2018-01-02 12:00)),
            order("toys", datetime!(2018-01-03 12:00)),
        ];

        let result = category_sales(&orders);

        assert_eq!(
            result,
            vec![category_count(UNKNOWN_LABEL, 2), category_count("toys", 1)]
        );
    }

    #[test]
    fn unknown_category_is_ranked_like_any_other() {
        let orders = vec![
            OrderRecord::build("a", datetime!(2018-01-01 12:00)).customer_state("SP"),
            OrderRecord::build("b", datetime!(2018-01-02 12:00)).customer_state("SP"),
            order_in_state("toys", "RJ"),
        ];

        assert_eq!(
            top_categories(&orders, 1),
            vec![category_count(UNKNOWN_LABEL, 2)]
        );
        assert_eq!(
            top_categories_by_state(&orders, 1),
            vec![state_count("SP", UNKNOWN_LABEL, 2)]
        );
    }

    #[test]
    fn category_sales_sum_to_row_count() {
        let mut orders = mixed_orders();
        orders.push(OrderRecord::build("x", datetime!(2018-01-01 12:00)));

        let total: usize = category_sales(&orders).iter().map(|sale| sale.count).sum();

        assert_eq!(total, orders.len());
    }

    #[test]
    fn aggregation_ignores_input_order() {
        let orders = mixed_orders();
        let mut reversed = orders.clone();
        reversed.reverse();
        let mut rotated = orders.clone();
        rotated.rotate_left(4);

        for permutation in [&reversed, &rotated] {
            assert_eq!(category_sales(&orders), category_sales(permutation));
            assert_eq!(top_categories(&orders, 3), top_categories(permutation, 3));
            assert_eq!(
                payment_type_totals(&orders),
                payment_type_totals(permutation)
            );
            assert_eq!(
                monthly_order_counts(&orders),
                monthly_order_counts(permutation)
            );
            assert_eq!(
                top_categories_by_state(&orders, 3),
                top_categories_by_state(permutation, 3)
            );
        }
    }

    #[test]
    fn top_categories_takes_largest() {
        let orders = mixed_orders();

        let result = top_categories(&orders, 2);

        assert_eq!(
            result,
            vec![category_count("toys", 3), category_count("books", 2)]
        );
    }

    #[test]
    fn top_categories_with_fewer_categories_than_n() {
        let orders = mixed_orders();

        assert_eq!(top_categories(&orders, 10).len(), 5);
    }

    #[test]
    fn payment_type_counts_sorts_by_count() {
        let at = datetime!(2018-01-01 12:00);
        let orders = vec![
            OrderRecord::build("a", at).payment_type("boleto"),
            OrderRecord::build("b", at).payment_type("credit_card"),
            OrderRecord::build("c", at).payment_type("credit_card"),
            OrderRecord::build("d", at).payment_type("voucher"),
        ];

        let result = payment_type_counts(&orders);

        assert_eq!(
            result,
            vec![
                PaymentTypeCount {
                    payment_type: "credit_card".to_owned(),
                    count: 2
                },
                PaymentTypeCount {
                    payment_type: "boleto".to_owned(),
                    count: 1
                },
                PaymentTypeCount {
                    payment_type: "voucher".to_owned(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn payment_type_totals_sums_item_counts() {
        let at = datetime!(2018-01-01 12:00);
        let orders = vec![
            OrderRecord::build("a", at)
                .payment_type("credit_card")
                .category("toys")
                .item_count(1.0),
            OrderRecord::build("a", at)
                .payment_type("credit_card")
                .category("toys")
                .item_count(2.0),
            OrderRecord::build("b", at)
                .payment_type("credit_card")
                .category("books")
                .item_count(4.0),
            OrderRecord::build("c", at)
                .payment_type("boleto")
                .category("toys")
                .item_count(1.0),
            // Missing item counts add nothing.
            OrderRecord::build("d", at)
                .payment_type("boleto")
                .category("toys"),
        ];

        let result = payment_type_totals(&orders);

        let rows: Vec<_> = result
            .iter()
            .map(|total| {
                (
                    total.payment_type.as_str(),
                    total.category.as_str(),
                    total.total_items,
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                ("boleto", "toys", 1.0),
                ("credit_card", "books", 4.0),
                ("credit_card", "toys", 3.0),
            ]
        );
    }

    #[test]
    fn monthly_order_counts_are_chronological() {
        let orders = vec![
            order("toys", datetime!(2018-03-15 10:00)),
            order("toys", datetime!(2017-12-31 23:59)),
            order("toys", datetime!(2018-01-01 00:00)),
            order("toys", datetime!(2018-03-01 08:00)),
            order("toys", datetime!(2018-01-31 23:59)),
        ];

        let result = monthly_order_counts(&orders);

        assert_eq!(
            result,
            vec![
                MonthlyCount {
                    month: date!(2017-12-01),
                    count: 1
                },
                MonthlyCount {
                    month: date!(2018-01-01),
                    count: 2
                },
                MonthlyCount {
                    month: date!(2018-02-01),
                    count: 0
                },
                MonthlyCount {
                    month: date!(2018-03-01),
                    count: 2
                },
            ]
        );
        assert!(
            result.windows(2).all(|pair| pair[0].month < pair[1].month),
            "months should be strictly ascending"
        );
    }

    #[test]
    fn monthly_order_counts_fill_months_without_orders() {
        let orders = vec![
            order("toys", datetime!(2016-10-04 09:30)),
            order("books", datetime!(2016-12-23 14:00)),
            order("toys", datetime!(2017-01-02 11:15)),
        ];

        let result: Vec<_> = monthly_order_counts(&orders)
            .into_iter()
            .map(|monthly| (format_month_label(monthly.month), monthly.count))
            .collect();

        assert_eq!(
            result,
            vec![
                ("2016-10".to_owned(), 1),
                ("2016-11".to_owned(), 0),
                ("2016-12".to_owned(), 1),
                ("2017-01".to_owned(), 1),
            ]
        );
    }

    #[test]
    fn top_categories_by_state_only_counts_global_top_categories() {
        let orders = mixed_orders();

        let result = top_categories_by_state(&orders, 2);

        assert_eq!(
            result,
            vec![
                state_count("MG", "books", 1),
                state_count("RJ", "toys", 1),
                state_count("SP", "toys", 2),
                state_count("SP", "books", 1),
            ]
        );
    }

    #[test]
    fn top_categories_by_state_is_not_per_state_top_n() {
        // Garden is the most popular category in RJ but not in the top one overall.
        let orders = mixed_orders();

        let result = top_categories_by_state(&orders, 1);

        assert!(result.iter().all(|count| count.category == "toys"));
        assert_eq!(
            result,
            vec![state_count("RJ", "toys", 1), state_count("SP", "toys", 2)]
        );
    }

    #[test]
    fn top_categories_by_state_is_subset_of_category_sales() {
        let orders = mixed_orders();
        let top_n = 3;

        let by_state: HashSet<_> = top_categories_by_state(&orders, top_n)
            .into_iter()
            .map(|count| count.category)
            .collect();
        let sales: HashSet<_> = category_sales(&orders)
            .into_iter()
            .map(|sale| sale.category)
            .collect();

        assert!(by_state.len() <= top_n);
        assert!(by_state.is_subset(&sales));
    }

    #[test]
    fn top_categories_by_state_buckets_missing_states() {
        let orders = vec![order("toys", datetime!(2018-01-01 12:00))];

        let result = top_categories_by_state(&orders, 5);

        assert_eq!(result, vec![state_count(UNKNOWN_LABEL, "toys", 1)]);
    }

    #[test]
    fn aggregators_handle_empty_input() {
        let orders: Vec<OrderRecord> = vec![];

        assert!(category_sales(&orders).is_empty());
        assert!(payment_type_totals(&orders).is_empty());
        assert!(top_categories(&orders, 10).is_empty());
        assert!(monthly_order_counts(&orders).is_empty());
        assert!(top_categories_by_state(&orders, 5).is_empty());
        assert!(payment_type_counts(&orders).is_empty());
        assert_eq!(summary_statistics(&orders).items, 0);
    }

    #[test]
    fn filter_then_category_sales() {
        let table = OrderTable::new(vec![
            order("toys", datetime!(2018-01-05 00:00)),
            order("toys", datetime!(2018-02-10 00:00)),
            order("books", datetime!(2018-01-20 00:00)),
        ]);

        let filtered = table.filter(DateRange::new(date!(2018-01-01), date!(2018-01-31)));

        assert_eq!(filtered.len(), 2);
        assert_eq!(
            category_sales(filtered.records()),
            vec![category_count("books", 1), category_count("toys", 1)]
        );
    }

    #[test]
    fn filter_excluding_everything_gives_empty_aggregates() {
        let table = OrderTable::new(mixed_orders());

        let filtered = table
            .filter(DateRange::new(date!(2020-01-01), date!(2020-12-31)))
            .records();

        assert!(category_sales(filtered).is_empty());
        assert!(payment_type_totals(filtered).is_empty());
        assert!(top_categories(filtered, 10).is_empty());
        assert!(monthly_order_counts(filtered).is_empty());
        assert!(top_categories_by_state(filtered, 5).is_empty());
    }

    #[test]
    fn group_state_counts_by_category_pivots_counts() {
        let counts = vec![
            state_count("SP", "toys", 2),
            state_count("SP", "books", 1),
            state_count("MG", "books", 1),
            state_count("RJ", "toys", 1),
        ];

        let (states, series) = group_state_counts_by_category(&counts);

        assert_eq!(states, vec!["MG", "RJ", "SP"]);
        assert_eq!(
            series,
            vec![
                ("toys".to_owned(), vec![None, Some(1.0), Some(2.0)]),
                ("books".to_owned(), vec![Some(1.0), None, Some(1.0)]),
            ]
        );
    }

    #[test]
    fn group_state_counts_by_category_handles_empty_input() {
        let (states, series) = group_state_counts_by_category(&[]);

        assert!(states.is_empty());
        assert!(series.is_empty());
    }

    #[test]
    fn summary_statistics_counts_distinct_values() {
        let at = datetime!(2018-01-01 12:00);
        let orders = vec![
            OrderRecord::build("a", at)
                .category("toys")
                .customer_state("SP"),
            OrderRecord::build("a", at)
                .category("books")
                .customer_state("SP"),
            OrderRecord::build("b", at).customer_state("RJ"),
        ];

        let result = summary_statistics(&orders);

        assert_eq!(result.items, 3);
        assert_eq!(result.orders, 2);
        assert_eq!(result.categories, 3);
        assert_eq!(result.states, 2);
    }

    #[test]
    fn format_month_label_uses_year_and_month() {
        assert_eq!(format_month_label(date!(2018-01-01)), "2018-01");
        assert_eq!(format_month_label(date!(2017-12-01)), "2017-12");
    }
}
