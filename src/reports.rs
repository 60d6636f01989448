//! Reports screen: client-side aggregation over fetched orders and
//! expenses.
//!
//! The backend only serves raw lists; totals, groupings and date-range
//! filters are derived here. Revenue counts completed orders only —
//! pending work is not income yet and cancelled orders never were.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::expenses::parse_date;
use crate::models::{Expense, Order, OrderStatus};

/// Orders whose creation date falls within `[from, to]` inclusive.
/// Orders with unparseable timestamps are excluded.
pub fn orders_in_range(orders: &[Order], from: NaiveDate, to: NaiveDate) -> Vec<&Order> {
    orders
        .iter()
        .filter(|o| match parse_date(&o.created_at) {
            Some(d) => d >= from && d <= to,
            None => false,
        })
        .collect()
}

/// Per-status order count and amount sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusBucket {
    pub count: usize,
    pub total_amount: f64,
}

pub fn totals_by_status(orders: &[&Order]) -> BTreeMap<&'static str, StatusBucket> {
    let mut buckets: BTreeMap<&'static str, StatusBucket> = BTreeMap::new();
    for order in orders {
        let bucket = buckets.entry(order.status.as_str()).or_default();
        bucket.count += 1;
        bucket.total_amount += order.total_amount;
    }
    buckets
}

/// Sum of completed order amounts.
pub fn revenue_total(orders: &[&Order]) -> f64 {
    orders
        .iter()
        .filter(|o| o.status == OrderStatus::Completed)
        .map(|o| o.total_amount)
        .sum()
}

/// Completed revenue per day (`YYYY-MM-DD`), ordered by date.
pub fn daily_revenue(orders: &[&Order]) -> BTreeMap<String, f64> {
    let mut days: BTreeMap<String, f64> = BTreeMap::new();
    for order in orders {
        if order.status != OrderStatus::Completed {
            continue;
        }
        if let Some(day) = parse_date(&order.created_at) {
            *days.entry(day.format("%Y-%m-%d").to_string()).or_insert(0.0) +=
                order.total_amount;
        }
    }
    days
}

/// Most-ordered line items by quantity across the given orders, cancelled
/// orders excluded. Ties break alphabetically for a stable listing.
pub fn top_items(orders: &[&Order], limit: usize) -> Vec<(String, f64)> {
    let mut by_name: BTreeMap<String, f64> = BTreeMap::new();
    for order in orders {
        if order.status == OrderStatus::Cancelled {
            continue;
        }
        for item in &order.items {
            *by_name.entry(item.name.clone()).or_insert(0.0) += item.quantity.max(1.0);
        }
    }
    let mut ranked: Vec<(String, f64)> = by_name.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(limit);
    ranked
}

/// Expense amount summed per category, ordered by category name.
pub fn expenses_by_category(expenses: &[&Expense]) -> BTreeMap<String, f64> {
    let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
    for expense in expenses {
        *by_category.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
    }
    by_category
}

/// Completed revenue minus expenses.
pub fn net_total(orders: &[&Order], expenses: &[&Expense]) -> f64 {
    let spent: f64 = expenses.iter().map(|e| e.amount).sum();
    revenue_total(orders) - spent
}
