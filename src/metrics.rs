//! Restaurant metrics: in-process aggregation over a restaurant's orders.

use chrono::Timelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::types::order::{Order, OrderStatus};

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub value: u64,
}

/// Per-UTC-day revenue, order count, and distinct customers.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    pub date: String,
    pub revenue: Decimal,
    pub orders: u64,
    pub customer_count: u64,
}

/// Orders per UTC hour of day, for peak-hour analysis.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct HourlyBucket {
    pub hour: u32,
    pub orders: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantMetrics {
    pub total_revenue: Decimal,
    pub total_orders: u64,
    pub avg_order_value: Decimal,
    pub customer_count: u64,
    pub pending_orders_count: u64,
    pub category_breakdown: Vec<CategoryCount>,
    pub daily_breakdown: Vec<DailyBucket>,
    pub hourly_breakdown: Vec<HourlyBucket>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_orders: u64,
}

/// Revenue, counts, and per-item quantities over one restaurant's orders.
pub fn aggregate(orders: &[Order]) -> RestaurantMetrics {
    let total_orders = orders.len() as u64;
    let total_revenue: Decimal = orders.iter().map(|o| o.total_amount).sum();
    let avg_order_value = if total_orders == 0 {
        Decimal::ZERO
    } else {
        total_revenue / Decimal::from(total_orders)
    };
    let customer_count = orders.iter().map(|o| o.user_id).collect::<HashSet<_>>().len() as u64;
    let pending_orders_count = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .count() as u64;

    let mut quantities: HashMap<&str, u64> = HashMap::new();
    for order in orders {
        for item in &order.items {
            *quantities.entry(item.name.as_str()).or_default() += u64::from(item.quantity);
        }
    }
    let mut category_breakdown: Vec<CategoryCount> = quantities
        .into_iter()
        .map(|(name, value)| CategoryCount { name: name.to_string(), value })
        .collect();
    // Largest first; name as tiebreaker keeps the output stable.
    category_breakdown.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));

    // BTreeMaps keep both breakdowns sorted by key (date / hour ascending).
    let mut days: BTreeMap<String, (Decimal, u64, HashSet<uuid::Uuid>)> = BTreeMap::new();
    let mut hours: BTreeMap<u32, u64> = BTreeMap::new();
    for order in orders {
        let day = days
            .entry(order.created_at.format("%Y-%m-%d").to_string())
            .or_default();
        day.0 += order.total_amount;
        day.1 += 1;
        day.2.insert(order.user_id);
        *hours.entry(order.created_at.hour()).or_default() += 1;
    }
    let daily_breakdown = days
        .into_iter()
        .map(|(date, (revenue, orders, customers))| DailyBucket {
            date,
            revenue,
            orders,
            customer_count: customers.len() as u64,
        })
        .collect();
    let hourly_breakdown = hours
        .into_iter()
        .map(|(hour, orders)| HourlyBucket { hour, orders })
        .collect();

    RestaurantMetrics {
        total_revenue,
        total_orders,
        avg_order_value,
        customer_count,
        pending_orders_count,
        category_breakdown,
        daily_breakdown,
        hourly_breakdown,
    }
}
