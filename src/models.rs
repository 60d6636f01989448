//! Wire data model for the admin screens.
//!
//! Records are parsed defensively from `serde_json::Value`: the backend is
//! the source of truth and its payload shapes drift (ids as numbers or
//! strings, missing `items` arrays, amounts as strings). A malformed record
//! degrades to defaults instead of failing the whole screen; a record
//! without an id is dropped with a warning.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::{value_f64, value_i64, value_id, value_str};

// ---------------------------------------------------------------------------
// Order status machine
// ---------------------------------------------------------------------------

/// Lifecycle of an order: `pending -> preparing -> ready -> completed`,
/// with `cancelled` reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<OrderStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "preparing" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Target statuses the UI offers from the current one. Terminal
    /// statuses offer nothing. The backend stays authoritative; this only
    /// drives which transition buttons a screen renders.
    pub fn offered_transitions(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Preparing, OrderStatus::Cancelled],
            OrderStatus::Preparing => &[OrderStatus::Ready, OrderStatus::Cancelled],
            OrderStatus::Ready => &[OrderStatus::Completed, OrderStatus::Cancelled],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }
}

/// Lifecycle of a service call: created by the diner-facing widget,
/// resolved by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Pending,
    Resolved,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Pending => "pending",
            CallStatus::Resolved => "resolved",
        }
    }

    pub fn parse(raw: &str) -> Option<CallStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(CallStatus::Pending),
            "resolved" => Some(CallStatus::Resolved),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Orders and service calls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl OrderItem {
    pub fn from_value(v: &Value) -> OrderItem {
        OrderItem {
            name: value_str(v, &["name", "item_name", "title"]).unwrap_or_else(|| "Item".into()),
            quantity: value_f64(v, &["quantity", "qty"]).unwrap_or(1.0).max(0.0),
            unit_price: value_f64(v, &["unit_price", "price"]).unwrap_or(0.0),
        }
    }

    pub fn line_total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: String,
    pub table_number: String,
    pub status: OrderStatus,
    /// Absent `items` in the payload normalizes to an empty list.
    pub items: Vec<OrderItem>,
    pub notes: String,
    pub total_amount: f64,
    pub created_at: String,
}

impl Order {
    /// Parse one order record. Returns `None` when the record has no id.
    pub fn from_value(v: &Value) -> Option<Order> {
        let id = value_id(v, &["id", "order_id"])?;
        let status_raw = value_str(v, &["status"]).unwrap_or_default();
        let status = OrderStatus::parse(&status_raw).unwrap_or_else(|| {
            if !status_raw.is_empty() {
                warn!(order_id = %id, status = %status_raw, "unknown order status, treating as pending");
            }
            OrderStatus::Pending
        });
        let items = v
            .get("items")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(OrderItem::from_value).collect())
            .unwrap_or_default();
        Some(Order {
            id,
            table_number: value_id(v, &["table_number", "table"]).unwrap_or_default(),
            status,
            items,
            notes: value_str(v, &["notes"]).unwrap_or_default(),
            total_amount: value_f64(v, &["total_amount", "total"]).unwrap_or(0.0),
            created_at: value_str(v, &["created_at"]).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceCall {
    pub id: String,
    pub table_number: String,
    pub status: CallStatus,
    pub created_at: String,
}

impl ServiceCall {
    pub fn from_value(v: &Value) -> Option<ServiceCall> {
        let id = value_id(v, &["id", "call_id"])?;
        let status_raw = value_str(v, &["status"]).unwrap_or_default();
        let status = CallStatus::parse(&status_raw).unwrap_or_else(|| {
            if !status_raw.is_empty() {
                warn!(call_id = %id, status = %status_raw, "unknown call status, treating as pending");
            }
            CallStatus::Pending
        });
        Some(ServiceCall {
            id,
            table_number: value_id(v, &["table_number", "table"]).unwrap_or_default(),
            status,
            created_at: value_str(v, &["created_at"]).unwrap_or_default(),
        })
    }
}

/// Parse a list payload into records, dropping entries without an id.
/// Non-array payloads parse as empty.
fn list_from_value<T>(data: &Value, parse: fn(&Value) -> Option<T>, what: &str) -> Vec<T> {
    match data.as_array() {
        Some(arr) => arr.iter().filter_map(parse).collect(),
        None => {
            if !data.is_null() {
                warn!(payload_type = %data.to_string().chars().take(40).collect::<String>(),
                      "expected {what} list, got non-array payload");
            }
            Vec::new()
        }
    }
}

pub fn orders_from_value(data: &Value) -> Vec<Order> {
    list_from_value(data, Order::from_value, "order")
}

pub fn calls_from_value(data: &Value) -> Vec<ServiceCall> {
    list_from_value(data, ServiceCall::from_value, "service call")
}

// ---------------------------------------------------------------------------
// Supporting screen records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub sort_order: i64,
}

impl Category {
    pub fn from_value(v: &Value) -> Option<Category> {
        Some(Category {
            id: value_id(v, &["id", "category_id"])?,
            name: value_str(v, &["name"]).unwrap_or_default(),
            sort_order: value_i64(v, &["sort_order", "order"]).unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
    pub available: bool,
}

impl MenuItem {
    pub fn from_value(v: &Value) -> Option<MenuItem> {
        let available = match v.get("available") {
            Some(Value::Bool(b)) => *b,
            Some(x) if x.is_i64() || x.is_u64() => x.as_i64() != Some(0),
            Some(Value::String(s)) => !matches!(s.trim(), "0" | "false" | "no"),
            _ => true,
        };
        Some(MenuItem {
            id: value_id(v, &["id", "item_id"])?,
            category_id: value_id(v, &["category_id"]).unwrap_or_default(),
            name: value_str(v, &["name"]).unwrap_or_default(),
            description: value_str(v, &["description"]).unwrap_or_default(),
            price: value_f64(v, &["price"]).unwrap_or(0.0),
            image_url: value_str(v, &["image_url", "image"]).unwrap_or_default(),
            available,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StockItem {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub low_stock_threshold: f64,
}

impl StockItem {
    pub fn from_value(v: &Value) -> Option<StockItem> {
        Some(StockItem {
            id: value_id(v, &["id", "stock_id"])?,
            name: value_str(v, &["name", "item_name"]).unwrap_or_default(),
            quantity: value_f64(v, &["quantity"]).unwrap_or(0.0),
            unit: value_str(v, &["unit"]).unwrap_or_default(),
            low_stock_threshold: value_f64(v, &["low_stock_threshold", "threshold"]).unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Expense {
    pub id: String,
    pub category: String,
    pub description: String,
    pub amount: f64,
    /// Date string `YYYY-MM-DD...`; only the date prefix is used for
    /// range filtering.
    pub spent_at: String,
}

impl Expense {
    pub fn from_value(v: &Value) -> Option<Expense> {
        Some(Expense {
            id: value_id(v, &["id", "expense_id"])?,
            category: value_str(v, &["category"]).unwrap_or_else(|| "other".into()),
            description: value_str(v, &["description", "note"]).unwrap_or_default(),
            amount: value_f64(v, &["amount"]).unwrap_or(0.0),
            spent_at: value_str(v, &["spent_at", "created_at", "date"]).unwrap_or_default(),
        })
    }
}

pub fn categories_from_value(data: &Value) -> Vec<Category> {
    list_from_value(data, Category::from_value, "category")
}

pub fn menu_items_from_value(data: &Value) -> Vec<MenuItem> {
    list_from_value(data, MenuItem::from_value, "menu item")
}

pub fn stock_from_value(data: &Value) -> Vec<StockItem> {
    list_from_value(data, StockItem::from_value, "stock item")
}

pub fn expenses_from_value(data: &Value) -> Vec<Expense> {
    list_from_value(data, Expense::from_value, "expense")
}
