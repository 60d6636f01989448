//! Stock screen operations.
//!
//! Fetch-and-render list over backend stock records plus a client-side
//! low-stock filter for the warning banner.

use tracing::info;

use crate::api::ApiClient;
use crate::models::{stock_from_value, StockItem};

pub async fn get_stock(api: &ApiClient) -> Result<Vec<StockItem>, String> {
    let data = api
        .post_action("rms_get_stock", &[])
        .await
        .map_err(|e| e.to_string())?;
    Ok(stock_from_value(&data))
}

/// Create or update a stock record (`stock_id == None` creates), then
/// re-fetch the list.
pub async fn save_stock_item(
    api: &ApiClient,
    stock_id: Option<&str>,
    name: &str,
    quantity: f64,
    unit: &str,
    low_stock_threshold: f64,
) -> Result<Vec<StockItem>, String> {
    if name.trim().is_empty() {
        return Err("Stock item name cannot be empty".into());
    }
    if quantity < 0.0 {
        return Err("Stock quantity cannot be negative".into());
    }
    let mut fields = vec![
        ("name", name.trim().to_string()),
        ("quantity", quantity.to_string()),
        ("unit", unit.trim().to_string()),
        ("low_stock_threshold", low_stock_threshold.to_string()),
    ];
    if let Some(id) = stock_id {
        fields.push(("stock_id", id.to_string()));
    }
    api.post_action("rms_save_stock_item", &fields)
        .await
        .map_err(|e| e.to_string())?;
    info!(name = %name.trim(), quantity, "stock item saved");
    get_stock(api).await
}

pub async fn delete_stock_item(api: &ApiClient, stock_id: &str) -> Result<Vec<StockItem>, String> {
    api.post_action("rms_delete_stock_item", &[("stock_id", stock_id.to_string())])
        .await
        .map_err(|e| e.to_string())?;
    info!(stock_id, "stock item deleted");
    get_stock(api).await
}

/// Items at or below their low-stock threshold. Items with no configured
/// threshold (0) never warn.
pub fn low_stock(items: &[StockItem]) -> Vec<&StockItem> {
    items
        .iter()
        .filter(|i| i.low_stock_threshold > 0.0 && i.quantity <= i.low_stock_threshold)
        .collect()
}
