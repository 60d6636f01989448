//! Expense screen operations.
//!
//! CRUD over backend expense records plus the client-side date-range
//! filter the reports screen shares.

use chrono::NaiveDate;
use tracing::info;

use crate::api::ApiClient;
use crate::models::{expenses_from_value, Expense};

pub async fn get_expenses(api: &ApiClient) -> Result<Vec<Expense>, String> {
    let data = api
        .post_action("rms_get_expenses", &[])
        .await
        .map_err(|e| e.to_string())?;
    Ok(expenses_from_value(&data))
}

pub async fn add_expense(
    api: &ApiClient,
    category: &str,
    description: &str,
    amount: f64,
    spent_at: &str,
) -> Result<Vec<Expense>, String> {
    if amount <= 0.0 {
        return Err("Expense amount must be positive".into());
    }
    if parse_date(spent_at).is_none() {
        return Err(format!("Invalid expense date: {spent_at}"));
    }
    api.post_action(
        "rms_add_expense",
        &[
            ("category", category.trim().to_string()),
            ("description", description.trim().to_string()),
            ("amount", format!("{amount:.2}")),
            ("spent_at", spent_at.trim().to_string()),
        ],
    )
    .await
    .map_err(|e| e.to_string())?;
    info!(category = %category.trim(), amount, "expense recorded");
    get_expenses(api).await
}

pub async fn delete_expense(api: &ApiClient, expense_id: &str) -> Result<Vec<Expense>, String> {
    api.post_action("rms_delete_expense", &[("expense_id", expense_id.to_string())])
        .await
        .map_err(|e| e.to_string())?;
    info!(expense_id, "expense deleted");
    get_expenses(api).await
}

/// Parse the `YYYY-MM-DD` prefix of a backend date string.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Expenses whose date falls within `[from, to]` inclusive. Records with
/// unparseable dates are excluded.
pub fn filter_by_range(expenses: &[Expense], from: NaiveDate, to: NaiveDate) -> Vec<&Expense> {
    expenses
        .iter()
        .filter(|e| match parse_date(&e.spent_at) {
            Some(d) => d >= from && d <= to,
            None => false,
        })
        .collect()
}
