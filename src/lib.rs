//! RMS Admin - headless admin console client
//!
//! Talks to the restaurant backend through one shared endpoint: form-encoded
//! `POST` requests carrying an `action` selector and a per-session `nonce`,
//! answered with `{ success, data }` JSON envelopes. Each admin screen
//! (orders, menu, stock, expenses, reports, settings, translations) is a thin
//! operation set over that contract; the live order/call board in `board` is
//! the one component with real internal state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// App start time for uptime calculation (epoch seconds).
pub(crate) static APP_START_EPOCH: AtomicU64 = AtomicU64::new(0);

pub mod api;
pub mod board;
pub mod diagnostics;
pub mod expenses;
pub mod i18n;
pub mod menu;
pub mod models;
pub mod reports;
pub mod session;
pub mod settings;
pub mod stock;

// ---------------------------------------------------------------------------
// Tolerant JSON field readers
//
// Backend payloads are not strictly typed: numbers arrive as strings, ids as
// numbers, optional fields go missing. Screens read fields through these
// helpers instead of panicking on shape mismatches.
// ---------------------------------------------------------------------------

pub(crate) fn value_str(v: &serde_json::Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = v.get(*key).and_then(|x| x.as_str()) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

pub(crate) fn value_f64(v: &serde_json::Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        match v.get(*key) {
            Some(x) if x.is_f64() || x.is_i64() || x.is_u64() => return x.as_f64(),
            Some(serde_json::Value::String(s)) => {
                if let Ok(n) = s.trim().parse::<f64>() {
                    return Some(n);
                }
            }
            _ => {}
        }
    }
    None
}

pub(crate) fn value_i64(v: &serde_json::Value, keys: &[&str]) -> Option<i64> {
    for key in keys {
        match v.get(*key) {
            Some(x) if x.is_i64() || x.is_u64() => return x.as_i64(),
            Some(serde_json::Value::String(s)) => {
                if let Ok(n) = s.trim().parse::<i64>() {
                    return Some(n);
                }
            }
            _ => {}
        }
    }
    None
}

/// Read an identifier that may arrive as a string or a bare number.
pub(crate) fn value_id(v: &serde_json::Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match v.get(*key) {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
                return Some(s.trim().to_string());
            }
            Some(x) if x.is_i64() || x.is_u64() => return x.as_i64().map(|n| n.to_string()),
            _ => {}
        }
    }
    None
}

// ============================================================================
// App entry point
// ============================================================================

pub async fn run() -> anyhow::Result<()> {
    // Record start time for uptime tracking
    let epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    APP_START_EPOCH.store(epoch, Ordering::Relaxed);

    // Initialize structured logging (console + rolling file)
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rms_admin_lib=debug"));

    // Prune old log files before setting up the appender
    diagnostics::prune_old_logs();

    // Rolling file appender: creates daily log files in the logs directory
    let log_dir = diagnostics::get_log_dir();
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&log_dir, "rms");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // Keep the guard alive for the lifetime of the app — dropping it flushes logs.
    // We leak it intentionally since the app runs until process exit.
    std::mem::forget(_guard);

    info!("Starting RMS Admin v{}", env!("CARGO_PKG_VERSION"));

    let session = session::Session::from_env().map_err(anyhow::Error::msg)?;
    let client = api::ApiClient::from_session(&session)?;

    let board = Arc::new(board::OrderBoard::new(
        client,
        Arc::new(board::ChimeNotifier),
    ));
    let handle = board::start_board_loop(board.clone(), board::POLL_INTERVAL_SECS);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, stopping poll loop");
    handle.stop();

    let snapshot = board.snapshot();
    info!(
        orders = snapshot.orders.len(),
        pending_orders = snapshot.pending_orders,
        pending_calls = snapshot.pending_calls,
        "Final board state at shutdown"
    );
    Ok(())
}
