//! Live order/service-call board.
//!
//! Keeps a local view of open orders and table service calls fresh via a
//! 10-second poll, and raises a single audible+visual alert the moment the
//! pending backlog grows, without re-firing while the same alert is still
//! unacknowledged.
//!
//! All state lives in one [`BoardState`] owned by the controller; every
//! observation goes through the pure reducer [`apply`], so the alert logic
//! is unit-testable without a network or a rendering environment. Poll
//! responses carry a monotonic sequence number and stale responses are
//! discarded, so overlapping ticks cannot roll the view backwards.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::models::{
    calls_from_value, orders_from_value, CallStatus, Order, OrderStatus, ServiceCall,
};

/// Silent refresh interval for the background poll loop.
pub const POLL_INTERVAL_SECS: u64 = 10;

/// The two alert kinds tracked by the board, with independent baselines
/// and acknowledgement flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Order,
    Call,
}

impl AlertKind {
    fn label(&self) -> &'static str {
        match self {
            AlertKind::Order => "order",
            AlertKind::Call => "call",
        }
    }
}

// ---------------------------------------------------------------------------
// State and reducer
// ---------------------------------------------------------------------------

/// Transient board state. Created at screen mount, discarded at unmount;
/// the backend owns the entities, this holds read copies plus the two
/// derived pending-count baselines.
#[derive(Debug, Default)]
pub struct BoardState {
    pub orders: Vec<Order>,
    pub calls: Vec<ServiceCall>,
    /// Last successfully recorded pending counts. `None` until the first
    /// fetch lands, so the first observation can never fire an alert.
    pub prev_pending_orders: Option<usize>,
    pub prev_pending_calls: Option<usize>,
    /// At most one unacknowledged alert per kind.
    pub order_alert: bool,
    pub call_alert: bool,
    /// Loading indicator for non-silent (user-initiated) refreshes.
    pub loading: bool,
    // Highest sequence number applied per kind; responses at or below it
    // arrived out of order and are dropped.
    last_order_seq: u64,
    last_call_seq: u64,
}

pub enum BoardEvent {
    OrdersFetched {
        seq: u64,
        silent: bool,
        orders: Vec<Order>,
    },
    CallsFetched {
        seq: u64,
        silent: bool,
        calls: Vec<ServiceCall>,
    },
    /// A poll attempt failed; the tick is a no-op so a transient failure
    /// can never report a drop in backlog.
    FetchFailed { kind: AlertKind },
    AlertDismissed(AlertKind),
}

fn pending_orders(orders: &[Order]) -> usize {
    orders
        .iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .count()
}

fn pending_calls(calls: &[ServiceCall]) -> usize {
    calls
        .iter()
        .filter(|c| c.status == CallStatus::Pending)
        .count()
}

/// Apply one event to the board state. Returns the alert to fire, if any.
///
/// An alert fires iff the fetch was silent, a baseline exists, no alert of
/// that kind is already active, and the pending count strictly increased.
/// The baseline is updated unconditionally on every applied fetch.
pub fn apply(state: &mut BoardState, event: BoardEvent) -> Option<AlertKind> {
    match event {
        BoardEvent::OrdersFetched {
            seq,
            silent,
            orders,
        } => {
            if seq <= state.last_order_seq {
                debug!(seq, last = state.last_order_seq, "stale order response discarded");
                return None;
            }
            state.last_order_seq = seq;

            let pending = pending_orders(&orders);
            let fire = silent
                && !state.order_alert
                && matches!(state.prev_pending_orders, Some(prev) if pending > prev);
            state.prev_pending_orders = Some(pending);
            state.orders = orders;
            if fire {
                state.order_alert = true;
                Some(AlertKind::Order)
            } else {
                None
            }
        }
        BoardEvent::CallsFetched { seq, silent, calls } => {
            if seq <= state.last_call_seq {
                debug!(seq, last = state.last_call_seq, "stale call response discarded");
                return None;
            }
            state.last_call_seq = seq;

            let pending = pending_calls(&calls);
            let fire = silent
                && !state.call_alert
                && matches!(state.prev_pending_calls, Some(prev) if pending > prev);
            state.prev_pending_calls = Some(pending);
            state.calls = calls;
            if fire {
                state.call_alert = true;
                Some(AlertKind::Call)
            } else {
                None
            }
        }
        BoardEvent::FetchFailed { kind } => {
            debug!(kind = kind.label(), "failed poll applied as no-op");
            None
        }
        BoardEvent::AlertDismissed(kind) => {
            match kind {
                AlertKind::Order => state.order_alert = false,
                AlertKind::Call => state.call_alert = false,
            }
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Best-effort alert side effect (the audible chime). Playback failures
/// are swallowed, never surfaced, so the trait is infallible.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: AlertKind);
}

/// Production notifier. Actual audio playback belongs to the host
/// environment; the console records the chime in the log stream.
pub struct ChimeNotifier;

impl Notifier for ChimeNotifier {
    fn notify(&self, kind: AlertKind) {
        info!(kind = kind.label(), "new {} alert", kind.label());
    }
}

/// Interactive confirmation for destructive actions. A declined
/// confirmation must issue zero network requests.
pub trait Confirmer {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirmer for non-interactive callers that have already confirmed.
pub struct AlwaysConfirm;

impl Confirmer for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Backend operations the board consumes. Implemented by [`ApiClient`] in
/// production and by scripted mocks in tests.
#[async_trait]
pub trait BoardGateway: Send + Sync {
    async fn fetch_orders(&self) -> Result<Vec<Order>, String>;
    async fn fetch_calls(&self) -> Result<Vec<ServiceCall>, String>;
    async fn resolve_call(&self, call_id: &str) -> Result<(), String>;
    async fn update_order_status(&self, order_id: &str, status: OrderStatus)
        -> Result<(), String>;
    async fn delete_order(&self, order_id: &str) -> Result<(), String>;
}

#[async_trait]
impl BoardGateway for ApiClient {
    async fn fetch_orders(&self) -> Result<Vec<Order>, String> {
        let data = self
            .post_action("rms_get_orders", &[])
            .await
            .map_err(|e| e.to_string())?;
        Ok(orders_from_value(&data))
    }

    async fn fetch_calls(&self) -> Result<Vec<ServiceCall>, String> {
        let data = self
            .post_action("rms_get_calls", &[])
            .await
            .map_err(|e| e.to_string())?;
        Ok(calls_from_value(&data))
    }

    async fn resolve_call(&self, call_id: &str) -> Result<(), String> {
        self.post_action("rms_resolve_call", &[("call_id", call_id.to_string())])
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<(), String> {
        self.post_action(
            "rms_update_order_status",
            &[
                ("order_id", order_id.to_string()),
                ("status", status.as_str().to_string()),
            ],
        )
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
    }

    async fn delete_order(&self, order_id: &str) -> Result<(), String> {
        self.post_action("rms_delete_order", &[("order_id", order_id.to_string())])
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Rendering-friendly copy of the current board state.
#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
    pub orders: Vec<Order>,
    pub calls: Vec<ServiceCall>,
    pub pending_orders: usize,
    pub pending_calls: usize,
    pub order_alert: bool,
    pub call_alert: bool,
    pub loading: bool,
}

pub struct OrderBoard<G: BoardGateway> {
    gateway: G,
    notifier: Arc<dyn Notifier>,
    state: Mutex<BoardState>,
    seq: AtomicU64,
}

impl<G: BoardGateway> OrderBoard<G> {
    pub fn new(gateway: G, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            state: Mutex::new(BoardState::default()),
            seq: AtomicU64::new(0),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn set_loading(&self, loading: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.loading = loading;
        }
    }

    /// Re-fetch the full order list. Silent refreshes may fire an alert
    /// and never touch the loading indicator; non-silent ones toggle it
    /// around the fetch.
    pub async fn refresh_orders(&self, silent: bool) -> Result<Vec<Order>, String> {
        if !silent {
            self.set_loading(true);
        }
        let seq = self.next_seq();
        let fetched = self.gateway.fetch_orders().await;
        if !silent {
            self.set_loading(false);
        }

        match fetched {
            Ok(orders) => {
                let fired = {
                    let mut state = self.state.lock().map_err(|e| e.to_string())?;
                    apply(
                        &mut state,
                        BoardEvent::OrdersFetched {
                            seq,
                            silent,
                            orders: orders.clone(),
                        },
                    )
                };
                if let Some(kind) = fired {
                    self.notifier.notify(kind);
                }
                Ok(orders)
            }
            Err(e) => {
                if let Ok(mut state) = self.state.lock() {
                    apply(
                        &mut state,
                        BoardEvent::FetchFailed {
                            kind: AlertKind::Order,
                        },
                    );
                }
                warn!(silent, error = %e, "order refresh failed");
                Err(e)
            }
        }
    }

    /// Re-fetch the service-call list. Same shape as
    /// [`OrderBoard::refresh_orders`] with an independent baseline and
    /// alert flag.
    pub async fn refresh_calls(&self, silent: bool) -> Result<Vec<ServiceCall>, String> {
        if !silent {
            self.set_loading(true);
        }
        let seq = self.next_seq();
        let fetched = self.gateway.fetch_calls().await;
        if !silent {
            self.set_loading(false);
        }

        match fetched {
            Ok(calls) => {
                let fired = {
                    let mut state = self.state.lock().map_err(|e| e.to_string())?;
                    apply(
                        &mut state,
                        BoardEvent::CallsFetched {
                            seq,
                            silent,
                            calls: calls.clone(),
                        },
                    )
                };
                if let Some(kind) = fired {
                    self.notifier.notify(kind);
                }
                Ok(calls)
            }
            Err(e) => {
                if let Ok(mut state) = self.state.lock() {
                    apply(
                        &mut state,
                        BoardEvent::FetchFailed {
                            kind: AlertKind::Call,
                        },
                    );
                }
                warn!(silent, error = %e, "call refresh failed");
                Err(e)
            }
        }
    }

    /// Resolve a service call, then re-fetch calls non-silently.
    pub async fn resolve_call(&self, call_id: &str) -> Result<Vec<ServiceCall>, String> {
        self.gateway.resolve_call(call_id).await?;
        info!(call_id, "service call resolved");
        self.refresh_calls(false).await
    }

    /// Request a status transition, then re-fetch orders non-silently.
    /// The backend stays authoritative over legality; the UI only offers
    /// transitions from [`OrderStatus::offered_transitions`].
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Vec<Order>, String> {
        self.gateway.update_order_status(order_id, status).await?;
        info!(order_id, status = status.as_str(), "order status updated");
        self.refresh_orders(false).await
    }

    /// Delete an order after interactive confirmation. Returns `Ok(None)`
    /// when the confirmation is declined; no request is issued in that
    /// case.
    pub async fn delete_order(
        &self,
        order_id: &str,
        confirmer: &dyn Confirmer,
    ) -> Result<Option<Vec<Order>>, String> {
        if !confirmer.confirm(&format!("Delete order {order_id}? This cannot be undone.")) {
            debug!(order_id, "order delete cancelled by operator");
            return Ok(None);
        }
        self.gateway.delete_order(order_id).await?;
        info!(order_id, "order deleted");
        Ok(Some(self.refresh_orders(false).await?))
    }

    /// Acknowledge the order alert, allowing the next strict increase to
    /// fire again.
    pub fn dismiss_order_alert(&self) {
        if let Ok(mut state) = self.state.lock() {
            apply(&mut state, BoardEvent::AlertDismissed(AlertKind::Order));
        }
    }

    pub fn dismiss_call_alert(&self) {
        if let Ok(mut state) = self.state.lock() {
            apply(&mut state, BoardEvent::AlertDismissed(AlertKind::Call));
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let state = match self.state.lock() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        };
        BoardSnapshot {
            orders: state.orders.clone(),
            calls: state.calls.clone(),
            pending_orders: pending_orders(&state.orders),
            pending_calls: pending_calls(&state.calls),
            order_alert: state.order_alert,
            call_alert: state.call_alert,
            loading: state.loading,
        }
    }
}

// ---------------------------------------------------------------------------
// Poll loop
// ---------------------------------------------------------------------------

/// Handle for the background poll loop.
pub struct BoardHandle {
    is_running: Arc<AtomicBool>,
}

impl BoardHandle {
    /// Stop the loop at the next tick boundary. In-flight requests are not
    /// aborted; their responses land on the still-alive board and are
    /// inert.
    pub fn stop(&self) {
        self.is_running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }
}

/// Start the board poll loop: one immediate non-silent load of both lists,
/// then a repeating silent tick every `interval_secs`.
pub fn start_board_loop<G: BoardGateway + 'static>(
    board: Arc<OrderBoard<G>>,
    interval_secs: u64,
) -> BoardHandle {
    let is_running = Arc::new(AtomicBool::new(true));
    let running = is_running.clone();

    tokio::spawn(async move {
        info!("Board poll loop started (interval: {interval_secs}s)");

        // Initial non-silent load establishes the pending-count baselines.
        if let Err(e) = board.refresh_orders(false).await {
            warn!("Initial order load failed: {e}");
        }
        if let Err(e) = board.refresh_calls(false).await {
            warn!("Initial call load failed: {e}");
        }

        loop {
            if !running.load(Ordering::SeqCst) {
                info!("Board poll loop stopped");
                break;
            }

            tokio::time::sleep(Duration::from_secs(interval_secs)).await;

            if !running.load(Ordering::SeqCst) {
                info!("Board poll loop stopped");
                break;
            }

            if let Err(e) = board.refresh_orders(true).await {
                warn!("Silent order poll failed: {e}");
            }
            if let Err(e) = board.refresh_calls(true).await {
                warn!("Silent call poll failed: {e}");
            }
        }
    });

    BoardHandle { is_running }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    fn order(id: &str, status: OrderStatus) -> Order {
        Order {
            id: id.to_string(),
            table_number: "1".to_string(),
            status,
            items: vec![],
            notes: String::new(),
            total_amount: 0.0,
            created_at: "2026-08-20 12:00:00".to_string(),
        }
    }

    fn pending_batch(count: usize) -> Vec<Order> {
        (0..count)
            .map(|i| order(&format!("o{i}"), OrderStatus::Pending))
            .collect()
    }

    fn call(id: &str, status: CallStatus) -> ServiceCall {
        ServiceCall {
            id: id.to_string(),
            table_number: "4".to_string(),
            status,
            created_at: "2026-08-20 12:00:00".to_string(),
        }
    }

    fn fetched(seq: u64, silent: bool, orders: Vec<Order>) -> BoardEvent {
        BoardEvent::OrdersFetched {
            seq,
            silent,
            orders,
        }
    }

    // -- Reducer --------------------------------------------------------

    #[test]
    fn test_first_observation_never_fires() {
        let mut state = BoardState::default();
        // Even a silent first poll with a large backlog has no baseline.
        assert_eq!(apply(&mut state, fetched(1, true, pending_batch(9))), None);
        assert_eq!(state.prev_pending_orders, Some(9));
        assert!(!state.order_alert);
    }

    #[test]
    fn test_non_silent_refresh_never_fires() {
        let mut state = BoardState::default();
        apply(&mut state, fetched(1, false, pending_batch(1)));
        assert_eq!(apply(&mut state, fetched(2, false, pending_batch(5))), None);
        assert!(!state.order_alert);
        // Baseline still advanced.
        assert_eq!(state.prev_pending_orders, Some(5));
    }

    #[test]
    fn test_alert_fires_once_per_increase_and_rearms_on_dismiss() {
        // Scenario from the order screen: baseline 2, flat, rise to 3,
        // flat while active, dismiss, flat, rise to 4.
        let mut state = BoardState::default();

        apply(&mut state, fetched(1, false, pending_batch(2)));
        assert_eq!(apply(&mut state, fetched(2, true, pending_batch(2))), None);
        assert_eq!(
            apply(&mut state, fetched(3, true, pending_batch(3))),
            Some(AlertKind::Order)
        );
        // Same backlog, alert still active: no re-fire.
        assert_eq!(apply(&mut state, fetched(4, true, pending_batch(3))), None);

        apply(&mut state, BoardEvent::AlertDismissed(AlertKind::Order));
        assert!(!state.order_alert);

        // No change after dismissal: still quiet.
        assert_eq!(apply(&mut state, fetched(5, true, pending_batch(3))), None);
        // Further strict increase fires again.
        assert_eq!(
            apply(&mut state, fetched(6, true, pending_batch(4))),
            Some(AlertKind::Order)
        );
    }

    #[test]
    fn test_increase_while_alert_active_does_not_double_fire() {
        let mut state = BoardState::default();
        apply(&mut state, fetched(1, false, pending_batch(1)));
        assert_eq!(
            apply(&mut state, fetched(2, true, pending_batch(2))),
            Some(AlertKind::Order)
        );
        // Another increase while unacknowledged: baseline moves, no alert.
        assert_eq!(apply(&mut state, fetched(3, true, pending_batch(3))), None);
        assert_eq!(state.prev_pending_orders, Some(3));
    }

    #[test]
    fn test_decrease_updates_baseline_without_alert() {
        let mut state = BoardState::default();
        apply(&mut state, fetched(1, false, pending_batch(4)));
        assert_eq!(apply(&mut state, fetched(2, true, pending_batch(1))), None);
        assert_eq!(state.prev_pending_orders, Some(1));
    }

    #[test]
    fn test_order_and_call_alerts_are_independent() {
        let mut state = BoardState::default();
        apply(&mut state, fetched(1, false, pending_batch(1)));
        apply(
            &mut state,
            BoardEvent::CallsFetched {
                seq: 2,
                silent: false,
                calls: vec![call("c1", CallStatus::Pending)],
            },
        );

        // Order alert active does not suppress a call alert.
        assert_eq!(
            apply(&mut state, fetched(3, true, pending_batch(2))),
            Some(AlertKind::Order)
        );
        assert_eq!(
            apply(
                &mut state,
                BoardEvent::CallsFetched {
                    seq: 4,
                    silent: true,
                    calls: vec![call("c1", CallStatus::Pending), call("c2", CallStatus::Pending)],
                }
            ),
            Some(AlertKind::Call)
        );
        assert!(state.order_alert && state.call_alert);
    }

    #[test]
    fn test_resolved_calls_do_not_count_as_pending() {
        let mut state = BoardState::default();
        apply(
            &mut state,
            BoardEvent::CallsFetched {
                seq: 1,
                silent: false,
                calls: vec![call("c1", CallStatus::Resolved)],
            },
        );
        assert_eq!(state.prev_pending_calls, Some(0));
    }

    #[test]
    fn test_failed_fetch_is_a_no_op() {
        let mut state = BoardState::default();
        apply(&mut state, fetched(1, true, pending_batch(2)));
        let orders_before = state.orders.len();

        apply(
            &mut state,
            BoardEvent::FetchFailed {
                kind: AlertKind::Order,
            },
        );
        assert_eq!(state.prev_pending_orders, Some(2));
        assert_eq!(state.orders.len(), orders_before);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut state = BoardState::default();
        apply(&mut state, fetched(1, false, pending_batch(1)));
        // seq 3 lands before seq 2.
        apply(&mut state, fetched(3, true, pending_batch(2)));
        assert_eq!(state.prev_pending_orders, Some(2));

        // The late seq-2 response (an older, larger snapshot) must not
        // roll the view backwards or fire anything.
        assert_eq!(apply(&mut state, fetched(2, true, pending_batch(5))), None);
        assert_eq!(state.prev_pending_orders, Some(2));
        assert_eq!(state.orders.len(), 2);
    }

    // -- Controller -----------------------------------------------------

    #[derive(Default)]
    struct MockGateway {
        order_batches: Mutex<VecDeque<Result<Vec<Order>, String>>>,
        call_batches: Mutex<VecDeque<Result<Vec<ServiceCall>, String>>>,
        order_fetches: AtomicUsize,
        call_fetches: AtomicUsize,
        status_updates: AtomicUsize,
        deletes: AtomicUsize,
        resolves: AtomicUsize,
    }

    impl MockGateway {
        fn push_orders(&self, batch: Result<Vec<Order>, String>) {
            self.order_batches.lock().unwrap().push_back(batch);
        }

        fn push_calls(&self, batch: Result<Vec<ServiceCall>, String>) {
            self.call_batches.lock().unwrap().push_back(batch);
        }

        fn requests_issued(&self) -> usize {
            self.order_fetches.load(Ordering::SeqCst)
                + self.call_fetches.load(Ordering::SeqCst)
                + self.status_updates.load(Ordering::SeqCst)
                + self.deletes.load(Ordering::SeqCst)
                + self.resolves.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BoardGateway for MockGateway {
        async fn fetch_orders(&self) -> Result<Vec<Order>, String> {
            self.order_fetches.fetch_add(1, Ordering::SeqCst);
            self.order_batches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![]))
        }

        async fn fetch_calls(&self) -> Result<Vec<ServiceCall>, String> {
            self.call_fetches.fetch_add(1, Ordering::SeqCst);
            self.call_batches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![]))
        }

        async fn resolve_call(&self, _call_id: &str) -> Result<(), String> {
            self.resolves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn update_order_status(
            &self,
            _order_id: &str,
            _status: OrderStatus,
        ) -> Result<(), String> {
            self.status_updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete_order(&self, _order_id: &str) -> Result<(), String> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        fired: Mutex<Vec<AlertKind>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, kind: AlertKind) {
            self.fired.lock().unwrap().push(kind);
        }
    }

    struct DeclineConfirm;

    impl Confirmer for DeclineConfirm {
        fn confirm(&self, _prompt: &str) -> bool {
            false
        }
    }

    fn board_with(
        gateway: Arc<MockGateway>,
        notifier: Arc<RecordingNotifier>,
    ) -> OrderBoard<Arc<MockGateway>> {
        OrderBoard::new(gateway, notifier)
    }

    #[async_trait]
    impl BoardGateway for Arc<MockGateway> {
        async fn fetch_orders(&self) -> Result<Vec<Order>, String> {
            self.as_ref().fetch_orders().await
        }
        async fn fetch_calls(&self) -> Result<Vec<ServiceCall>, String> {
            self.as_ref().fetch_calls().await
        }
        async fn resolve_call(&self, call_id: &str) -> Result<(), String> {
            self.as_ref().resolve_call(call_id).await
        }
        async fn update_order_status(
            &self,
            order_id: &str,
            status: OrderStatus,
        ) -> Result<(), String> {
            self.as_ref().update_order_status(order_id, status).await
        }
        async fn delete_order(&self, order_id: &str) -> Result<(), String> {
            self.as_ref().delete_order(order_id).await
        }
    }

    #[tokio::test]
    async fn test_silent_poll_increase_notifies_once() {
        let gateway = Arc::new(MockGateway::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let board = board_with(gateway.clone(), notifier.clone());

        gateway.push_orders(Ok(pending_batch(2)));
        gateway.push_orders(Ok(pending_batch(3)));
        gateway.push_orders(Ok(pending_batch(3)));

        board.refresh_orders(false).await.unwrap();
        board.refresh_orders(true).await.unwrap();
        board.refresh_orders(true).await.unwrap();

        assert_eq!(*notifier.fired.lock().unwrap(), vec![AlertKind::Order]);
        assert!(board.snapshot().order_alert);
    }

    #[tokio::test]
    async fn test_failed_poll_leaves_state_untouched() {
        let gateway = Arc::new(MockGateway::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let board = board_with(gateway.clone(), notifier.clone());

        gateway.push_orders(Ok(pending_batch(2)));
        gateway.push_orders(Err("Cannot reach backend at https://rms.example".into()));
        gateway.push_orders(Ok(pending_batch(3)));

        board.refresh_orders(false).await.unwrap();
        assert!(board.refresh_orders(true).await.is_err());

        let snapshot = board.snapshot();
        assert_eq!(snapshot.orders.len(), 2);
        assert_eq!(snapshot.pending_orders, 2);
        assert!(!snapshot.order_alert);

        // Recovery on the next tick still compares against the old
        // baseline, so the 2 -> 3 increase fires.
        board.refresh_orders(true).await.unwrap();
        assert_eq!(*notifier.fired.lock().unwrap(), vec![AlertKind::Order]);
    }

    #[tokio::test]
    async fn test_update_status_refetches_orders_only() {
        let gateway = Arc::new(MockGateway::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let board = board_with(gateway.clone(), notifier.clone());

        gateway.push_orders(Ok(vec![order("7", OrderStatus::Preparing)]));
        board
            .update_order_status("7", OrderStatus::Preparing)
            .await
            .unwrap();

        assert_eq!(gateway.status_updates.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.order_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.call_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_call_refetches_calls() {
        let gateway = Arc::new(MockGateway::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let board = board_with(gateway.clone(), notifier.clone());

        gateway.push_calls(Ok(vec![call("c1", CallStatus::Resolved)]));
        let calls = board.resolve_call("c1").await.unwrap();

        assert_eq!(gateway.resolves.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.call_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(calls.len(), 1);
    }

    #[tokio::test]
    async fn test_declined_delete_issues_no_requests() {
        let gateway = Arc::new(MockGateway::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let board = board_with(gateway.clone(), notifier.clone());

        let result = board.delete_order("o1", &DeclineConfirm).await.unwrap();
        assert!(result.is_none());
        assert_eq!(gateway.requests_issued(), 0);
    }

    #[tokio::test]
    async fn test_confirmed_delete_requests_and_refetches() {
        let gateway = Arc::new(MockGateway::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let board = board_with(gateway.clone(), notifier.clone());

        gateway.push_orders(Ok(vec![]));
        let result = board.delete_order("o1", &AlwaysConfirm).await.unwrap();
        assert!(result.is_some());
        assert_eq!(gateway.deletes.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.order_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dismiss_rearms_controller_alert() {
        let gateway = Arc::new(MockGateway::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let board = board_with(gateway.clone(), notifier.clone());

        gateway.push_orders(Ok(pending_batch(1)));
        gateway.push_orders(Ok(pending_batch(2)));
        gateway.push_orders(Ok(pending_batch(3)));

        board.refresh_orders(false).await.unwrap();
        board.refresh_orders(true).await.unwrap();
        board.dismiss_order_alert();
        board.refresh_orders(true).await.unwrap();

        assert_eq!(
            *notifier.fired.lock().unwrap(),
            vec![AlertKind::Order, AlertKind::Order]
        );
    }

    #[tokio::test]
    async fn test_poll_loop_stops_on_handle() {
        let gateway = Arc::new(MockGateway::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let board = Arc::new(board_with(gateway.clone(), notifier));

        let handle = start_board_loop(board, 60);
        assert!(handle.is_running());
        handle.stop();
        assert!(!handle.is_running());

        // Initial non-silent load ran even though the loop was stopped
        // before the first timed tick.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(gateway.order_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.call_fetches.load(Ordering::SeqCst), 1);
    }
}
