use super::engine::Engine;
use crate::domain::OrderId;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Background task that settles released orders.
///
/// Consumes order ids queued by the engine, closes each order's hold as a
/// payout and moves it to COMPLETED. The settlement is idempotent, so a job
/// delivered twice (or an order whose hold a dispute verdict already closed)
/// settles cleanly. The loop ends once the engine closes the queue and all
/// queued jobs are drained.
pub struct PayoutWorker {
    engine: Arc<Engine>,
    rx: mpsc::UnboundedReceiver<OrderId>,
}

impl PayoutWorker {
    pub(crate) fn new(engine: Arc<Engine>, rx: mpsc::UnboundedReceiver<OrderId>) -> Self {
        Self { engine, rx }
    }

    pub async fn run(mut self) {
        while let Some(order_id) = self.rx.recv().await {
            match self.engine.complete_withdrawal(order_id).await {
                Ok(order) => {
                    tracing::info!(order_id, status = %order.status, "withdrawal settled");
                }
                Err(e) => {
                    // Jobs are not retried here; re-running a dropped job by
                    // hand is safe because settlement is idempotent.
                    tracing::warn!(order_id, error = %e, "withdrawal job failed");
                }
            }
        }
        tracing::debug!("payout queue closed, worker exiting");
    }
}
