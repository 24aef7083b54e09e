use crate::domain::ports::NotificationSink;
use crate::domain::UserId;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Logs notifications instead of delivering them. The default sink for the
/// replay driver, where no messaging transport is attached.
pub struct TracingNotifier;

#[async_trait]
impl NotificationSink for TracingNotifier {
    async fn notify(&self, user_id: UserId, message: &str) {
        tracing::info!(user_id, message, "notify");
    }
}

/// Captures notifications in memory so tests can assert on them.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(UserId, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(UserId, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, user_id: UserId, message: &str) {
        self.sent.lock().await.push((user_id, message.to_string()));
    }
}
