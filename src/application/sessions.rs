use crate::domain::UserId;
use crate::domain::gig::MAX_TITLE_LEN;
use crate::domain::money::Amount;
use crate::error::{EscrowError, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Everything the gig wizard collects; handed to the catalog when the final
/// step completes.
#[derive(Debug, Clone, PartialEq)]
pub struct GigDraft {
    pub title: String,
    pub price: Amount,
    pub description: String,
}

/// What the wizard expects next.
#[derive(Debug, Clone, PartialEq)]
enum WizardState {
    AwaitTitle,
    AwaitPrice { title: String },
    AwaitDescription { title: String, price: Amount },
}

/// Outcome of feeding one message to the wizard.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardStep {
    NeedPrice,
    NeedDescription,
    Complete(GigDraft),
}

struct SessionEntry {
    state: WizardState,
    touched_at: Instant,
}

/// Gig-creation wizard state, keyed by `(user, conversation)`.
///
/// The map is bounded: expired sessions are purged on every access, and when
/// the capacity is reached the longest-idle session is evicted. A session
/// lives through title, price and description prompts and is removed when the
/// draft completes or the user cancels.
pub struct SessionStore {
    inner: Mutex<HashMap<(UserId, u64), SessionEntry>>,
    capacity: usize,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Starts (or restarts) the wizard for this conversation.
    pub fn begin(&self, user_id: UserId, conversation_id: u64) {
        let mut sessions = self.lock();
        Self::purge_expired(&mut sessions, self.ttl);
        if sessions.len() >= self.capacity && !sessions.contains_key(&(user_id, conversation_id)) {
            Self::evict_oldest(&mut sessions);
        }
        sessions.insert(
            (user_id, conversation_id),
            SessionEntry {
                state: WizardState::AwaitTitle,
                touched_at: Instant::now(),
            },
        );
    }

    /// Feeds one user message to the wizard and advances its state.
    pub fn input(&self, user_id: UserId, conversation_id: u64, text: &str) -> Result<WizardStep> {
        let mut sessions = self.lock();
        Self::purge_expired(&mut sessions, self.ttl);
        let key = (user_id, conversation_id);
        let entry = sessions
            .get_mut(&key)
            .ok_or_else(|| EscrowError::InvalidInput("no gig draft in progress".to_string()))?;
        entry.touched_at = Instant::now();

        let step = match &entry.state {
            WizardState::AwaitTitle => {
                let title = text.trim();
                if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
                    return Err(EscrowError::InvalidInput(format!(
                        "title must be 1-{MAX_TITLE_LEN} characters"
                    )));
                }
                entry.state = WizardState::AwaitPrice {
                    title: title.to_string(),
                };
                WizardStep::NeedPrice
            }
            WizardState::AwaitPrice { title } => {
                let value: Decimal = text.trim().parse().map_err(|_| {
                    EscrowError::InvalidAmount(format!("'{}' is not a price", text.trim()))
                })?;
                let price = Amount::new(value)?;
                entry.state = WizardState::AwaitDescription {
                    title: title.clone(),
                    price,
                };
                WizardStep::NeedDescription
            }
            WizardState::AwaitDescription { title, price } => {
                let draft = GigDraft {
                    title: title.clone(),
                    price: *price,
                    description: text.trim().to_string(),
                };
                sessions.remove(&key);
                return Ok(WizardStep::Complete(draft));
            }
        };
        Ok(step)
    }

    pub fn cancel(&self, user_id: UserId, conversation_id: u64) -> bool {
        self.lock().remove(&(user_id, conversation_id)).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(UserId, u64), SessionEntry>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn purge_expired(sessions: &mut HashMap<(UserId, u64), SessionEntry>, ttl: Duration) {
        let now = Instant::now();
        sessions.retain(|_, entry| now.duration_since(entry.touched_at) < ttl);
    }

    fn evict_oldest(sessions: &mut HashMap<(UserId, u64), SessionEntry>) {
        if let Some(key) = sessions
            .iter()
            .min_by_key(|(_, entry)| entry.touched_at)
            .map(|(key, _)| *key)
        {
            sessions.remove(&key);
        }
    }
}
