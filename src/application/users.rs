use super::ids::IdSeq;
use crate::domain::UserId;
use crate::domain::ports::UserStoreRef;
use crate::domain::user::User;
use crate::error::{EscrowError, Result};

const MAX_LOCALE_LEN: usize = 8;

/// Identity handling for chat-platform users.
pub struct UserService {
    users: UserStoreRef,
    seq: IdSeq,
}

impl UserService {
    pub async fn new(users: UserStoreRef) -> Result<Self> {
        let last_id = users.max_id().await?;
        Ok(Self {
            users,
            seq: IdSeq::starting_after(last_id),
        })
    }

    /// Looks a user up by their platform handle, creating them on first
    /// contact. A changed display name is picked up on re-contact.
    pub async fn get_or_create(&self, external_id: &str, display_name: &str) -> Result<User> {
        if external_id.trim().is_empty() {
            return Err(EscrowError::InvalidInput(
                "external id must not be empty".to_string(),
            ));
        }
        if let Some(mut user) = self.users.by_external_id(external_id).await? {
            if user.display_name != display_name && !display_name.is_empty() {
                user.display_name = display_name.to_string();
                self.users.store(user.clone()).await?;
            }
            return Ok(user);
        }

        let user = User::new(self.seq.next(), external_id, display_name);
        self.users.store(user.clone()).await?;
        tracing::info!(user_id = user.id, external_id, "user registered");
        Ok(user)
    }

    pub async fn get(&self, user_id: UserId) -> Result<User> {
        self.users
            .get(user_id)
            .await?
            .ok_or(EscrowError::UserNotFound { user_id })
    }

    pub async fn set_locale(&self, user_id: UserId, locale: &str) -> Result<User> {
        let locale = locale.trim();
        if locale.is_empty() || locale.len() > MAX_LOCALE_LEN {
            return Err(EscrowError::InvalidInput(format!(
                "locale must be 1-{MAX_LOCALE_LEN} characters"
            )));
        }
        let mut user = self.get(user_id).await?;
        user.locale = locale.to_ascii_lowercase();
        self.users.store(user.clone()).await?;
        Ok(user)
    }

    pub async fn set_payout_address(&self, user_id: UserId, address: &str) -> Result<User> {
        let address = address.trim();
        if address.is_empty() {
            return Err(EscrowError::InvalidInput(
                "payout address must not be empty".to_string(),
            ));
        }
        let mut user = self.get(user_id).await?;
        user.payout_address = Some(address.to_string());
        self.users.store(user.clone()).await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory;

    async fn service() -> UserService {
        UserService::new(in_memory::stores().users).await.unwrap()
    }

    #[tokio::test]
    async fn test_first_contact_creates_user() {
        let users = service().await;
        let user = users.get_or_create("tg:1001", "alice").await.unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.locale, "en");
        assert_eq!(user.positive_feedback, 0);
    }

    #[tokio::test]
    async fn test_recontact_is_idempotent_but_updates_name() {
        let users = service().await;
        let first = users.get_or_create("tg:1001", "alice").await.unwrap();
        let second = users.get_or_create("tg:1001", "alice2").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.display_name, "alice2");
    }

    #[tokio::test]
    async fn test_locale_validation() {
        let users = service().await;
        let user = users.get_or_create("tg:1001", "alice").await.unwrap();
        let updated = users.set_locale(user.id, "RU").await.unwrap();
        assert_eq!(updated.locale, "ru");
        assert!(users.set_locale(user.id, "").await.is_err());
        assert!(users.set_locale(user.id, "way-too-long").await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let users = service().await;
        assert!(matches!(
            users.get(404).await,
            Err(EscrowError::UserNotFound { user_id: 404 })
        ));
    }
}
