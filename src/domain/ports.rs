use super::deal::{Deal, DealStatus};
use super::notification::Notification;
use super::user::User;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Shared handle to a deal store. Stores are shared between the lifecycle
/// engine and the creation flow, so handles are `Arc` rather than `Box`.
pub type DealStoreRef = Arc<dyn DealStore>;
pub type UserStoreRef = Arc<dyn UserStore>;

/// Durable keyed storage for deals. Implementations must serialize
/// conflicting updates to the same token.
#[async_trait]
pub trait DealStore: Send + Sync {
    /// Inserts a new deal. Fails with `Conflict` if the token exists.
    async fn insert(&self, deal: Deal) -> Result<()>;
    async fn get(&self, token: &str) -> Result<Option<Deal>>;
    /// Fails with `NotFound` if the token is unknown.
    async fn update_status(&self, token: &str, status: DealStatus) -> Result<()>;
    /// Binds the buyer. Fails with `NotFound` if the token is unknown.
    async fn set_buyer(&self, token: &str, buyer_id: i64) -> Result<()>;
    /// All deals where the actor is seller or buyer, oldest first.
    async fn for_actor(&self, actor_id: i64) -> Result<Vec<Deal>>;
}

/// Durable keyed storage for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts the user or refreshes the display name. An existing
    /// language preference is never overwritten here.
    async fn upsert(&self, user: User) -> Result<()>;
    /// Language preference, defaulting when the user is unknown.
    async fn get_lang(&self, id: i64) -> Result<String>;
    async fn set_lang(&self, id: i64, lang: &str) -> Result<()>;
}

/// Outbound boundary to the chat transport. Delivery is best-effort and
/// never transactional with persistence: a failed delivery must not roll
/// back the transition that produced the intent.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn deliver(&self, intent: &Notification) -> Result<()>;
}
