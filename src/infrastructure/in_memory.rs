use crate::domain::deal::{Deal, DealStatus};
use crate::domain::ports::{DealStore, UserStore};
use crate::domain::user::{DEFAULT_LANG, User};
use crate::error::{EscrowError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for deals.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access. Mutations
/// take the write lock for the whole read-modify-write, so conflicting
/// updates to the same token are serialized.
#[derive(Default, Clone)]
pub struct InMemoryDealStore {
    deals: Arc<RwLock<HashMap<String, Deal>>>,
}

impl InMemoryDealStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DealStore for InMemoryDealStore {
    async fn insert(&self, deal: Deal) -> Result<()> {
        let mut deals = self.deals.write().await;
        if deals.contains_key(&deal.token) {
            return Err(EscrowError::Conflict(deal.token));
        }
        deals.insert(deal.token.clone(), deal);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<Deal>> {
        let deals = self.deals.read().await;
        Ok(deals.get(token).cloned())
    }

    async fn update_status(&self, token: &str, status: DealStatus) -> Result<()> {
        let mut deals = self.deals.write().await;
        let deal = deals
            .get_mut(token)
            .ok_or_else(|| EscrowError::NotFound(token.to_string()))?;
        deal.status = status;
        Ok(())
    }

    async fn set_buyer(&self, token: &str, buyer_id: i64) -> Result<()> {
        let mut deals = self.deals.write().await;
        let deal = deals
            .get_mut(token)
            .ok_or_else(|| EscrowError::NotFound(token.to_string()))?;
        deal.buyer_id = Some(buyer_id);
        Ok(())
    }

    async fn for_actor(&self, actor_id: i64) -> Result<Vec<Deal>> {
        let deals = self.deals.read().await;
        let mut matching: Vec<Deal> = deals
            .values()
            .filter(|d| d.seller_id == actor_id || d.buyer_id == Some(actor_id))
            .cloned()
            .collect();
        matching.sort_by_key(|d| (d.created_at, d.token.clone()));
        Ok(matching)
    }
}

/// A thread-safe in-memory store for user records.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<i64, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn upsert(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        users
            .entry(user.id)
            .and_modify(|existing| existing.name = user.name.clone())
            .or_insert(user);
        Ok(())
    }

    async fn get_lang(&self, id: i64) -> Result<String> {
        let users = self.users.read().await;
        Ok(users
            .get(&id)
            .map(|u| u.lang.clone())
            .unwrap_or_else(|| DEFAULT_LANG.to_string()))
    }

    async fn set_lang(&self, id: i64, lang: &str) -> Result<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&id) {
            user.lang = lang.to_string();
        }
        Ok(())
    }
}
