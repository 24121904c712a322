use crate::domain::deal::{Deal, DealStatus};
use crate::domain::ports::{DealStore, UserStore};
use crate::domain::user::{DEFAULT_LANG, User};
use crate::error::{EscrowError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family for deal records.
pub const CF_DEALS: &str = "deals";
/// Column Family for user records.
pub const CF_USERS: &str = "users";

/// A persistent store implementation using RocksDB.
///
/// Deals and users live in separate column families with JSON values.
/// `Clone` shares the underlying `Arc<DB>`, so one handle can serve both
/// the `DealStore` and `UserStore` ports.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the given path, ensuring
    /// both column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_deals = ColumnFamilyDescriptor::new(CF_DEALS, Options::default());
        let cf_users = ColumnFamilyDescriptor::new(CF_USERS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_deals, cf_users])
            .map_err(|e| EscrowError::StoreUnavailable(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| EscrowError::StoreUnavailable(format!("missing column family: {name}")))
    }

    fn read_deal(&self, token: &str) -> Result<Option<Deal>> {
        let cf = self.cf(CF_DEALS)?;
        let bytes = self
            .db
            .get_cf(cf, token.as_bytes())
            .map_err(|e| EscrowError::StoreUnavailable(e.to_string()))?;
        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_deal(&self, deal: &Deal) -> Result<()> {
        let cf = self.cf(CF_DEALS)?;
        let value = serde_json::to_vec(deal)?;
        self.db
            .put_cf(cf, deal.token.as_bytes(), value)
            .map_err(|e| EscrowError::StoreUnavailable(e.to_string()))
    }

    fn read_user(&self, id: i64) -> Result<Option<User>> {
        let cf = self.cf(CF_USERS)?;
        let bytes = self
            .db
            .get_cf(cf, id.to_be_bytes())
            .map_err(|e| EscrowError::StoreUnavailable(e.to_string()))?;
        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_user(&self, user: &User) -> Result<()> {
        let cf = self.cf(CF_USERS)?;
        let value = serde_json::to_vec(user)?;
        self.db
            .put_cf(cf, user.id.to_be_bytes(), value)
            .map_err(|e| EscrowError::StoreUnavailable(e.to_string()))
    }
}

#[async_trait]
impl DealStore for RocksDbStore {
    async fn insert(&self, deal: Deal) -> Result<()> {
        if self.read_deal(&deal.token)?.is_some() {
            return Err(EscrowError::Conflict(deal.token));
        }
        self.write_deal(&deal)
    }

    async fn get(&self, token: &str) -> Result<Option<Deal>> {
        self.read_deal(token)
    }

    async fn update_status(&self, token: &str, status: DealStatus) -> Result<()> {
        let mut deal = self
            .read_deal(token)?
            .ok_or_else(|| EscrowError::NotFound(token.to_string()))?;
        deal.status = status;
        self.write_deal(&deal)
    }

    async fn set_buyer(&self, token: &str, buyer_id: i64) -> Result<()> {
        let mut deal = self
            .read_deal(token)?
            .ok_or_else(|| EscrowError::NotFound(token.to_string()))?;
        deal.buyer_id = Some(buyer_id);
        self.write_deal(&deal)
    }

    async fn for_actor(&self, actor_id: i64) -> Result<Vec<Deal>> {
        let cf = self.cf(CF_DEALS)?;
        let mut matching = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) =
                item.map_err(|e| EscrowError::StoreUnavailable(e.to_string()))?;
            let deal: Deal = serde_json::from_slice(&value)?;
            if deal.seller_id == actor_id || deal.buyer_id == Some(actor_id) {
                matching.push(deal);
            }
        }
        matching.sort_by_key(|d| (d.created_at, d.token.clone()));
        Ok(matching)
    }
}

#[async_trait]
impl UserStore for RocksDbStore {
    async fn upsert(&self, user: User) -> Result<()> {
        match self.read_user(user.id)? {
            Some(mut existing) => {
                existing.name = user.name;
                self.write_user(&existing)
            }
            None => self.write_user(&user),
        }
    }

    async fn get_lang(&self, id: i64) -> Result<String> {
        Ok(self
            .read_user(id)?
            .map(|u| u.lang)
            .unwrap_or_else(|| DEFAULT_LANG.to_string()))
    }

    async fn set_lang(&self, id: i64, lang: &str) -> Result<()> {
        if let Some(mut user) = self.read_user(id)? {
            user.lang = lang.to_string();
            self.write_user(&user)?;
        }
        Ok(())
    }
}
