//! In-memory `EntitlementStore` — used by tests and offline runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entitlement::model::{CouponRecord, NewStore, StoreRecord, SubscriptionRecord};
use crate::entitlement::redeem::canonicalize_code;
use crate::error::StoreError;
use crate::store::traits::EntitlementStore;

#[derive(Default)]
struct Tables {
    subscriptions: HashMap<Uuid, SubscriptionRecord>,
    /// Keyed by canonical code.
    coupons: HashMap<String, CouponRecord>,
    stores: HashMap<Uuid, StoreRecord>,
}

/// In-memory backend mirroring the remote tables' shape.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a subscription record (replaces any existing record for the user).
    pub async fn insert_subscription(&self, record: SubscriptionRecord) {
        let mut tables = self.tables.write().await;
        tables.subscriptions.insert(record.user_id, record);
    }

    /// Seed a coupon catalog entry, keyed by its canonical code.
    pub async fn insert_coupon(&self, coupon: CouponRecord) {
        let mut tables = self.tables.write().await;
        tables
            .coupons
            .insert(canonicalize_code(&coupon.code), coupon);
    }

    /// Seed a store profile.
    pub async fn insert_store(&self, record: StoreRecord) {
        let mut tables = self.tables.write().await;
        tables.stores.insert(record.user_id, record);
    }

    /// Snapshot of a user's subscription record (test helper).
    pub async fn subscription_for(&self, user_id: Uuid) -> Option<SubscriptionRecord> {
        let tables = self.tables.read().await;
        tables.subscriptions.get(&user_id).cloned()
    }
}

#[async_trait]
impl EntitlementStore for MemoryStore {
    async fn subscription_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.subscriptions.get(&user_id).cloned())
    }

    async fn provision_trial(
        &self,
        user_id: Uuid,
        trial_days: u32,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionRecord, StoreError> {
        let record = SubscriptionRecord::trial(user_id, trial_days, now);
        let mut tables = self.tables.write().await;
        tables.subscriptions.insert(user_id, record.clone());
        Ok(record)
    }

    async fn apply_redemption(
        &self,
        user_id: Uuid,
        new_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.subscriptions.get_mut(&user_id).map(|record| {
            record.subscription_end = Some(new_end);
            record.is_active = true;
            record.updated_at = now;
            record.clone()
        }))
    }

    async fn find_active_coupon(&self, code: &str) -> Result<Option<CouponRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .coupons
            .get(&canonicalize_code(code))
            .filter(|c| c.is_active)
            .cloned())
    }

    async fn store_exists(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.stores.contains_key(&user_id))
    }

    async fn create_store(
        &self,
        user_id: Uuid,
        store: NewStore,
    ) -> Result<StoreRecord, StoreError> {
        let now = Utc::now();
        let record = StoreRecord {
            id: Uuid::new_v4(),
            user_id,
            name: store.name,
            address: store.address,
            phone: store.phone,
            image_url: store.image_url,
            created_at: now,
            updated_at: now,
        };
        let mut tables = self.tables.write().await;
        tables.stores.insert(user_id, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscription_roundtrip() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        assert!(store
            .subscription_for_user(user_id)
            .await
            .unwrap()
            .is_none());

        let record = SubscriptionRecord::trial(user_id, 7, Utc::now());
        store.insert_subscription(record.clone()).await;
        assert_eq!(
            store.subscription_for_user(user_id).await.unwrap(),
            Some(record)
        );
    }

    #[tokio::test]
    async fn coupon_lookup_is_case_insensitive_and_filters_inactive() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .insert_coupon(CouponRecord {
                id: Uuid::new_v4(),
                code: "Save10".to_string(),
                days: 10,
                is_active: true,
                expires_at: None,
                created_at: now,
            })
            .await;
        store
            .insert_coupon(CouponRecord {
                id: Uuid::new_v4(),
                code: "DEAD10".to_string(),
                days: 10,
                is_active: false,
                expires_at: None,
                created_at: now,
            })
            .await;

        assert!(store.find_active_coupon("SAVE10").await.unwrap().is_some());
        assert!(store.find_active_coupon("save10").await.unwrap().is_some());
        assert!(store.find_active_coupon("DEAD10").await.unwrap().is_none());
        assert!(store.find_active_coupon("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn apply_redemption_without_record_returns_none() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let updated = store
            .apply_redemption(Uuid::new_v4(), now, now)
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn create_store_flips_existence() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        assert!(!store.store_exists(user_id).await.unwrap());

        let created = store
            .create_store(
                user_id,
                NewStore {
                    name: "Gupta Kirana".to_string(),
                    address: "4 Temple Street".to_string(),
                    phone: "+91 90000 00000".to_string(),
                    image_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(created.user_id, user_id);
        assert!(store.store_exists(user_id).await.unwrap());
    }

    #[tokio::test]
    async fn provision_trial_creates_record() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let record = store.provision_trial(user_id, 14, now).await.unwrap();
        assert_eq!(record.trial_end, now + chrono::Duration::days(14));
        assert!(store
            .subscription_for_user(user_id)
            .await
            .unwrap()
            .is_some());
    }
}
