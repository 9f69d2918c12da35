//! `EntitlementStore` trait — single async interface over the remote tables
//! the gate reads and writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entitlement::model::{CouponRecord, NewStore, StoreRecord, SubscriptionRecord};
use crate::error::StoreError;

/// Backend-agnostic store trait covering subscriptions, coupons, and store
/// profiles.
///
/// Absence of a record is a legitimate `Ok(None)` / `Ok(false)`, never an
/// error; errors mean the collaborator itself failed.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    // ── Subscriptions ───────────────────────────────────────────────

    /// Fetch the subscription record for a user, if one exists.
    async fn subscription_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionRecord>, StoreError>;

    /// Create a fresh trial record for a user. Used only when the gate is
    /// configured to provision trials client-side.
    async fn provision_trial(
        &self,
        user_id: Uuid,
        trial_days: u32,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionRecord, StoreError>;

    /// Write the redemption mutation: `subscription_end = new_end`,
    /// `is_active = true`, `updated_at = now`. Returns the updated record,
    /// or `None` if the user has no subscription record to update.
    async fn apply_redemption(
        &self,
        user_id: Uuid,
        new_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionRecord>, StoreError>;

    // ── Coupons ─────────────────────────────────────────────────────

    /// Look up a catalog entry by canonical code with `is_active = true`.
    /// Date expiry is the redemption protocol's concern, not the lookup's.
    async fn find_active_coupon(&self, code: &str) -> Result<Option<CouponRecord>, StoreError>;

    // ── Store profiles ──────────────────────────────────────────────

    /// Whether the user has completed store onboarding.
    async fn store_exists(&self, user_id: Uuid) -> Result<bool, StoreError>;

    /// Create the user's store profile (onboarding completion).
    async fn create_store(
        &self,
        user_id: Uuid,
        store: NewStore,
    ) -> Result<StoreRecord, StoreError>;
}
