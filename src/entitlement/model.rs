//! Entitlement data model — wire rows for the subscription, coupon, and
//! store tables.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entitlement record per user (`user_subscriptions` row).
///
/// Created out-of-band (or by the sequencer's trial-provisioning policy),
/// read on every entitlement check, mutated only by coupon redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: Uuid,
    /// Owner back-reference; records are keyed by this, at most one per user.
    pub user_id: Uuid,
    pub trial_start: DateTime<Utc>,
    pub trial_end: DateTime<Utc>,
    /// Present once any coupon has been redeemed. Overwritten, never
    /// accumulated, by each redemption.
    #[serde(default)]
    pub subscription_end: Option<DateTime<Utc>>,
    /// Set by redemption; not consulted by the access decision.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    /// Build a fresh trial record starting at `now`.
    pub fn trial(user_id: Uuid, trial_days: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            trial_start: now,
            trial_end: now + Duration::days(i64::from(trial_days)),
            subscription_end: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Coupon catalog entry (`coupons` row). Read-only from this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponRecord {
    pub id: Uuid,
    /// Unique, matched case-insensitively (stored upper-case).
    pub code: String,
    /// Extension granted on redemption, in calendar days.
    pub days: u32,
    /// Eligibility flag; inactive coupons never redeem.
    pub is_active: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Shop profile (`stores` row). The gate only checks existence; the setup
/// screen writes it once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a store during onboarding.
#[derive(Debug, Clone, Serialize)]
pub struct NewStore {
    pub name: String,
    pub address: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trial_record_spans_requested_days() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let record = SubscriptionRecord::trial(user_id, 7, now);
        assert_eq!(record.user_id, user_id);
        assert_eq!(record.trial_start, now);
        assert_eq!(record.trial_end, now + Duration::days(7));
        assert!(record.subscription_end.is_none());
    }

    #[test]
    fn subscription_row_deserializes_without_subscription_end() {
        let json = r#"{
            "id": "0d4aa6f2-8ab6-47a1-a4a7-2274ca54b8f1",
            "user_id": "b2f9c6c2-9f37-4f3e-9f2e-0a6a8a0d6f54",
            "trial_start": "2026-01-01T00:00:00Z",
            "trial_end": "2026-01-08T00:00:00Z",
            "is_active": true,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        }"#;
        let record: SubscriptionRecord = serde_json::from_str(json).unwrap();
        assert!(record.subscription_end.is_none());
        assert!(record.is_active);
    }

    #[test]
    fn coupon_row_deserializes_with_null_expiry() {
        let json = r#"{
            "id": "5f1f6f9e-3f7a-4a58-b3a3-34f6b5e5f111",
            "code": "WELCOME30",
            "days": 30,
            "is_active": true,
            "expires_at": null,
            "created_at": "2026-01-01T00:00:00Z"
        }"#;
        let coupon: CouponRecord = serde_json::from_str(json).unwrap();
        assert_eq!(coupon.code, "WELCOME30");
        assert_eq!(coupon.days, 30);
        assert!(coupon.expires_at.is_none());
    }

    #[test]
    fn new_store_skips_absent_image_url() {
        let store = NewStore {
            name: "Sharma General Store".to_string(),
            address: "12 Market Road".to_string(),
            phone: "+91 98765 43210".to_string(),
            image_url: None,
        };
        let json = serde_json::to_value(&store).unwrap();
        assert!(json.get("image_url").is_none());
    }
}
