//! Coupon redemption protocol — exchanges a code for an extended
//! `subscription_end`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::RedemptionError;
use crate::store::EntitlementStore;

/// Outcome of a successful redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    /// Canonical form of the redeemed code.
    pub code: String,
    /// Days granted by the coupon.
    pub days: u32,
    /// The new `subscription_end` written to the record.
    pub extended_until: DateTime<Utc>,
}

/// Canonical form used for catalog comparison: trimmed, upper-cased.
pub fn canonicalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Validates a coupon code against the catalog and, if valid, extends the
/// user's subscription window.
///
/// Policy notes:
/// - `new_end = now + coupon.days` **overwrites** any prior
///   `subscription_end`; a second redemption before the first expires
///   discards the remaining days rather than stacking them.
/// - There is no single-use enforcement and no concurrency token on the
///   write; the same code redeems any number of times and the last writer
///   wins across devices.
pub struct CouponRedeemer {
    store: Arc<dyn EntitlementStore>,
}

impl CouponRedeemer {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    /// Redeem `raw_code` for `user_id` at instant `now`.
    ///
    /// Rejections (`EmptyCode`, `InvalidOrExpired`, `NoSubscription`) leave
    /// the subscription record untouched.
    pub async fn redeem(
        &self,
        user_id: Uuid,
        raw_code: &str,
        now: DateTime<Utc>,
    ) -> Result<Redemption, RedemptionError> {
        let code = canonicalize_code(raw_code);
        if code.is_empty() {
            return Err(RedemptionError::EmptyCode);
        }

        let coupon = self
            .store
            .find_active_coupon(&code)
            .await?
            .ok_or(RedemptionError::InvalidOrExpired)?;

        // Catalog entries may carry a hard expiry date; a dated-out coupon is
        // indistinguishable from an unknown one to the user.
        if let Some(expires_at) = coupon.expires_at {
            if now > expires_at {
                return Err(RedemptionError::InvalidOrExpired);
            }
        }

        let new_end = now + Duration::days(i64::from(coupon.days));
        if self
            .store
            .apply_redemption(user_id, new_end, now)
            .await?
            .is_none()
        {
            return Err(RedemptionError::NoSubscription { user_id });
        }

        info!(
            user_id = %user_id,
            code = %code,
            days = coupon.days,
            extended_until = %new_end,
            "Coupon redeemed"
        );

        Ok(Redemption {
            code,
            days: coupon.days,
            extended_until: new_end,
        })
    }
}
