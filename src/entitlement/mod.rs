//! Entitlement core — data model, access evaluator, and coupon redemption.

pub mod evaluate;
pub mod model;
pub mod redeem;

pub use evaluate::{evaluate, AccessSource, Entitlement};
pub use model::{CouponRecord, NewStore, StoreRecord, SubscriptionRecord};
pub use redeem::{canonicalize_code, CouponRedeemer, Redemption};
