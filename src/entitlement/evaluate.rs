//! Entitlement evaluator — the single source of truth for access.

use chrono::{DateTime, Utc};

use super::model::SubscriptionRecord;

/// Which window granted access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSource {
    Trial,
    Subscription,
}

/// Access decision for a user at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entitlement {
    /// Access granted through `until` by the named window.
    Entitled {
        source: AccessSource,
        until: DateTime<Utc>,
    },
    NotEntitled,
}

impl Entitlement {
    pub fn is_entitled(&self) -> bool {
        matches!(self, Self::Entitled { .. })
    }
}

/// Decide whether a user may reach the main application right now.
///
/// Absent record → not entitled. Otherwise entitled while `now` is inside the
/// trial window, or inside the coupon-extended subscription window. Pure and
/// total: absent fields are "not satisfied", never errors.
///
/// `is_active` is deliberately not consulted; redemption sets it, but the
/// decision rests on the two time windows alone.
pub fn evaluate(record: Option<&SubscriptionRecord>, now: DateTime<Utc>) -> Entitlement {
    let Some(record) = record else {
        return Entitlement::NotEntitled;
    };

    if now <= record.trial_end {
        return Entitlement::Entitled {
            source: AccessSource::Trial,
            until: record.trial_end,
        };
    }

    if let Some(subscription_end) = record.subscription_end {
        if now <= subscription_end {
            return Entitlement::Entitled {
                source: AccessSource::Subscription,
                until: subscription_end,
            };
        }
    }

    Entitlement::NotEntitled
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::*;

    fn record(
        trial_end: DateTime<Utc>,
        subscription_end: Option<DateTime<Utc>>,
    ) -> SubscriptionRecord {
        let now = Utc::now();
        SubscriptionRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            trial_start: trial_end - Duration::days(7),
            trial_end,
            subscription_end,
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn absent_record_is_not_entitled() {
        assert_eq!(evaluate(None, Utc::now()), Entitlement::NotEntitled);
    }

    #[test]
    fn inside_trial_no_subscription() {
        let now = Utc::now();
        let r = record(now + Duration::days(2), None);
        assert_eq!(
            evaluate(Some(&r), now),
            Entitlement::Entitled {
                source: AccessSource::Trial,
                until: r.trial_end,
            }
        );
    }

    #[test]
    fn inside_trial_with_lapsed_subscription() {
        let now = Utc::now();
        let r = record(now + Duration::days(2), Some(now - Duration::days(1)));
        assert!(evaluate(Some(&r), now).is_entitled());
    }

    #[test]
    fn past_trial_no_subscription() {
        let now = Utc::now();
        let r = record(now - Duration::days(1), None);
        assert_eq!(evaluate(Some(&r), now), Entitlement::NotEntitled);
    }

    #[test]
    fn past_trial_inside_subscription() {
        let now = Utc::now();
        let end = now + Duration::days(10);
        let r = record(now - Duration::days(1), Some(end));
        assert_eq!(
            evaluate(Some(&r), now),
            Entitlement::Entitled {
                source: AccessSource::Subscription,
                until: end,
            }
        );
    }

    #[test]
    fn past_trial_past_subscription() {
        let now = Utc::now();
        let r = record(now - Duration::days(30), Some(now - Duration::days(1)));
        assert_eq!(evaluate(Some(&r), now), Entitlement::NotEntitled);
    }

    #[test]
    fn boundary_instants_are_inclusive() {
        let now = Utc::now();
        let r = record(now, None);
        assert!(evaluate(Some(&r), now).is_entitled(), "trial_end inclusive");

        let r = record(now - Duration::days(1), Some(now));
        assert!(
            evaluate(Some(&r), now).is_entitled(),
            "subscription_end inclusive"
        );
    }

    #[test]
    fn is_active_flag_is_ignored() {
        let now = Utc::now();
        let mut r = record(now + Duration::days(2), None);
        r.is_active = false;
        assert!(evaluate(Some(&r), now).is_entitled());

        let mut r = record(now - Duration::days(2), None);
        r.is_active = true;
        assert!(!evaluate(Some(&r), now).is_entitled());
    }
}
