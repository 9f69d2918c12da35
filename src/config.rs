//! Configuration types.

use crate::error::ConfigError;

/// What to do when an authenticated user has no subscription record.
///
/// The shipped backend provisions subscriptions out-of-band, so the observed
/// client simply bounces record-less users back to sign-in. Deployments that
/// provision client-side use `ProvisionTrial` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSubscriptionPolicy {
    /// Route the user back to sign-in.
    Deny,
    /// Write a fresh trial record and continue evaluating.
    ProvisionTrial { trial_days: u32 },
}

impl Default for MissingSubscriptionPolicy {
    fn default() -> Self {
        Self::Deny
    }
}

/// Gate configuration.
#[derive(Debug, Clone, Default)]
pub struct GateConfig {
    /// Policy for authenticated users with no subscription record.
    pub missing_subscription: MissingSubscriptionPolicy,
}

/// Default trial length when `ProvisionTrial` is selected without an explicit
/// day count.
pub const DEFAULT_TRIAL_DAYS: u32 = 7;

impl GateConfig {
    /// Build from `KIRAANA_MISSING_SUBSCRIPTION` (`deny` | `trial`) and
    /// `KIRAANA_TRIAL_DAYS`. Unset variables fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let policy = std::env::var("KIRAANA_MISSING_SUBSCRIPTION")
            .unwrap_or_else(|_| "deny".to_string());
        let trial_days = match std::env::var("KIRAANA_TRIAL_DAYS") {
            Ok(raw) => raw
                .parse::<u32>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "KIRAANA_TRIAL_DAYS".to_string(),
                    message: e.to_string(),
                })?,
            Err(_) => DEFAULT_TRIAL_DAYS,
        };
        let missing_subscription = Self::parse_policy(&policy, trial_days)?;
        Ok(Self {
            missing_subscription,
        })
    }

    fn parse_policy(
        raw: &str,
        trial_days: u32,
    ) -> Result<MissingSubscriptionPolicy, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "deny" => Ok(MissingSubscriptionPolicy::Deny),
            "trial" => Ok(MissingSubscriptionPolicy::ProvisionTrial { trial_days }),
            other => Err(ConfigError::InvalidValue {
                key: "KIRAANA_MISSING_SUBSCRIPTION".to_string(),
                message: format!("expected 'deny' or 'trial', got '{other}'"),
            }),
        }
    }
}
