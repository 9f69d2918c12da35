//! Kiraana — entitlement gate and onboarding sequencer for the shop
//! management client.

pub mod auth;
pub mod config;
pub mod entitlement;
pub mod error;
pub mod onboarding;
pub mod store;
