//! Onboarding sequencer — routing states and the gate driver.

pub mod route;
pub mod sequencer;

pub use route::{RouteState, Screen};
pub use sequencer::{spawn_session_listener, OnboardingSequencer};
