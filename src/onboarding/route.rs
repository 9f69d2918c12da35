//! Routing states — the discriminated decisions the sequencer publishes.

use serde::{Deserialize, Serialize};

/// Where the user stands on each gate run.
///
/// Every resolve lands on exactly one of these; each maps to a terminal
/// navigation target via [`RouteState::screen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteState {
    /// No authenticated session (also the fail-closed outcome).
    NoSession,
    /// Session present but no subscription record was ever provisioned.
    SessionNoSubscription,
    /// Session present; trial and subscription windows have both lapsed.
    SessionNotEntitled,
    /// Entitled, store onboarding not yet completed.
    SessionEntitledNoStore,
    /// Entitled with a configured store.
    SessionEntitledWithStore,
}

/// Terminal navigation target for a routing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    SignIn,
    /// Coupon-redemption prompt, modal over the sign-in context.
    CouponPrompt,
    StoreSetup,
    MainApp,
}

impl RouteState {
    /// The screen this state routes to. Unprovisioned users are bounced back
    /// to sign-in rather than offered a trial (see the gate config for the
    /// provisioning alternative).
    pub fn screen(&self) -> Screen {
        match self {
            Self::NoSession | Self::SessionNoSubscription => Screen::SignIn,
            Self::SessionNotEntitled => Screen::CouponPrompt,
            Self::SessionEntitledNoStore => Screen::StoreSetup,
            Self::SessionEntitledWithStore => Screen::MainApp,
        }
    }

    /// Whether this state admits the user into the main application.
    pub fn grants_access(&self) -> bool {
        matches!(self, Self::SessionEntitledWithStore)
    }
}

impl std::fmt::Display for RouteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoSession => "no_session",
            Self::SessionNoSubscription => "session_no_subscription",
            Self::SessionNotEntitled => "session_not_entitled",
            Self::SessionEntitledNoStore => "session_entitled_no_store",
            Self::SessionEntitledWithStore => "session_entitled_with_store",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RouteState; 5] = [
        RouteState::NoSession,
        RouteState::SessionNoSubscription,
        RouteState::SessionNotEntitled,
        RouteState::SessionEntitledNoStore,
        RouteState::SessionEntitledWithStore,
    ];

    #[test]
    fn screen_mapping() {
        assert_eq!(RouteState::NoSession.screen(), Screen::SignIn);
        assert_eq!(RouteState::SessionNoSubscription.screen(), Screen::SignIn);
        assert_eq!(RouteState::SessionNotEntitled.screen(), Screen::CouponPrompt);
        assert_eq!(
            RouteState::SessionEntitledNoStore.screen(),
            Screen::StoreSetup
        );
        assert_eq!(
            RouteState::SessionEntitledWithStore.screen(),
            Screen::MainApp
        );
    }

    #[test]
    fn only_entitled_with_store_grants_access() {
        for state in ALL {
            assert_eq!(
                state.grants_access(),
                state == RouteState::SessionEntitledWithStore
            );
        }
    }

    #[test]
    fn display_matches_serde() {
        for state in ALL {
            let display = format!("{state}");
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }
}
