//! Onboarding sequencer — computes a routing state from session, entitlement,
//! and store existence; one routine for app start, post-login, and the route
//! guard.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::auth::AuthProvider;
use crate::config::{GateConfig, MissingSubscriptionPolicy};
use crate::entitlement::evaluate;
use crate::entitlement::model::{NewStore, StoreRecord};
use crate::entitlement::redeem::{CouponRedeemer, Redemption};
use crate::error::{AuthError, Error, RedemptionError};
use crate::onboarding::route::RouteState;
use crate::store::EntitlementStore;

/// Drives the ordered checks — session present? entitled? store configured? —
/// and publishes the resulting routing state.
///
/// Every trigger re-runs from a clean fetch; entitlement decisions are never
/// cached across triggers. In-flight runs carry a generation token, and a run
/// that finishes after a newer one started is discarded rather than applied.
pub struct OnboardingSequencer {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn EntitlementStore>,
    redeemer: CouponRedeemer,
    config: GateConfig,
    generation: AtomicU64,
    route_tx: watch::Sender<RouteState>,
}

impl OnboardingSequencer {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn EntitlementStore>,
        config: GateConfig,
    ) -> Arc<Self> {
        let (route_tx, _rx) = watch::channel(RouteState::NoSession);
        Arc::new(Self {
            auth,
            store: Arc::clone(&store),
            redeemer: CouponRedeemer::new(store),
            config,
            generation: AtomicU64::new(0),
            route_tx,
        })
    }

    /// Subscribe to published routing decisions.
    pub fn watch(&self) -> watch::Receiver<RouteState> {
        self.route_tx.subscribe()
    }

    /// The most recently published routing state.
    pub fn current(&self) -> RouteState {
        *self.route_tx.borrow()
    }

    /// Re-run the gate checks and publish the result, unless a newer run
    /// started while this one was in flight.
    pub async fn resolve(&self) -> RouteState {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let state = self.compute(Utc::now()).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(%state, generation, "Discarding stale routing decision");
            return state;
        }
        self.route_tx.send_replace(state);
        debug!(%state, generation, "Routing decision published");
        state
    }

    /// The five-step check. Any collaborator failure resolves to `NoSession`
    /// (fail-closed) rather than an indeterminate state.
    async fn compute(&self, now: DateTime<Utc>) -> RouteState {
        let session = match self.auth.current_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Session fetch failed; failing closed");
                return RouteState::NoSession;
            }
        };
        let Some(session) = session else {
            return RouteState::NoSession;
        };

        let record = match self.store.subscription_for_user(session.user_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, user_id = %session.user_id, "Subscription fetch failed; failing closed");
                return RouteState::NoSession;
            }
        };
        let record = match record {
            Some(record) => record,
            None => match self.config.missing_subscription {
                MissingSubscriptionPolicy::Deny => return RouteState::SessionNoSubscription,
                MissingSubscriptionPolicy::ProvisionTrial { trial_days } => {
                    match self.store.provision_trial(session.user_id, trial_days, now).await {
                        Ok(record) => {
                            info!(user_id = %session.user_id, trial_days, "Provisioned trial subscription");
                            record
                        }
                        Err(e) => {
                            warn!(error = %e, user_id = %session.user_id, "Trial provisioning failed; failing closed");
                            return RouteState::NoSession;
                        }
                    }
                }
            },
        };

        if !evaluate(Some(&record), now).is_entitled() {
            return RouteState::SessionNotEntitled;
        }

        match self.store.store_exists(session.user_id).await {
            Ok(true) => RouteState::SessionEntitledWithStore,
            Ok(false) => RouteState::SessionEntitledNoStore,
            Err(e) => {
                warn!(error = %e, user_id = %session.user_id, "Store check failed; failing closed");
                RouteState::NoSession
            }
        }
    }

    /// Submit a coupon code for the signed-in user. On success the caller
    /// re-runs [`resolve`](Self::resolve) from the entitlement step.
    pub async fn submit_coupon(&self, raw_code: &str) -> Result<Redemption, RedemptionError> {
        let session = self
            .auth
            .current_session()
            .await?
            .ok_or(RedemptionError::NoSession)?;
        self.redeemer
            .redeem(session.user_id, raw_code, Utc::now())
            .await
    }

    /// Explicit session termination. The auth provider broadcasts the
    /// sign-out, which triggers a fresh resolve in the listener task.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.auth.sign_out().await
    }

    /// Complete store onboarding for the signed-in user. The caller
    /// re-resolves afterwards.
    pub async fn complete_store_setup(&self, store: NewStore) -> Result<StoreRecord, Error> {
        let session = self
            .auth
            .current_session()
            .await?
            .ok_or(Error::Auth(AuthError::NotSignedIn))?;
        let record = self.store.create_store(session.user_id, store).await?;
        info!(user_id = %session.user_id, store_id = %record.id, "Store onboarding completed");
        Ok(record)
    }
}

/// Spawn the listener that re-resolves on every session event.
pub fn spawn_session_listener(
    sequencer: Arc<OnboardingSequencer>,
) -> tokio::task::JoinHandle<()> {
    let mut events = sequencer.auth.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    debug!(?event, "Session event; re-resolving");
                    sequencer.resolve().await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session event stream lagged; re-resolving");
                    sequencer.resolve().await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
