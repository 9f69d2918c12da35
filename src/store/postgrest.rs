//! PostgREST-backed `EntitlementStore` — keyed fetches and partial updates
//! against the hosted table API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entitlement::model::{CouponRecord, NewStore, StoreRecord, SubscriptionRecord};
use crate::error::StoreError;
use crate::store::traits::EntitlementStore;

/// Remote table store speaking the PostgREST filter dialect
/// (`?user_id=eq.<uuid>&limit=1`, `Prefer: return=representation`).
pub struct PostgrestStore {
    base_url: String,
    api_key: SecretString,
    /// Per-session access token; falls back to the API key when absent.
    bearer: RwLock<Option<SecretString>>,
    client: reqwest::Client,
}

impl PostgrestStore {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            bearer: RwLock::new(None),
            client: reqwest::Client::new(),
        }
    }

    /// Attach (or clear) the signed-in user's access token. Row-level
    /// security on the backend keys off this.
    pub async fn set_bearer(&self, token: Option<SecretString>) {
        let mut bearer = self.bearer.write().await;
        *bearer = token;
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url.trim_end_matches('/'))
    }

    async fn request(&self, method: Method, table: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, self.rest_url(table))
            .header("apikey", self.api_key.expose_secret());
        let bearer = self.bearer.read().await;
        let token = bearer.as_ref().unwrap_or(&self.api_key);
        builder.bearer_auth(token.expose_secret())
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .request(Method::GET, table)
            .await
            .query(query)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Self::decode_rows(response).await
    }

    async fn write_rows<T: DeserializeOwned>(
        &self,
        method: Method,
        table: &str,
        query: &[(&str, String)],
        body: &serde_json::Value,
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .request(method, table)
            .await
            .query(query)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Self::decode_rows(response).await
    }

    async fn decode_rows<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Vec<T>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl EntitlementStore for PostgrestStore {
    async fn subscription_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let rows: Vec<SubscriptionRecord> = self
            .fetch_rows(
                "user_subscriptions",
                &[
                    ("user_id", format!("eq.{user_id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn provision_trial(
        &self,
        user_id: Uuid,
        trial_days: u32,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionRecord, StoreError> {
        let record = SubscriptionRecord::trial(user_id, trial_days, now);
        let body = serde_json::json!({
            "user_id": record.user_id,
            "trial_start": record.trial_start,
            "trial_end": record.trial_end,
            "is_active": record.is_active,
        });
        let rows: Vec<SubscriptionRecord> = self
            .write_rows(Method::POST, "user_subscriptions", &[], &body)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }

    async fn apply_redemption(
        &self,
        user_id: Uuid,
        new_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let body = serde_json::json!({
            "subscription_end": new_end,
            "is_active": true,
            "updated_at": now,
        });
        let rows: Vec<SubscriptionRecord> = self
            .write_rows(
                Method::PATCH,
                "user_subscriptions",
                &[("user_id", format!("eq.{user_id}"))],
                &body,
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_active_coupon(&self, code: &str) -> Result<Option<CouponRecord>, StoreError> {
        let rows: Vec<CouponRecord> = self
            .fetch_rows(
                "coupons",
                &[
                    ("code", format!("eq.{code}")),
                    ("is_active", "eq.true".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn store_exists(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let rows: Vec<serde_json::Value> = self
            .fetch_rows(
                "stores",
                &[
                    ("user_id", format!("eq.{user_id}")),
                    ("select", "id".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn create_store(
        &self,
        user_id: Uuid,
        store: NewStore,
    ) -> Result<StoreRecord, StoreError> {
        let body = serde_json::json!({
            "user_id": user_id,
            "name": store.name,
            "address": store.address,
            "phone": store.phone,
            "image_url": store.image_url,
        });
        let rows: Vec<StoreRecord> = self
            .write_rows(Method::POST, "stores", &[], &body)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_url_handles_trailing_slash() {
        let store = PostgrestStore::new(
            "https://example.supabase.co/",
            SecretString::from("anon-key".to_string()),
        );
        assert_eq!(
            store.rest_url("coupons"),
            "https://example.supabase.co/rest/v1/coupons"
        );
    }
}
