//! Reqwest client for a Firebase-RTDB-style REST surface.
//!
//! Point read: `GET {base}/{path}.json`. Merge: `PATCH {base}/{path}.json`.
//! Multi-path atomic write: `PATCH {base}/.json` with a path-keyed body,
//! where JSON `null` deletes a path.

use reqwest::Client;
use serde_json::{Map, Value};

use async_trait::async_trait;

use super::{StoreError, TreeStore, Updates, WriteGuard};

#[derive(Clone)]
pub struct RtdbClient {
    http: Client,
    base_url: String,
    auth: String,
}

impl RtdbClient {
    pub fn new(base_url: String, auth: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if self.auth.trim().is_empty() {
            format!("{}/{}.json", self.base_url, path)
        } else {
            format!("{}/{}.json?auth={}", self.base_url, path, self.auth)
        }
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(StoreError::Unavailable(format!("{status} {body}")));
        }
        Ok(res)
    }
}

#[async_trait]
impl TreeStore for RtdbClient {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let res = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let value = Self::check(res)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok((!value.is_null()).then_some(value))
    }

    async fn merge(&self, path: &str, patch: Map<String, Value>) -> Result<(), StoreError> {
        let res = self
            .http
            .patch(self.url(path))
            .json(&Value::Object(patch))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Self::check(res).await?;
        Ok(())
    }

    async fn write_batch(
        &self,
        updates: Updates,
        guard: Option<WriteGuard>,
    ) -> Result<(), StoreError> {
        // The REST surface has no conditional multi-path write; the guard is
        // a point read immediately before the batch. The ledger serializes
        // its commits per user, which keeps this check race-free within one
        // server process.
        if let Some(guard) = guard {
            let current = self.get(&guard.path).await?;
            if current != guard.expect {
                return Err(StoreError::Conflict(guard.path));
            }
        }

        let body: Map<String, Value> = updates
            .into_iter()
            .map(|(path, value)| (path, value.unwrap_or(Value::Null)))
            .collect();

        let res = self
            .http
            .patch(self.url(""))
            .json(&Value::Object(body))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Self::check(res).await?;
        Ok(())
    }
}
