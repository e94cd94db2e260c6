//! Data Plane API HTTP client.
//!
//! # Responsibilities
//! - Issue authenticated requests with a bounded timeout
//! - Read resource lists scoped to a parent
//! - Manage the transaction lifecycle (version, begin, commit, abort)

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::config::DataplaneConfig;
use crate::dataplane::models;
use crate::dataplane::transaction::Transaction;
use crate::dataplane::{DataplaneError, DataplaneResult, Parent, ResourceKind};

const API_PREFIX: &str = "v2/services/haproxy/";

/// Client for the HAProxy Data Plane API.
#[derive(Clone)]
pub struct Dataplane {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
struct TransactionResponse {
    id: String,
}

impl Dataplane {
    /// Create a new client from configuration.
    pub fn new(config: &DataplaneConfig) -> DataplaneResult<Self> {
        let mut base_url = Url::parse(&config.url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Send a request and return the raw response body.
    pub(crate) async fn make_req(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> DataplaneResult<String> {
        let url = self.base_url.join(API_PREFIX)?.join(path)?;

        tracing::trace!(method = %method, url = %url, "Data Plane API request");

        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
            .query(query);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            return Err(DataplaneError::Status {
                code: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    /// List every resource of `kind` scoped to `parent`.
    pub async fn list<T: DeserializeOwned>(&self, kind: ResourceKind, parent: &Parent) -> DataplaneResult<Vec<T>> {
        let text = self
            .make_req(
                Method::GET,
                &format!("configuration/{}", kind.path()),
                &parent.query(kind),
                None,
            )
            .await?;
        let envelope: DataEnvelope<T> = serde_json::from_str(&text)?;
        Ok(envelope.data)
    }

    pub async fn frontends(&self) -> DataplaneResult<Vec<models::Frontend>> {
        self.list(ResourceKind::Frontend, &Parent::None).await
    }

    pub async fn backends(&self) -> DataplaneResult<Vec<models::Backend>> {
        self.list(ResourceKind::Backend, &Parent::None).await
    }

    pub async fn binds(&self, frontend: &str) -> DataplaneResult<Vec<models::Bind>> {
        self.list(ResourceKind::Bind, &Parent::Frontend(frontend.to_string())).await
    }

    pub async fn servers(&self, backend: &str) -> DataplaneResult<Vec<models::Server>> {
        self.list(ResourceKind::Server, &Parent::Backend(backend.to_string())).await
    }

    pub async fn filters(&self, parent: &Parent) -> DataplaneResult<Vec<models::Filter>> {
        self.list(ResourceKind::Filter, parent).await
    }

    pub async fn log_targets(&self, parent: &Parent) -> DataplaneResult<Vec<models::LogTarget>> {
        self.list(ResourceKind::LogTarget, parent).await
    }

    pub async fn http_request_rules(&self, parent: &Parent) -> DataplaneResult<Vec<models::HttpRequestRule>> {
        self.list(ResourceKind::HttpRequestRule, parent).await
    }

    pub async fn http_response_rules(&self, parent: &Parent) -> DataplaneResult<Vec<models::HttpResponseRule>> {
        self.list(ResourceKind::HttpResponseRule, parent).await
    }

    /// Current configuration version, required to open a transaction.
    pub async fn configuration_version(&self) -> DataplaneResult<i64> {
        let text = self
            .make_req(Method::GET, "configuration/version", &[], None)
            .await?;
        Ok(serde_json::from_str(text.trim())?)
    }

    pub(crate) async fn start_transaction(&self, version: i64) -> DataplaneResult<String> {
        let text = self
            .make_req(Method::POST, "transactions", &[("version", version.to_string())], None)
            .await?;
        let tx: TransactionResponse = serde_json::from_str(&text)?;
        Ok(tx.id)
    }

    pub(crate) async fn commit_transaction(&self, id: &str) -> DataplaneResult<()> {
        self.make_req(Method::PUT, &format!("transactions/{}", id), &[], None)
            .await?;
        Ok(())
    }

    pub(crate) async fn delete_transaction(&self, id: &str) -> DataplaneResult<()> {
        self.make_req(Method::DELETE, &format!("transactions/{}", id), &[], None)
            .await?;
        Ok(())
    }

    /// Open a lazy transaction; nothing is sent until the first write.
    pub fn transaction(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl std::fmt::Debug for Dataplane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataplane")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish()
    }
}
