//! Configuration transactions.
//!
//! A transaction is opened on the first write and committed once. Writes
//! made through it only become visible to the load balancer on commit.

use reqwest::Method;
use serde::Serialize;

use crate::dataplane::client::Dataplane;
use crate::dataplane::{DataplaneResult, Parent, ResourceKind};

/// An open (or not yet started) configuration transaction.
pub struct Transaction<'a> {
    client: &'a Dataplane,
    id: Option<String>,
    writes: usize,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(client: &'a Dataplane) -> Self {
        Self {
            client,
            id: None,
            writes: 0,
        }
    }

    /// Transaction identifier, once started.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Number of writes issued so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    async fn ensure_tnx(&mut self) -> DataplaneResult<String> {
        if let Some(id) = &self.id {
            return Ok(id.clone());
        }

        let version = self.client.configuration_version().await?;
        let id = self.client.start_transaction(version).await?;
        tracing::debug!(transaction_id = %id, version, "Transaction started");
        self.id = Some(id.clone());
        Ok(id)
    }

    async fn write<T: Serialize>(
        &mut self,
        method: Method,
        kind: ResourceKind,
        id: Option<&str>,
        parent: &Parent,
        body: Option<&T>,
    ) -> DataplaneResult<()> {
        let tx_id = self.ensure_tnx().await?;

        let path = match id {
            Some(id) => format!("configuration/{}/{}", kind.path(), id),
            None => format!("configuration/{}", kind.path()),
        };
        let mut query = parent.query(kind);
        query.push(("transaction_id", tx_id));

        let body = body.map(serde_json::to_value).transpose()?;
        self.client.make_req(method, &path, &query, body).await?;
        self.writes += 1;
        Ok(())
    }

    /// Create a resource of `kind` under `parent`.
    pub async fn create<T: Serialize>(&mut self, kind: ResourceKind, parent: &Parent, body: &T) -> DataplaneResult<()> {
        self.write(Method::POST, kind, None, parent, Some(body)).await
    }

    /// Replace the resource of `kind` identified by `id` (a name or an index).
    pub async fn replace<T: Serialize>(
        &mut self,
        kind: ResourceKind,
        id: &str,
        parent: &Parent,
        body: &T,
    ) -> DataplaneResult<()> {
        self.write(Method::PUT, kind, Some(id), parent, Some(body)).await
    }

    /// Delete the resource of `kind` identified by `id`.
    pub async fn delete(&mut self, kind: ResourceKind, id: &str, parent: &Parent) -> DataplaneResult<()> {
        self.write::<()>(Method::DELETE, kind, Some(id), parent, None).await
    }

    /// Commit all writes. Returns the transaction id, or `None` when nothing
    /// was written and no transaction was opened.
    pub async fn commit(self) -> DataplaneResult<Option<String>> {
        let Some(id) = self.id else {
            return Ok(None);
        };
        self.client.commit_transaction(&id).await?;
        tracing::debug!(transaction_id = %id, writes = self.writes, "Transaction committed");
        Ok(Some(id))
    }

    /// Discard the transaction. Failures are logged; the transaction is
    /// never committed either way.
    pub async fn abort(self) {
        if let Some(id) = self.id {
            if let Err(e) = self.client.delete_transaction(&id).await {
                tracing::warn!(transaction_id = %id, error = %e, "Failed to discard transaction");
            }
        }
    }
}
