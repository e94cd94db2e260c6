//! Transactional apply of a desired state.
//!
//! # Responsibilities
//! - Diff the committed snapshot against the new one
//! - Issue every resulting write inside a single transaction
//! - Commit on success, discard the transaction on any failure
//!
//! # Design Decisions
//! - Deletions run first, then backends, then frontends (frontends reference backends)
//! - A changed frontend is deleted and recreated with all its children
//! - Server slots are addressed by the name they had in the old snapshot

use std::future::Future;

use crate::dataplane::client::Dataplane;
use crate::dataplane::transaction::Transaction;
use crate::dataplane::{DataplaneResult, Parent, ResourceKind};
use crate::state::{Backend, Frontend, GlobalState};

/// Outcome of a successful apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Committed transaction, if anything had to be written.
    pub transaction_id: Option<String>,
    pub writes: usize,
}

/// Something that can make a desired state authoritative, atomically.
pub trait StateApplier: Send + Sync {
    /// Converge the load balancer from `old` to `new`. Either every change
    /// is committed or none is.
    fn apply<'a>(
        &'a self,
        old: &'a GlobalState,
        new: &'a GlobalState,
    ) -> impl Future<Output = DataplaneResult<ApplySummary>> + Send + 'a;
}

impl StateApplier for Dataplane {
    fn apply<'a>(
        &'a self,
        old: &'a GlobalState,
        new: &'a GlobalState,
    ) -> impl Future<Output = DataplaneResult<ApplySummary>> + Send + 'a {
        async move {
            let mut tx = self.transaction();

            if let Err(e) = write_changes(&mut tx, old, new).await {
                tracing::warn!(
                    transaction_id = tx.id().unwrap_or("none"),
                    writes = tx.writes(),
                    error = %e,
                    "Discarding transaction"
                );
                tx.abort().await;
                return Err(e);
            }

            let writes = tx.writes();
            let transaction_id = tx.commit().await?;
            Ok(ApplySummary { transaction_id, writes })
        }
    }
}

async fn write_changes(tx: &mut Transaction<'_>, old: &GlobalState, new: &GlobalState) -> DataplaneResult<()> {
    for fe in &old.frontends {
        if new.find_frontend(fe.name()).is_none() {
            tx.delete(ResourceKind::Frontend, fe.name(), &Parent::None).await?;
        }
    }
    for be in &old.backends {
        if new.find_backend(be.name()).is_none() {
            tx.delete(ResourceKind::Backend, be.name(), &Parent::None).await?;
        }
    }

    for be in &new.backends {
        match old.find_backend(be.name()) {
            None => create_backend(tx, be).await?,
            Some(prev) if prev != be => update_backend(tx, prev, be).await?,
            Some(_) => {}
        }
    }

    for fe in &new.frontends {
        match old.find_frontend(fe.name()) {
            None => create_frontend(tx, fe).await?,
            Some(prev) if prev != fe => {
                tx.delete(ResourceKind::Frontend, fe.name(), &Parent::None).await?;
                create_frontend(tx, fe).await?;
            }
            Some(_) => {}
        }
    }

    Ok(())
}

async fn create_frontend(tx: &mut Transaction<'_>, fe: &Frontend) -> DataplaneResult<()> {
    let parent = Parent::Frontend(fe.name().to_string());

    tx.create(ResourceKind::Frontend, &Parent::None, &fe.frontend).await?;
    tx.create(ResourceKind::Bind, &parent, &fe.bind).await?;
    if let Some(filter) = &fe.filter_compression {
        tx.create(ResourceKind::Filter, &parent, filter).await?;
    }
    if let Some(target) = &fe.log_target {
        tx.create(ResourceKind::LogTarget, &parent, target).await?;
    }
    for rule in &fe.http_request_rules {
        tx.create(ResourceKind::HttpRequestRule, &parent, rule).await?;
    }
    for rule in &fe.http_response_rules {
        tx.create(ResourceKind::HttpResponseRule, &parent, rule).await?;
    }
    Ok(())
}

async fn create_backend(tx: &mut Transaction<'_>, be: &Backend) -> DataplaneResult<()> {
    let parent = Parent::Backend(be.name().to_string());

    tx.create(ResourceKind::Backend, &Parent::None, &be.backend).await?;
    if let Some(target) = &be.log_target {
        tx.create(ResourceKind::LogTarget, &parent, target).await?;
    }
    for slot in &be.servers {
        tx.create(ResourceKind::Server, &parent, &slot.to_server()).await?;
    }
    Ok(())
}

async fn update_backend(tx: &mut Transaction<'_>, prev: &Backend, be: &Backend) -> DataplaneResult<()> {
    let parent = Parent::Backend(be.name().to_string());

    if prev.backend != be.backend {
        tx.replace(ResourceKind::Backend, be.name(), &Parent::None, &be.backend).await?;
    }

    match (&prev.log_target, &be.log_target) {
        (None, Some(target)) => tx.create(ResourceKind::LogTarget, &parent, target).await?,
        (Some(old), None) => tx.delete(ResourceKind::LogTarget, &old.index.to_string(), &parent).await?,
        (Some(old), Some(target)) if old != target => {
            tx.replace(ResourceKind::LogTarget, &old.index.to_string(), &parent, target).await?
        }
        _ => {}
    }

    for (i, slot) in be.servers.iter().enumerate() {
        match prev.servers.get(i) {
            Some(old) if old == slot => {}
            Some(old) => {
                tx.replace(ResourceKind::Server, &old.name, &parent, &slot.to_server()).await?;
            }
            None => tx.create(ResourceKind::Server, &parent, &slot.to_server()).await?,
        }
    }
    Ok(())
}
