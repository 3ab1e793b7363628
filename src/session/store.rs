// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Band-scoped session document store.
//!
//! The store offers point reads, full overwrites, field-level updates and
//! change subscriptions. Subscribers always receive the whole document,
//! or `None` when there is no document or the connection is lost.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, warn};

use super::{BandId, RegencySession, SessionPatch};
use crate::error::StoreError;

/// Document store holding one session per band
pub trait SessionStore: Send + Sync + 'static {
    /// Read the current document
    fn read(
        &self,
        band: &BandId,
    ) -> impl Future<Output = Result<Option<RegencySession>, StoreError>> + Send;

    /// Overwrite the whole document, creating it if needed
    fn write(
        &self,
        band: &BandId,
        session: RegencySession,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Update the patched fields of an existing document
    fn update(
        &self,
        band: &BandId,
        patch: SessionPatch,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Update the patched fields, creating a rest-state document if none exists
    fn merge(
        &self,
        band: &BandId,
        patch: SessionPatch,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Subscribe to full-document pushes for `band`
    fn subscribe(&self, band: &BandId) -> watch::Receiver<Option<RegencySession>>;
}

#[derive(Default)]
struct StoreInner {
    documents: HashMap<BandId, RegencySession>,
    channels: HashMap<BandId, watch::Sender<Option<RegencySession>>>,
    offline: bool,
}

impl StoreInner {
    fn channel(&mut self, band: &BandId) -> &watch::Sender<Option<RegencySession>> {
        let initial = if self.offline {
            None
        } else {
            self.documents.get(band).cloned()
        };
        self.channels
            .entry(band.clone())
            .or_insert_with(|| watch::channel(initial).0)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            Err(StoreError::Unavailable("store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn publish(&mut self, band: &BandId) {
        let document = self.documents.get(band).cloned();
        self.channel(band).send_replace(document);
    }
}

/// In-memory store with push fan-out over tokio watch channels
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulate losing or regaining the connection.
    ///
    /// While offline, reads and writes fail and subscribers see `None`.
    pub fn set_offline(&self, offline: bool) {
        let mut inner = self.lock();
        if inner.offline == offline {
            return;
        }
        inner.offline = offline;

        let bands: Vec<BandId> = inner.channels.keys().cloned().collect();
        for band in bands {
            if offline {
                inner.channel(&band).send_replace(None);
            } else {
                inner.publish(&band);
            }
        }

        if offline {
            warn!("session store went offline");
        } else {
            debug!("session store back online");
        }
    }
}

impl SessionStore for MemorySessionStore {
    async fn read(&self, band: &BandId) -> Result<Option<RegencySession>, StoreError> {
        let inner = self.lock();
        inner.check_online()?;
        Ok(inner.documents.get(band).cloned())
    }

    async fn write(&self, band: &BandId, session: RegencySession) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.check_online()?;
        inner.documents.insert(band.clone(), session);
        inner.publish(band);
        Ok(())
    }

    async fn update(&self, band: &BandId, patch: SessionPatch) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.check_online()?;
        let document = inner
            .documents
            .get_mut(band)
            .ok_or_else(|| StoreError::NotFound(band.clone()))?;
        patch.apply(document);
        inner.publish(band);
        Ok(())
    }

    async fn merge(&self, band: &BandId, patch: SessionPatch) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.check_online()?;
        let document = inner.documents.entry(band.clone()).or_default();
        patch.apply(document);
        inner.publish(band);
        Ok(())
    }

    fn subscribe(&self, band: &BandId) -> watch::Receiver<Option<RegencySession>> {
        self.lock().channel(band).subscribe()
    }
}
