//! Gateway en memoria (modo offline y tests). Admite latencia artificial y
//! fallos inyectados para ejercitar carreras y reintentos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use wizard_core::constants::{STATUS_CONCLUDED, STATUS_KEY};
use wizard_core::RemoteId;

use super::DraftGateway;
use crate::error::RemoteError;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub payload: Value,
    /// Cantidad de escrituras aplicadas (1 tras el create).
    pub version: u32,
}

impl StoredRecord {
    pub fn status(&self) -> Option<&str> { self.payload.get(STATUS_KEY).and_then(Value::as_str) }
}

#[derive(Debug, Default)]
pub struct InMemoryDraftGateway {
    records: DashMap<(String, String), StoredRecord>,
    next_id: AtomicU64,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    finalize_calls: AtomicUsize,
    failures: Mutex<VecDeque<RemoteError>>,
    latency: Option<Duration>,
}

impl InMemoryDraftGateway {
    pub fn new() -> Self { Self::default() }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// La próxima operación falla con `err` (se encolan en orden).
    pub fn fail_next(&self, err: RemoteError) {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner).push_back(err);
    }

    pub fn create_calls(&self) -> usize { self.create_calls.load(Ordering::SeqCst) }

    pub fn update_calls(&self) -> usize { self.update_calls.load(Ordering::SeqCst) }

    pub fn finalize_calls(&self) -> usize { self.finalize_calls.load(Ordering::SeqCst) }

    pub fn record(&self, collection: &str, id: &str) -> Option<StoredRecord> {
        self.records.get(&(collection.to_string(), id.to_string())).map(|r| r.clone())
    }

    pub fn count(&self, collection: &str) -> usize { self.records.iter().filter(|e| e.key().0 == collection).count() }

    /// Inserta un registro existente (p.ej. para reanudar un borrador).
    pub fn seed(&self, collection: &str, payload: Value) -> RemoteId {
        let id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
        self.records.insert((collection.to_string(), id.clone()), StoredRecord { payload, version: 1 });
        RemoteId::new(id)
    }

    async fn simulate(&self) -> Result<(), RemoteError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let failure = self.failures.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn write(&self, collection: &str, id: &RemoteId, payload: &Value) -> Result<(), RemoteError> {
        match self.records.get_mut(&(collection.to_string(), id.to_string())) {
            Some(mut record) => {
                record.payload = payload.clone();
                record.version += 1;
                Ok(())
            }
            None => Err(RemoteError::NotFound(format!("{collection}/{id}"))),
        }
    }
}

#[async_trait]
impl DraftGateway for InMemoryDraftGateway {
    async fn create_draft(&self, collection: &str, payload: &Value) -> Result<RemoteId, RemoteError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        Ok(self.seed(collection, payload.clone()))
    }

    async fn update_draft(&self, collection: &str, id: &RemoteId, payload: &Value) -> Result<(), RemoteError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        self.write(collection, id, payload)
    }

    async fn finalize(&self, collection: &str, id: &RemoteId, payload: &Value) -> Result<String, RemoteError> {
        self.finalize_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        if payload.get(STATUS_KEY).and_then(Value::as_str) != Some(STATUS_CONCLUDED) {
            return Err(RemoteError::Rejected(format!("finalize payload must carry {STATUS_KEY}={STATUS_CONCLUDED}")));
        }
        self.write(collection, id, payload)?;
        Ok(id.to_string())
    }

    async fn load_draft(&self, collection: &str, id: &RemoteId) -> Result<Value, RemoteError> {
        self.simulate().await?;
        self.record(collection, id.as_str())
            .map(|r| r.payload)
            .ok_or_else(|| RemoteError::NotFound(format!("{collection}/{id}")))
    }
}
