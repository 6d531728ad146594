//! Gateway de persistencia de borradores.
//!
//! `create_draft` sólo se usa cuando la sesión todavía no tiene id remoto;
//! a partir de ahí todo guardado es `update_draft` contra ese id (upsert
//! idempotente). `finalize` escribe la forma final con `status = concluido`.

mod http;
mod memory;

pub use http::HttpDraftGateway;
pub use memory::{InMemoryDraftGateway, StoredRecord};

use async_trait::async_trait;
use serde_json::Value;
use wizard_core::RemoteId;

use crate::error::RemoteError;

#[async_trait]
pub trait DraftGateway: Send + Sync {
    async fn create_draft(&self, collection: &str, payload: &Value) -> Result<RemoteId, RemoteError>;
    async fn update_draft(&self, collection: &str, id: &RemoteId, payload: &Value) -> Result<(), RemoteError>;
    /// Devuelve el id del registro final.
    async fn finalize(&self, collection: &str, id: &RemoteId, payload: &Value) -> Result<String, RemoteError>;
    async fn load_draft(&self, collection: &str, id: &RemoteId) -> Result<Value, RemoteError>;
}
