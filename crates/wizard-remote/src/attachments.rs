//! Adjuntos en dos fases: subida multipart → registro contra el registro
//! padre.
//!
//! - Si la subida falla no se registra nada.
//! - Si el registro falla, el error lleva la URL subida y se emite una
//!   notificación bloqueante: el archivo nunca se pierde en silencio.

use std::sync::Arc;

use log::{debug, error, warn};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use wizard_core::{Permission, RemoteId, RequestContext};

use crate::client::{extract_id, ApiClient};
use crate::error::RemoteError;
use crate::notify::{Notice, Notifier};

pub const DEFAULT_UPLOAD_PATH: &str = "uploads";
pub const DEFAULT_REGISTRY_COLLECTION: &str = "anexos";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.to_string(),
               content_type: content_type.to_string(),
               bytes }
    }

    /// sha256 en hex del contenido.
    pub fn checksum(&self) -> String { format!("{:x}", Sha256::digest(&self.bytes)) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredAttachment {
    pub id: String,
    pub url: String,
    pub sha256: String,
}

pub struct Attachments {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
    upload_path: String,
    registry_collection: String,
}

impl Attachments {
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { client,
               notifier,
               upload_path: DEFAULT_UPLOAD_PATH.to_string(),
               registry_collection: DEFAULT_REGISTRY_COLLECTION.to_string() }
    }

    pub fn with_paths(mut self, upload_path: &str, registry_collection: &str) -> Self {
        self.upload_path = upload_path.to_string();
        self.registry_collection = registry_collection.to_string();
        self
    }

    pub async fn attach(&self,
                        ctx: &RequestContext,
                        parent_collection: &str,
                        parent_id: &RemoteId,
                        file: Attachment)
                        -> Result<RegisteredAttachment, RemoteError> {
        ctx.require(Permission::Attach)?;
        let sha256 = file.checksum();
        let Attachment { file_name, content_type, bytes } = file;

        let uploaded = match self.client.upload(&self.upload_path, &file_name, &content_type, bytes).await {
            Ok(v) => v,
            Err(e) => {
                warn!("attach:upload_failed file={file_name} error={e}");
                self.notifier.notify(Notice::warning(format!("Falha ao enviar {file_name}")));
                return Err(e);
            }
        };
        let url = uploaded.get("url")
                          .and_then(Value::as_str)
                          .map(str::to_string)
                          .ok_or_else(|| RemoteError::Decode("upload response without url".into()))?;
        debug!("attach:uploaded file={file_name} url={url}");

        let registration = json!({
            "parent_collection": parent_collection,
            "parent_id": parent_id.as_str(),
            "url": url,
            "nome": file_name,
            "content_type": content_type,
            "sha256": sha256,
            "user_id": ctx.user_id(),
        });
        let registered = self.client
                             .create(&self.registry_collection, &registration)
                             .await
                             .and_then(|v| {
                                 extract_id(&v).ok_or_else(|| RemoteError::Decode("registration without id".into()))
                             });
        match registered {
            Ok(id) => Ok(RegisteredAttachment { id, url, sha256 }),
            Err(e) => {
                error!("attach:register_failed url={url} error={e}");
                self.notifier
                    .notify(Notice::blocking(format!("Arquivo enviado ({url}) mas não vinculado ao registro")));
                Err(RemoteError::AttachmentNotRegistered { url,
                                                           reason: e.to_string() })
            }
        }
    }
}
