use async_trait::async_trait;
use serde_json::Value;
use wizard_core::RemoteId;

use super::DraftGateway;
use crate::client::{extract_id, ApiClient};
use crate::error::RemoteError;

#[derive(Debug, Clone)]
pub struct HttpDraftGateway {
    client: ApiClient,
}

impl HttpDraftGateway {
    pub fn new(client: ApiClient) -> Self { Self { client } }

    pub fn client(&self) -> &ApiClient { &self.client }
}

#[async_trait]
impl DraftGateway for HttpDraftGateway {
    async fn create_draft(&self, collection: &str, payload: &Value) -> Result<RemoteId, RemoteError> {
        let created = self.client.create(collection, payload).await?;
        extract_id(&created).map(RemoteId::new)
                            .ok_or_else(|| RemoteError::Decode(format!("create on {collection} returned no id")))
    }

    async fn update_draft(&self, collection: &str, id: &RemoteId, payload: &Value) -> Result<(), RemoteError> {
        self.client.update(collection, id.as_str(), payload).await.map(|_| ())
    }

    async fn finalize(&self, collection: &str, id: &RemoteId, payload: &Value) -> Result<String, RemoteError> {
        let saved = self.client.update(collection, id.as_str(), payload).await?;
        Ok(extract_id(&saved).unwrap_or_else(|| id.to_string()))
    }

    async fn load_draft(&self, collection: &str, id: &RemoteId) -> Result<Value, RemoteError> {
        self.client.fetch(collection, id.as_str()).await
    }
}
