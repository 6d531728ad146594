//! Cliente JSON de la API REST.
//!
//! Contrato de respuesta: `{success, data}` con `success` truthy, o el valor
//! desnudo. `success` falsy se reporta como `RemoteError::Rejected`.
//!
//! Sólo las operaciones idempotentes (GET, PUT) se reintentan. POST y la
//! subida multipart no, para no duplicar registros.

use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::RemoteError;
use crate::retry::with_retry;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    max_retries: u32,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder().timeout(config.timeout)
                                             .build()
                                             .map_err(|e| RemoteError::Config(e.to_string()))?;
        Ok(Self { http,
                  base_url: config.base_url.trim_end_matches('/').to_string(),
                  token: config.token.clone(),
                  max_retries: config.max_retries })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn url(&self, path: &str) -> String { format!("{}/{}", self.base_url, path.trim_start_matches('/')) }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// `GET <collection>?<query>` → lista de entidades.
    pub async fn list(&self, collection: &str, query: &[(String, String)]) -> Result<Vec<Value>, RemoteError> {
        debug!("list:start collection={collection} query={query:?}");
        with_retry(self.max_retries, move || async move {
            let resp = self.request(Method::GET, collection).query(query).send().await?;
            unwrap_list(read_json(resp).await?)
        }).await
    }

    /// `GET <collection>/<id>`.
    pub async fn fetch(&self, collection: &str, id: &str) -> Result<Value, RemoteError> {
        let path = format!("{collection}/{id}");
        let path = path.as_str();
        with_retry(self.max_retries, move || async move {
            let resp = self.request(Method::GET, path).send().await?;
            unwrap_object(read_json(resp).await?)
        }).await
    }

    /// `POST <collection>`. Sin reintentos.
    pub async fn create(&self, collection: &str, body: &Value) -> Result<Value, RemoteError> {
        debug!("create:start collection={collection}");
        let resp = self.request(Method::POST, collection).json(body).send().await?;
        unwrap_object(read_json(resp).await?)
    }

    /// `PUT <collection>/<id>`.
    pub async fn update(&self, collection: &str, id: &str, body: &Value) -> Result<Value, RemoteError> {
        debug!("update:start collection={collection} id={id}");
        let path = format!("{collection}/{id}");
        let path = path.as_str();
        with_retry(self.max_retries, move || async move {
            let resp = self.request(Method::PUT, path).json(body).send().await?;
            unwrap_object(read_json(resp).await?)
        }).await
    }

    /// Subida multipart (campo `file`). Sin reintentos.
    pub async fn upload(&self,
                        path: &str,
                        file_name: &str,
                        content_type: &str,
                        bytes: Vec<u8>)
                        -> Result<Value, RemoteError> {
        debug!("upload:start path={path} file={file_name} bytes={}", bytes.len());
        let part = Part::bytes(bytes).file_name(file_name.to_string())
                                     .mime_str(content_type)
                                     .map_err(|e| RemoteError::Config(e.to_string()))?;
        let resp = self.request(Method::POST, path).multipart(Form::new().part("file", part)).send().await?;
        unwrap_object(read_json(resp).await?)
    }
}

async fn read_json(resp: Response) -> Result<Value, RemoteError> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(RemoteError::from_status(status.as_u16(), text));
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))
}

pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !(s.is_empty() || s == "false" || s == "0"),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn open_envelope(body: Value) -> Result<Value, RemoteError> {
    match body {
        Value::Object(mut map) if map.contains_key("success") => {
            if !is_truthy(map.get("success")) {
                let message = ["message", "error"].iter()
                                                  .find_map(|k| map.get(*k).and_then(Value::as_str))
                                                  .unwrap_or("success=false")
                                                  .to_string();
                return Err(RemoteError::Rejected(message));
            }
            Ok(map.remove("data").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

fn unwrap_list(body: Value) -> Result<Vec<Value>, RemoteError> {
    match open_envelope(body)? {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(RemoteError::Decode(format!("expected array, got {other}"))),
    }
}

/// Objeto único. Algunos endpoints devuelven `[obj]` tras un insert.
fn unwrap_object(body: Value) -> Result<Value, RemoteError> {
    match open_envelope(body)? {
        Value::Array(mut items) if items.len() == 1 => Ok(items.remove(0)),
        other => Ok(other),
    }
}

/// `id` de una entidad, numérico o texto.
pub fn extract_id(value: &Value) -> Option<String> {
    match value.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_handling() {
        assert_eq!(unwrap_list(json!({"success": true, "data": [1, 2]})), Ok(vec![json!(1), json!(2)]));
        assert_eq!(unwrap_list(json!({"success": 1, "data": null})), Ok(vec![]));
        assert_eq!(unwrap_list(json!({"success": false, "message": "nope"})),
                   Err(RemoteError::Rejected("nope".into())));
        assert_eq!(unwrap_list(json!([{"id": 1}])), Ok(vec![json!({"id": 1})]));
        assert!(matches!(unwrap_list(json!({"id": 1})), Err(RemoteError::Decode(_))));
        assert_eq!(unwrap_object(json!({"success": "yes", "data": [{"id": "a"}]})), Ok(json!({"id": "a"})));
    }

    #[test]
    fn ids_may_be_numbers_or_strings() {
        assert_eq!(extract_id(&json!({"id": 12})).as_deref(), Some("12"));
        assert_eq!(extract_id(&json!({"id": "abc123"})).as_deref(), Some("abc123"));
        assert_eq!(extract_id(&json!({"id": ""})), None);
        assert_eq!(extract_id(&json!({})), None);
    }
}
