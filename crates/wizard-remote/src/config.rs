//! Configuración del cliente remoto desde variables de entorno.
//!
//! - `SAFETY_API_URL` (obligatoria)
//! - `SAFETY_API_TOKEN` (bearer opcional)
//! - `SAFETY_API_TIMEOUT_MS` (10000)
//! - `SAFETY_DRAFT_DEBOUNCE_MS` (1000)
//! - `SAFETY_API_MAX_RETRIES` (3)

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use wizard_core::constants::DEFAULT_DEBOUNCE_MS;

use crate::error::RemoteError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub debounce: Duration,
    pub max_retries: u32,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(),
               token: None,
               timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
               debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
               max_retries: DEFAULT_MAX_RETRIES }
    }

    pub fn from_env() -> Result<Self, RemoteError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables inyectada.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RemoteError> {
        let base_url = lookup("SAFETY_API_URL").filter(|v| !v.trim().is_empty())
                                               .ok_or_else(|| RemoteError::Config("SAFETY_API_URL not set".into()))?;
        let timeout = parse_number("SAFETY_API_TIMEOUT_MS", lookup("SAFETY_API_TIMEOUT_MS"), DEFAULT_TIMEOUT_MS)?;
        let debounce = parse_number("SAFETY_DRAFT_DEBOUNCE_MS", lookup("SAFETY_DRAFT_DEBOUNCE_MS"), DEFAULT_DEBOUNCE_MS)?;
        let retries = parse_number("SAFETY_API_MAX_RETRIES", lookup("SAFETY_API_MAX_RETRIES"), DEFAULT_MAX_RETRIES as u64)?;
        let mut config = Self::new(base_url).with_timeout(Duration::from_millis(timeout))
                                            .with_debounce(Duration::from_millis(debounce))
                                            .with_max_retries(u32::try_from(retries).unwrap_or(u32::MAX));
        config.token = lookup("SAFETY_API_TOKEN").filter(|t| !t.trim().is_empty());
        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

fn parse_number(name: &str, raw: Option<String>, default: u64) -> Result<u64, RemoteError> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim()
                    .parse()
                    .map_err(|_| RemoteError::Config(format!("{name} must be a number, got '{v}'"))),
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() { Lazy::force(&DOTENV_LOADED); }

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let cfg = ApiConfig::from_lookup(lookup(&[("SAFETY_API_URL", "http://api.local")])).expect("config");
        assert_eq!(cfg, ApiConfig::new("http://api.local"));
        assert_eq!(cfg.debounce, Duration::from_millis(1_000));
    }

    #[test]
    fn reads_overrides_and_rejects_garbage() {
        let cfg = ApiConfig::from_lookup(lookup(&[("SAFETY_API_URL", "http://api.local"),
                                                  ("SAFETY_API_TOKEN", "tok"),
                                                  ("SAFETY_API_MAX_RETRIES", "0")])).expect("config");
        assert_eq!(cfg.token.as_deref(), Some("tok"));
        assert_eq!(cfg.max_retries, 0);

        assert!(matches!(ApiConfig::from_lookup(lookup(&[])), Err(RemoteError::Config(_))));
        let bad = ApiConfig::from_lookup(lookup(&[("SAFETY_API_URL", "x"), ("SAFETY_API_TIMEOUT_MS", "soon")]));
        assert!(matches!(bad, Err(RemoteError::Config(_))));
    }
}
