//! Estado mutable de una sesión de wizard.
//!
//! La sesión sólo se modifica a través de `WizardController`; aquí viven los
//! getters y el id remoto (que se asigna una sola vez).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::CoreEngineError;
use crate::model::FieldStore;
use crate::validation::ValidationErrors;

/// Id del registro remoto que respalda el borrador. Opaco para el core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Editing,
    /// Estado terminal. Sólo alcanzable desde el último paso.
    Submitted { record_id: String },
}

#[derive(Debug, Clone)]
pub struct FormSession {
    id: Uuid,
    pub(crate) fields: FieldStore,
    pub(crate) current_step: usize,
    pub(crate) errors: ValidationErrors,
    pub(crate) remote_id: Option<RemoteId>,
    /// Pasos visitados antes del actual, en orden. Retroceder hace pop.
    pub(crate) history: Vec<usize>,
    pub(crate) status: SessionStatus,
    /// Registros estructurados que acompañan a los campos (p.ej. planes de
    /// acción). Sólo claves declaradas como sección en la definición.
    pub(crate) sections: BTreeMap<String, Value>,
}

impl FormSession {
    pub(crate) fn new(fields: FieldStore) -> Self {
        Self { id: Uuid::new_v4(),
               fields,
               current_step: 0,
               errors: ValidationErrors::new(),
               remote_id: None,
               history: Vec::new(),
               status: SessionStatus::Editing,
               sections: BTreeMap::new() }
    }

    pub fn id(&self) -> Uuid { self.id }

    pub fn fields(&self) -> &FieldStore { &self.fields }

    pub fn current_step(&self) -> usize { self.current_step }

    pub fn errors(&self) -> &ValidationErrors { &self.errors }

    pub fn remote_id(&self) -> Option<&RemoteId> { self.remote_id.as_ref() }

    pub fn history(&self) -> &[usize] { &self.history }

    pub fn status(&self) -> &SessionStatus { &self.status }

    pub fn section(&self, key: &str) -> Option<&Value> { self.sections.get(key) }

    pub fn sections(&self) -> &BTreeMap<String, Value> { &self.sections }

    pub fn is_submitted(&self) -> bool { matches!(self.status, SessionStatus::Submitted { .. }) }

    /// Pasos visitados incluyendo el actual.
    pub fn visited(&self) -> Vec<usize> {
        let mut out = self.history.clone();
        out.push(self.current_step);
        out
    }

    /// Asigna el id remoto. Reasignar el mismo id es no-op; otro id es error.
    pub(crate) fn assign_remote_id(&mut self, id: RemoteId) -> Result<bool, CoreEngineError> {
        match &self.remote_id {
            None => {
                self.remote_id = Some(id);
                Ok(true)
            }
            Some(current) if *current == id => Ok(false),
            Some(current) => Err(CoreEngineError::RemoteIdAlreadySet { current: current.to_string() }),
        }
    }
}
