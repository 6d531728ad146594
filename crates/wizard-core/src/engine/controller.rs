//! Controlador del wizard.
//!
//! Orquesta store, validador y stepper sobre una `FormSession`:
//! - `set_field` escribe y reinicia dependientes;
//! - `advance` valida el paso actual y sigue la tabla de transiciones;
//! - `retreat` vuelve al paso visitado anterior sin revalidar;
//! - `prepare_finalize` + `complete` cierran la sesión desde el último paso.
//!
//! Las operaciones de navegación no hacen I/O. La persistencia remota vive en
//! otra capa y sólo informa al controlador mediante `assign_remote_id` y
//! `record`.

use std::sync::Arc;

use log::{debug, info};
use serde_json::Value;

use crate::completion::{CompletionCheck, RequiredFieldsCheck};
use crate::errors::CoreEngineError;
use crate::event::{EventStore, InMemoryEventStore, SessionEvent, SessionEventKind};
use crate::model::{FieldStore, FieldValue, SetResult};
use crate::step::{StepDefinition, StepStatus};
use crate::validation::ValidationErrors;

use super::{FormSession, RemoteId, SessionStatus, WizardDefinition};

/// Resultado de un intento de navegación. Un rechazo por validación es un
/// resultado normal, no un error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Moved { from: String, to: String },
    Rejected(ValidationErrors),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    Ready,
    Rejected(ValidationErrors),
}

pub struct WizardController<E: EventStore = InMemoryEventStore> {
    definition: Arc<WizardDefinition>,
    session: FormSession,
    event_store: E,
    finalize_ready: bool,
}

impl<E: EventStore> WizardController<E> {
    pub fn new(definition: Arc<WizardDefinition>, event_store: E) -> Self {
        let session = FormSession::new(definition.new_store());
        let mut controller = Self { definition,
                                    session,
                                    event_store,
                                    finalize_ready: false };
        let kind = SessionEventKind::SessionStarted { definition_hash: controller.definition.definition_hash().to_string(),
                                                      step_count: controller.definition.len() };
        controller.record(kind);
        info!("session:start wizard={} session_id={}",
              controller.definition.name(),
              controller.session.id());
        controller
    }

    /// Reconstruye una sesión desde un borrador remoto. `fields` debe venir
    /// de `shape::restore_fields`; `step_id` es el `etapa_atual` guardado.
    pub fn resume(definition: Arc<WizardDefinition>,
                  event_store: E,
                  remote_id: RemoteId,
                  fields: FieldStore,
                  step_id: Option<&str>)
                  -> Result<Self, CoreEngineError> {
        let index = match step_id {
            Some(id) => definition.index_of(id).ok_or_else(|| CoreEngineError::UnknownStep(id.to_string()))?,
            None => 0,
        };
        let mut session = FormSession::new(fields);
        session.current_step = index;
        session.history = definition.path_to(index, &session.fields);
        session.assign_remote_id(remote_id.clone())?;
        let mut controller = Self { definition,
                                    session,
                                    event_store,
                                    finalize_ready: false };
        let kind = SessionEventKind::SessionResumed { definition_hash: controller.definition.definition_hash().to_string(),
                                                      remote_id: remote_id.to_string(),
                                                      step_index: index };
        controller.record(kind);
        info!("session:resume wizard={} remote_id={remote_id} step_index={index}",
              controller.definition.name());
        Ok(controller)
    }

    pub fn definition(&self) -> &WizardDefinition { &self.definition }

    pub fn shared_definition(&self) -> Arc<WizardDefinition> { Arc::clone(&self.definition) }

    pub fn session(&self) -> &FormSession { &self.session }

    pub fn event_store(&self) -> &E { &self.event_store }

    pub fn events(&self) -> Vec<SessionEvent> { self.event_store.list(self.session.id()) }

    pub fn current_step(&self) -> &dyn StepDefinition { self.definition.step_at(self.session.current_step) }

    pub fn is_first_step(&self) -> bool { self.session.history.is_empty() }

    pub fn is_last_step(&self) -> bool { self.session.current_step == self.definition.last_index() }

    pub fn get(&self, key: &str) -> Option<&FieldValue> { self.session.fields.get(key) }

    fn ensure_editing(&self) -> Result<(), CoreEngineError> {
        if self.session.is_submitted() {
            return Err(CoreEngineError::SessionSubmitted);
        }
        Ok(())
    }

    /// Escribe un campo declarado por la definición. Devuelve qué
    /// dependientes se reiniciaron.
    pub fn set_field(&mut self, key: &str, value: FieldValue) -> Result<SetResult, CoreEngineError> {
        self.ensure_editing()?;
        let (_, spec) = self.definition
                            .field_spec(key)
                            .ok_or_else(|| CoreEngineError::UnknownField(key.to_string()))?;
        if !spec.kind.accepts(&value) {
            return Err(CoreEngineError::InvalidAnswer { field: key.to_string(),
                                                        reason: format!("expected {}", spec.kind.name()) });
        }
        let result = self.session.fields.set(key, value);
        self.after_write(key, &result);
        Ok(result)
    }

    pub fn clear_field(&mut self, key: &str) -> Result<SetResult, CoreEngineError> {
        self.ensure_editing()?;
        if self.definition.field_spec(key).is_none() {
            return Err(CoreEngineError::UnknownField(key.to_string()));
        }
        let result = self.session.fields.remove(key);
        self.after_write(key, &result);
        Ok(result)
    }

    fn after_write(&mut self, key: &str, result: &SetResult) {
        if !result.changed {
            return;
        }
        self.finalize_ready = false;
        if !result.cleared.is_empty() {
            debug!("set_field:cascade key={key} cleared={:?}", result.cleared);
        }
        self.record(SessionEventKind::FieldChanged { key: key.to_string(),
                                                     cleared: result.cleared.clone() });
    }

    /// Reemplaza una sección declarada. Devuelve `true` si cambió; un cambio
    /// invalida un `prepare_finalize` previo igual que un campo.
    pub fn set_section(&mut self, key: &str, value: Value) -> Result<bool, CoreEngineError> {
        self.ensure_editing()?;
        if !self.definition.has_section(key) {
            return Err(CoreEngineError::UnknownField(key.to_string()));
        }
        if self.session.sections.get(key) == Some(&value) {
            return Ok(false);
        }
        self.session.sections.insert(key.to_string(), value);
        self.finalize_ready = false;
        debug!("set_section key={key} session_id={}", self.session.id());
        self.record(SessionEventKind::SectionChanged { key: key.to_string() });
        Ok(true)
    }

    /// Carga una sección leída de un borrador al reanudar. No registra
    /// evento: el estado ya existía remotamente.
    pub fn restore_section(&mut self, key: &str, value: Value) -> Result<(), CoreEngineError> {
        self.ensure_editing()?;
        if !self.definition.has_section(key) {
            return Err(CoreEngineError::UnknownField(key.to_string()));
        }
        self.session.sections.insert(key.to_string(), value);
        Ok(())
    }

    /// Validación pura del paso actual. No toca `errors`.
    pub fn validate_current(&self) -> ValidationErrors { self.current_step().validate(&self.session.fields) }

    pub fn advance(&mut self) -> Result<StepOutcome, CoreEngineError> {
        self.ensure_editing()?;
        if self.is_last_step() {
            return Err(CoreEngineError::AtLastStep);
        }
        let definition = Arc::clone(&self.definition);
        let from = self.session.current_step;
        let step = definition.step_at(from);
        let errors = step.validate(&self.session.fields);
        self.session.errors = errors.clone();
        if !errors.is_empty() {
            debug!("advance:rejected step={} fields={:?}", step.id(), errors.fields());
            self.record(SessionEventKind::StepRejected { step_index: from,
                                                         step_id: step.id().to_string(),
                                                         fields: errors.fields() });
            return Ok(StepOutcome::Rejected(errors));
        }
        let to = definition.resolve_next(from, &self.session.fields)?;
        self.session.history.push(from);
        self.session.current_step = to;
        self.finalize_ready = false;
        let target = definition.step_at(to);
        self.record(SessionEventKind::StepAdvanced { from_index: from,
                                                     to_index: to,
                                                     step_id: target.id().to_string() });
        Ok(StepOutcome::Moved { from: step.id().to_string(),
                                to: target.id().to_string() })
    }

    /// Vuelve al paso visitado anterior. No revalida y limpia los errores
    /// del paso que se abandona.
    pub fn retreat(&mut self) -> Result<StepOutcome, CoreEngineError> {
        self.ensure_editing()?;
        let to = self.session.history.pop().ok_or(CoreEngineError::AtFirstStep)?;
        Ok(self.move_back(to))
    }

    /// Salta hacia atrás a un paso ya visitado (revisión no lineal).
    pub fn jump_back_to(&mut self, step_id: &str) -> Result<StepOutcome, CoreEngineError> {
        self.ensure_editing()?;
        let index = self.definition
                        .index_of(step_id)
                        .ok_or_else(|| CoreEngineError::UnknownStep(step_id.to_string()))?;
        let position = self.session
                           .history
                           .iter()
                           .position(|i| *i == index)
                           .ok_or_else(|| CoreEngineError::UnknownStep(step_id.to_string()))?;
        self.session.history.truncate(position);
        Ok(self.move_back(index))
    }

    fn move_back(&mut self, to: usize) -> StepOutcome {
        let from = self.session.current_step;
        self.session.current_step = to;
        self.session.errors.clear();
        self.finalize_ready = false;
        self.record(SessionEventKind::StepRetreated { from_index: from,
                                                      to_index: to });
        StepOutcome::Moved { from: self.definition.step_at(from).id().to_string(),
                             to: self.definition.step_at(to).id().to_string() }
    }

    /// Verificación de completitud previa al envío final: valida el último
    /// paso, los obligatorios de todo paso visitado y los chequeos extra del
    /// dominio. Sólo desde el último paso.
    pub fn prepare_finalize(&mut self, extra: &[&dyn CompletionCheck]) -> Result<FinalizeOutcome, CoreEngineError> {
        self.ensure_editing()?;
        if !self.is_last_step() {
            return Err(CoreEngineError::NotAtLastStep);
        }
        let definition = Arc::clone(&self.definition);
        let mut errors = self.validate_current();
        errors.merge(RequiredFieldsCheck.check(&definition, &self.session));
        for check in extra {
            let found = check.check(&definition, &self.session);
            if !found.is_empty() {
                debug!("prepare_finalize:check_failed check={} fields={:?}", check.name(), found.fields());
            }
            errors.merge(found);
        }
        self.session.errors = errors.clone();
        if errors.is_empty() {
            self.finalize_ready = true;
            return Ok(FinalizeOutcome::Ready);
        }
        self.finalize_ready = false;
        self.record(SessionEventKind::FinalizeRejected { fields: errors.fields() });
        Ok(FinalizeOutcome::Rejected(errors))
    }

    pub fn is_finalize_ready(&self) -> bool { self.finalize_ready && !self.session.is_submitted() }

    /// Marca la sesión como enviada. Exige un `prepare_finalize` exitoso sin
    /// cambios posteriores.
    pub fn complete(&mut self, record_id: impl Into<String>) -> Result<(), CoreEngineError> {
        self.ensure_editing()?;
        if !self.finalize_ready || !self.is_last_step() {
            return Err(CoreEngineError::FinalizeNotPrepared);
        }
        let record_id = record_id.into();
        self.session.status = SessionStatus::Submitted { record_id: record_id.clone() };
        self.finalize_ready = false;
        self.record(SessionEventKind::SessionFinalized { record_id: record_id.clone() });
        info!("session:finalized wizard={} session_id={} record_id={record_id}",
              self.definition.name(),
              self.session.id());
        Ok(())
    }

    /// Devuelve `true` si el id se asignó ahora.
    pub fn assign_remote_id(&mut self, id: RemoteId) -> Result<bool, CoreEngineError> { self.session.assign_remote_id(id) }

    pub fn record(&mut self, kind: SessionEventKind) -> SessionEvent { self.event_store.append_kind(self.session.id(), kind) }

    pub fn step_statuses(&self) -> Vec<(String, StepStatus)> {
        let furthest = self.session.visited().into_iter().max().unwrap_or(0);
        self.definition
            .steps()
            .enumerate()
            .map(|(i, step)| {
                let status = if i == self.session.current_step {
                    StepStatus::Active
                } else if self.session.history.contains(&i) {
                    StepStatus::Completed
                } else if i < furthest {
                    StepStatus::Skipped
                } else {
                    StepStatus::Pending
                };
                (step.id().to_string(), status)
            })
            .collect()
    }

    /// Descarta la sesión (cancelación). Devuelve el store de eventos.
    pub fn discard(self) -> E {
        debug!("session:discard session_id={} submitted={}",
               self.session.id(),
               self.session.is_submitted());
        self.event_store
    }
}
