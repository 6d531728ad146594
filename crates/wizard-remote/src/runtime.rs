//! Runtime asíncrono de una sesión de wizard.
//!
//! Une `WizardController` (síncrono, sin I/O) con un `DraftGateway`:
//! - `save_draft`: upsert idempotente. Los guardados se serializan con un
//!   lock, así dos guardados concurrentes nunca hacen dos `create`. Un
//!   borrador idéntico al último guardado se omite (fingerprint).
//! - `schedule_save` / `edit`: guardado con debounce cancel-and-reschedule.
//!   El payload se arma cuando el timer vence.
//! - `finalize`: chequeo de completitud → asegura id remoto → envío final →
//!   cierre de la sesión. Si el envío falla la sesión queda como estaba.
//!   Las ediciones verifican el flag de finalize con el lock del controlador
//!   tomado: una edición entra antes de `prepare_finalize` o es rechazada.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::Mutex;
use wizard_core::constants::{STATUS_CONCLUDED, STATUS_KEY};
use wizard_core::{draft_fingerprint, draft_payload, restore_fields, restore_sections, CoreEngineError, EventStore, FieldValue,
                  FinalSubmission, FinalizeOutcome, InMemoryEventStore, Permission, RemoteId, RequestContext,
                  SessionEventKind, SetResult, StepOutcome, ValidationErrors, WizardController, WizardDefinition};

use crate::attachments::{Attachment, Attachments, RegisteredAttachment};
use crate::debounce::Debouncer;
use crate::error::RemoteError;
use crate::gateway::DraftGateway;
use crate::notify::{Notice, Notifier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeResult {
    Finalized { record_id: String },
    /// Completitud no satisfecha; nada se envió.
    Rejected(ValidationErrors),
}

struct RuntimeInner<G, E: EventStore> {
    controller: Mutex<WizardController<E>>,
    gateway: Arc<G>,
    collection: String,
    ctx: RequestContext,
    notifier: Arc<dyn Notifier>,
    /// Serializa guardados. Contiene el fingerprint del último guardado exitoso.
    last_saved: Mutex<Option<String>>,
    finalizing: AtomicBool,
}

impl<G: DraftGateway, E: EventStore> RuntimeInner<G, E> {
    async fn save_draft(&self) -> Result<RemoteId, RemoteError> {
        self.ctx.require(Permission::SaveDraft)?;
        let mut last_saved = self.last_saved.lock().await;
        let (remote_id, payload) = {
            let c = self.controller.lock().await;
            if c.session().is_submitted() {
                return Err(CoreEngineError::SessionSubmitted.into());
            }
            (c.session().remote_id().cloned(), draft_payload(c.definition(), c.session()))
        };
        let fingerprint = draft_fingerprint(&payload);
        if let Some(id) = &remote_id {
            if last_saved.as_deref() == Some(fingerprint.as_str()) {
                debug!("save_draft:unchanged collection={} remote_id={id}", self.collection);
                return Ok(id.clone());
            }
        }

        let result = match &remote_id {
            None => self.gateway.create_draft(&self.collection, &payload).await.map(|id| (id, true)),
            Some(id) => self.gateway
                            .update_draft(&self.collection, id, &payload)
                            .await
                            .map(|()| (id.clone(), false)),
        };

        let mut c = self.controller.lock().await;
        match result {
            Ok((id, created)) => {
                c.assign_remote_id(id.clone())?;
                c.record(SessionEventKind::DraftSaved { remote_id: id.to_string(),
                                                        fingerprint: fingerprint.clone(),
                                                        created });
                debug!("save_draft:ok collection={} remote_id={id} created={created}", self.collection);
                *last_saved = Some(fingerprint);
                Ok(id)
            }
            Err(e) => {
                warn!("save_draft:failed collection={} error={e}", self.collection);
                c.record(SessionEventKind::DraftSaveFailed { reason: e.to_string() });
                drop(c);
                self.notifier
                    .notify(Notice::warning("Não foi possível salvar o rascunho; será tentado novamente"));
                Err(e)
            }
        }
    }
}

pub struct WizardRuntime<G, E = InMemoryEventStore>
    where G: DraftGateway + 'static,
          E: EventStore + 'static
{
    inner: Arc<RuntimeInner<G, E>>,
    debouncer: Debouncer,
}

impl<G, E> WizardRuntime<G, E>
    where G: DraftGateway + 'static,
          E: EventStore + 'static
{
    pub fn new(controller: WizardController<E>,
               gateway: Arc<G>,
               collection: &str,
               ctx: RequestContext,
               notifier: Arc<dyn Notifier>,
               debounce: Duration)
               -> Self {
        Self::build(controller, gateway, collection, ctx, notifier, debounce, None)
    }

    fn build(controller: WizardController<E>,
             gateway: Arc<G>,
             collection: &str,
             ctx: RequestContext,
             notifier: Arc<dyn Notifier>,
             debounce: Duration,
             last_saved: Option<String>)
             -> Self {
        let inner = RuntimeInner { controller: Mutex::new(controller),
                                   gateway,
                                   collection: collection.to_string(),
                                   ctx,
                                   notifier,
                                   last_saved: Mutex::new(last_saved),
                                   finalizing: AtomicBool::new(false) };
        Self { inner: Arc::new(inner),
               debouncer: Debouncer::new(debounce) }
    }

    /// Reanuda un borrador remoto: lo carga, restaura campos, secciones y
    /// paso, y lo toma como último guardado.
    #[allow(clippy::too_many_arguments)]
    pub async fn resume(definition: Arc<WizardDefinition>,
                        event_store: E,
                        gateway: Arc<G>,
                        collection: &str,
                        remote_id: RemoteId,
                        ctx: RequestContext,
                        notifier: Arc<dyn Notifier>,
                        debounce: Duration)
                        -> Result<Self, RemoteError> {
        let payload = gateway.load_draft(collection, &remote_id).await?;
        if payload.get(STATUS_KEY).and_then(|v| v.as_str()) == Some(STATUS_CONCLUDED) {
            return Err(CoreEngineError::SessionSubmitted.into());
        }
        let (fields, step) = restore_fields(&definition, &payload);
        let sections = restore_sections(&definition, &payload);
        let mut controller = WizardController::resume(definition, event_store, remote_id, fields, step.as_deref())?;
        for (key, value) in sections {
            controller.restore_section(&key, value)?;
        }
        let baseline = draft_fingerprint(&draft_payload(controller.definition(), controller.session()));
        Ok(Self::build(controller, gateway, collection, ctx, notifier, debounce, Some(baseline)))
    }

    pub fn context(&self) -> &RequestContext { &self.inner.ctx }

    pub fn collection(&self) -> &str { &self.inner.collection }

    pub fn gateway(&self) -> &G { &self.inner.gateway }

    pub fn notifier(&self) -> Arc<dyn Notifier> { Arc::clone(&self.inner.notifier) }

    fn ensure_not_finalizing(&self) -> Result<(), CoreEngineError> {
        if self.inner.finalizing.load(Ordering::SeqCst) {
            return Err(CoreEngineError::FinalizeInProgress);
        }
        Ok(())
    }

    /// Acceso de lectura al controlador.
    pub async fn read<R>(&self, f: impl FnOnce(&WizardController<E>) -> R) -> R {
        let c = self.inner.controller.lock().await;
        f(&c)
    }

    /// Acceso de escritura (p.ej. para un `Conversation`). Bloqueado durante
    /// finalize; el flag se lee con el lock tomado.
    pub async fn update<R>(&self, f: impl FnOnce(&mut WizardController<E>) -> R) -> Result<R, CoreEngineError> {
        let mut c = self.inner.controller.lock().await;
        self.ensure_not_finalizing()?;
        Ok(f(&mut c))
    }

    pub async fn set_field(&self, key: &str, value: FieldValue) -> Result<SetResult, CoreEngineError> {
        self.update(|c| c.set_field(key, value)).await?
    }

    /// `set_field` + guardado con debounce si el borrador ya existe remotamente.
    pub async fn edit(&self, key: &str, value: FieldValue) -> Result<SetResult, CoreEngineError> {
        let result = self.set_field(key, value).await?;
        let has_remote = self.read(|c| c.session().remote_id().is_some()).await;
        if result.changed && has_remote {
            self.schedule_save();
        }
        Ok(result)
    }

    /// Programa un guardado con debounce. Requiere runtime de tokio.
    pub fn schedule_save(&self) {
        let inner = Arc::clone(&self.inner);
        self.debouncer.schedule(move || async move {
                          if let Err(e) = inner.save_draft().await {
                              debug!("scheduled save failed: {e}");
                          }
                      });
    }

    /// Espera al guardado programado, si lo hay.
    pub async fn flush(&self) { self.debouncer.flush().await }

    pub async fn save_draft(&self) -> Result<RemoteId, RemoteError> { self.inner.save_draft().await }

    pub async fn advance(&self) -> Result<StepOutcome, CoreEngineError> { self.update(|c| c.advance()).await? }

    pub async fn retreat(&self) -> Result<StepOutcome, CoreEngineError> { self.update(|c| c.retreat()).await? }

    pub async fn finalize(&self, submission: &dyn FinalSubmission) -> Result<FinalizeResult, RemoteError> {
        self.inner.ctx.require(Permission::Finalize)?;
        if self.inner.finalizing.swap(true, Ordering::SeqCst) {
            return Err(CoreEngineError::FinalizeInProgress.into());
        }
        let result = self.finalize_exclusive(submission).await;
        self.inner.finalizing.store(false, Ordering::SeqCst);
        result
    }

    async fn finalize_exclusive(&self, submission: &dyn FinalSubmission) -> Result<FinalizeResult, RemoteError> {
        let inner = &self.inner;
        let checks = submission.checks();
        {
            let mut c = inner.controller.lock().await;
            if let FinalizeOutcome::Rejected(errors) = c.prepare_finalize(&checks)? {
                inner.notifier
                     .notify(Notice::blocking(format!("Pendências antes de finalizar: {}",
                                                      errors.fields().join(", "))));
                return Ok(FinalizeResult::Rejected(errors));
            }
        }

        self.debouncer.cancel();
        let id = match inner.save_draft().await {
            Ok(id) => id,
            Err(e) => {
                error!("finalize:draft_failed collection={} error={e}", inner.collection);
                inner.notifier.notify(Notice::blocking(format!("Falha ao finalizar: {e}")));
                return Err(e);
            }
        };

        let payload = {
            let c = inner.controller.lock().await;
            submission.final_payload(c.definition(), c.session())
        };
        match inner.gateway.finalize(&inner.collection, &id, &payload).await {
            Ok(record_id) => {
                let completed = inner.controller.lock().await.complete(record_id.clone());
                if let Err(e) = completed {
                    error!("finalize:local_close_failed collection={} record_id={record_id} error={e}",
                           inner.collection);
                    return Err(e.into());
                }
                info!("finalize:ok collection={} record_id={record_id}", inner.collection);
                inner.notifier.notify(Notice::info("Registro finalizado"));
                Ok(FinalizeResult::Finalized { record_id })
            }
            Err(e) => {
                error!("finalize:failed collection={} remote_id={id} error={e}", inner.collection);
                inner.notifier.notify(Notice::blocking(format!("Falha ao finalizar: {e}")));
                Err(e)
            }
        }
    }

    /// Adjunta un archivo al borrador (lo crea remotamente si hace falta).
    pub async fn attach(&self, attachments: &Attachments, file: Attachment) -> Result<RegisteredAttachment, RemoteError> {
        let id = self.save_draft().await?;
        attachments.attach(&self.inner.ctx, &self.inner.collection, &id, file).await
    }

    /// Cancela guardados pendientes y descarta la sesión local.
    pub fn discard(self) {
        self.debouncer.cancel();
        debug!("runtime:discard collection={}", self.inner.collection);
    }
}
