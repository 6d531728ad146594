//! Tipos de evento de una sesión de wizard.
//!
//! El controlador emite un evento por cada transición observable. El log es
//! append-only y alcanza para reconstruir un resumen de la sesión
//! (`replay_summary`) sin mirar estructuras mutables.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEventKind {
    /// Primer evento de toda sesión nueva.
    SessionStarted { definition_hash: String, step_count: usize },
    /// Sesión reconstruida desde un borrador remoto.
    SessionResumed { definition_hash: String, remote_id: String, step_index: usize },
    /// Un campo cambió; `cleared` lista los dependientes reiniciados.
    FieldChanged { key: String, cleared: Vec<String> },
    /// Una sección del borrador fue reemplazada.
    SectionChanged { key: String },
    StepAdvanced { from_index: usize, to_index: usize, step_id: String },
    /// Avance bloqueado por validación. Sólo se registran las claves.
    StepRejected { step_index: usize, step_id: String, fields: Vec<String> },
    StepRetreated { from_index: usize, to_index: usize },
    /// Borrador persistido. `created` indica la primera escritura remota.
    DraftSaved { remote_id: String, fingerprint: String, created: bool },
    DraftSaveFailed { reason: String },
    FinalizeRejected { fields: Vec<String> },
    /// Cierre de la sesión. Invariante: último evento de la sesión.
    SessionFinalized { record_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub seq: u64, // asignado por el store (orden append)
    pub session_id: Uuid,
    pub kind: SessionEventKind,
    pub ts: DateTime<Utc>,
}
