//! Reconstrucción de un resumen de sesión a partir de su log de eventos.

use super::{SessionEvent, SessionEventKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub current_step: usize,
    pub remote_id: Option<String>,
    pub record_id: Option<String>,
    pub drafts_saved: u32,
    pub draft_failures: u32,
    pub rejected_advances: u32,
    pub fields_changed: u32,
    pub sections_changed: u32,
}

impl SessionSummary {
    pub fn is_finalized(&self) -> bool { self.record_id.is_some() }
}

/// Aplica los eventos en orden de `seq`.
pub fn replay_summary(events: &[SessionEvent]) -> SessionSummary {
    let mut ordered: Vec<&SessionEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.seq);
    let mut summary = SessionSummary::default();
    for ev in ordered {
        match &ev.kind {
            SessionEventKind::SessionStarted { .. } => {}
            SessionEventKind::SessionResumed { remote_id, step_index, .. } => {
                summary.remote_id = Some(remote_id.clone());
                summary.current_step = *step_index;
            }
            SessionEventKind::FieldChanged { .. } => summary.fields_changed += 1,
            SessionEventKind::SectionChanged { .. } => summary.sections_changed += 1,
            SessionEventKind::StepAdvanced { to_index, .. } => summary.current_step = *to_index,
            SessionEventKind::StepRejected { .. } => summary.rejected_advances += 1,
            SessionEventKind::StepRetreated { to_index, .. } => summary.current_step = *to_index,
            SessionEventKind::DraftSaved { remote_id, .. } => {
                summary.drafts_saved += 1;
                summary.remote_id.get_or_insert_with(|| remote_id.clone());
            }
            SessionEventKind::DraftSaveFailed { .. } => summary.draft_failures += 1,
            SessionEventKind::FinalizeRejected { .. } => {}
            SessionEventKind::SessionFinalized { record_id } => summary.record_id = Some(record_id.clone()),
        }
    }
    summary
}
