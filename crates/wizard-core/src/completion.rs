//! Verificación de completitud previa al envío final.
//!
//! Los chequeos de dominio (p.ej. plan de acción por pregunta bloqueante) se
//! implementan fuera del core y se pasan explícitamente a
//! `WizardController::prepare_finalize`.

use crate::engine::{FormSession, WizardDefinition};
use crate::validation::ValidationErrors;

pub trait CompletionCheck: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self, definition: &WizardDefinition, session: &FormSession) -> ValidationErrors;
}

/// Revalida todos los pasos visitados. Los pasos saltados por una
/// bifurcación no cuentan.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredFieldsCheck;

impl CompletionCheck for RequiredFieldsCheck {
    fn name(&self) -> &str { "required_fields" }

    fn check(&self, definition: &WizardDefinition, session: &FormSession) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for index in session.visited() {
            if let Some(step) = definition.step(index) {
                errors.merge(step.validate(session.fields()));
            }
        }
        errors
    }
}
