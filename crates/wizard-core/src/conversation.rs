//! Conducción conversacional del wizard: pregunta campo por campo, interpreta
//! respuestas de texto y avanza cuando el paso queda respondido.
//!
//! Cada campo del paso se pregunta una vez; los que fallan la validación se
//! vuelven a preguntar. Una respuesta vacía deja el campo sin valor.

use std::collections::BTreeSet;

use crate::engine::{StepOutcome, WizardController};
use crate::errors::CoreEngineError;
use crate::event::EventStore;
use crate::model::{FieldKind, FieldValue};
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub field: String,
    pub label: String,
    pub kind: FieldKind,
    /// Mensaje del último rechazo, si lo hubo.
    pub error: Option<String>,
    pub current: Option<FieldValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// Quedan preguntas en el paso actual.
    Continue,
    Advanced { to: String },
    Rejected(ValidationErrors),
    /// Último paso respondido; el llamador decide finalizar.
    ReadyToFinalize,
    /// La respuesta no se pudo interpretar; el campo no cambió.
    InvalidInput { field: String, reason: String },
}

#[derive(Debug, Default)]
pub struct Conversation {
    step: Option<usize>,
    asked: BTreeSet<String>,
    to_fix: ValidationErrors,
}

impl Conversation {
    pub fn new() -> Self { Self::default() }

    fn sync(&mut self, step: usize) {
        if self.step != Some(step) {
            self.step = Some(step);
            self.asked.clear();
            self.to_fix.clear();
        }
    }

    pub fn next_prompt<E: EventStore>(&mut self, controller: &WizardController<E>) -> Option<Prompt> {
        if controller.session().is_submitted() {
            return None;
        }
        self.sync(controller.session().current_step());
        controller.current_step()
                  .fields()
                  .iter()
                  .find(|f| self.to_fix.contains(&f.key) || !self.asked.contains(&f.key))
                  .map(|f| Prompt { field: f.key.clone(),
                                    label: f.label.clone(),
                                    kind: f.kind.clone(),
                                    error: self.to_fix.get(&f.key).map(str::to_string),
                                    current: controller.get(&f.key).cloned() })
    }

    /// Aplica una respuesta. Si el paso queda respondido intenta avanzar.
    pub fn answer<E: EventStore>(&mut self,
                                 controller: &mut WizardController<E>,
                                 field: &str,
                                 raw: &str)
                                 -> Result<Turn, CoreEngineError> {
        self.sync(controller.session().current_step());
        let kind = controller.definition()
                             .field_spec(field)
                             .map(|(_, spec)| spec.kind.clone())
                             .ok_or_else(|| CoreEngineError::UnknownField(field.to_string()))?;
        let raw = raw.trim();
        let result = if raw.is_empty() {
            controller.clear_field(field)?
        } else {
            match parse_answer(&kind, raw) {
                Ok(value) => controller.set_field(field, value)?,
                Err(reason) => {
                    return Ok(Turn::InvalidInput { field: field.to_string(),
                                                   reason })
                }
            }
        };
        self.asked.insert(field.to_string());
        self.to_fix.remove(field);
        for cleared in &result.cleared {
            self.asked.remove(cleared);
        }
        if self.next_prompt(controller).is_some() {
            return Ok(Turn::Continue);
        }
        self.proceed(controller)
    }

    /// Intenta cerrar el paso actual: avanza o, en el último paso, indica
    /// que se puede finalizar.
    pub fn proceed<E: EventStore>(&mut self, controller: &mut WizardController<E>) -> Result<Turn, CoreEngineError> {
        if controller.is_last_step() {
            let errors = controller.validate_current();
            if errors.is_empty() {
                return Ok(Turn::ReadyToFinalize);
            }
            self.to_fix = errors.clone();
            return Ok(Turn::Rejected(errors));
        }
        match controller.advance()? {
            StepOutcome::Moved { to, .. } => Ok(Turn::Advanced { to }),
            StepOutcome::Rejected(errors) => {
                self.to_fix = errors.clone();
                Ok(Turn::Rejected(errors))
            }
        }
    }

    /// Reabre los campos del paso actual rechazados por un intento de envío.
    pub fn reopen(&mut self, errors: &ValidationErrors) {
        for (field, message) in errors.iter() {
            self.to_fix.insert(field, message);
        }
    }
}

/// Interpreta texto libre según el tipo del campo.
pub fn parse_answer(kind: &FieldKind, raw: &str) -> Result<FieldValue, String> {
    let raw = raw.trim();
    match kind {
        FieldKind::Text => Ok(FieldValue::text(raw)),
        FieldKind::Flag => match raw.to_lowercase().as_str() {
            "s" | "sim" | "y" | "yes" | "true" | "1" => Ok(FieldValue::flag(true)),
            "n" | "nao" | "não" | "no" | "false" | "0" => Ok(FieldValue::flag(false)),
            _ => Err("responda sim ou não".to_string()),
        },
        FieldKind::Choice(options) if options.is_empty() => Ok(FieldValue::choice(raw)),
        FieldKind::Choice(options) => {
            if let Ok(position) = raw.parse::<usize>() {
                if let Some(option) = position.checked_sub(1).and_then(|i| options.get(i)) {
                    return Ok(FieldValue::choice(option.clone()));
                }
            }
            options.iter()
                   .find(|o| o.eq_ignore_ascii_case(raw))
                   .map(|o| FieldValue::choice(o.clone()))
                   .ok_or_else(|| format!("opções: {}", options.join(", ")))
        }
        FieldKind::Id => raw.parse::<i64>().map(FieldValue::Id).map_err(|_| "informe um número".to_string()),
        FieldKind::IdList => raw.split(|c: char| c == ',' || c.is_whitespace())
                                .filter(|part| !part.is_empty())
                                .map(|part| part.parse::<i64>().map_err(|_| format!("id inválido: {part}")))
                                .collect::<Result<Vec<_>, _>>()
                                .map(FieldValue::IdList),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_answers_by_kind() {
        assert_eq!(parse_answer(&FieldKind::Flag, "Sim"), Ok(FieldValue::flag(true)));
        assert_eq!(parse_answer(&FieldKind::IdList, "1, 2 3"), Ok(FieldValue::IdList(vec![1, 2, 3])));
        let choice = FieldKind::Choice(vec!["C".into(), "NC".into(), "NA".into()]);
        assert_eq!(parse_answer(&choice, "2"), Ok(FieldValue::choice("NC")));
        assert_eq!(parse_answer(&choice, "na"), Ok(FieldValue::choice("NA")));
        assert!(parse_answer(&choice, "talvez").is_err());
        assert!(parse_answer(&FieldKind::Id, "abc").is_err());
    }
}
