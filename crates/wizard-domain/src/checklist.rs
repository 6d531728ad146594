//! Checklist de inspección: preguntas, respuestas y planes de acción.
//!
//! Invariante de cierre: toda pregunta bloqueante respondida como no conforme
//! necesita al menos un `ActionItem` antes de finalizar la ejecución. Se
//! verifica sólo al finalizar, vía `BlockingActionPlanCheck`.
//!
//! Los planes se guardan como lista JSON en la sección `planos_acao` de la
//! sesión, de modo que el borrador remoto los conserva.

use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wizard_core::{CompletionCheck, CoreEngineError, EventStore, FieldStore, FormSession, ValidationErrors,
                  WizardController, WizardDefinition};

use crate::errors::DomainError;

pub const ANSWER_FIELD_PREFIX: &str = "resposta_";

/// Sección de la sesión que guarda los planes de acción.
pub const ACTION_PLANS_SECTION: &str = "planos_acao";

pub const MISSING_ACTION_PLAN_MESSAGE: &str = "Pergunta bloqueante não conforme exige plano de ação";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub texto: String,
    pub bloqueante: bool,
}

impl Question {
    pub fn new(id: i64, texto: &str, bloqueante: bool) -> Self {
        Self { id,
               texto: texto.to_string(),
               bloqueante }
    }

    pub fn answer_field(&self) -> String { answer_field(self.id) }

    /// Lee una pregunta de un registro remoto o de archivo. El id puede venir
    /// como número o como texto; sin `bloqueante` la pregunta no bloquea.
    pub fn from_json(value: &Value) -> Option<Self> {
        let id = match value.get("id")? {
            Value::Number(n) => n.as_i64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        let texto = value.get("texto").and_then(Value::as_str)?;
        let bloqueante = value.get("bloqueante").and_then(Value::as_bool).unwrap_or(false);
        Some(Self::new(id, texto, bloqueante))
    }
}

pub fn answer_field(question_id: i64) -> String { format!("{ANSWER_FIELD_PREFIX}{question_id}") }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    #[serde(rename = "C")] Conforme,
    #[serde(rename = "NC")] NaoConforme,
    #[serde(rename = "NA")] NaoAplicavel,
}

impl Answer {
    pub const CODES: [&'static str; 3] = ["C", "NC", "NA"];

    pub fn code(self) -> &'static str {
        match self {
            Answer::Conforme => "C",
            Answer::NaoConforme => "NC",
            Answer::NaoAplicavel => "NA",
        }
    }

    pub fn parse(code: &str) -> Result<Self, DomainError> {
        match code.trim().to_ascii_uppercase().as_str() {
            "C" => Ok(Answer::Conforme),
            "NC" => Ok(Answer::NaoConforme),
            "NA" => Ok(Answer::NaoAplicavel),
            other => Err(DomainError::InvalidAnswer(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Baixa,
    Media,
    Alta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pendente,
    EmAndamento,
    Concluida,
}

/// Plan de acción asociado a una pregunta no conforme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub pergunta_id: i64,
    pub descricao_desvio: String,
    pub o_que_fazer: String,
    pub como_fazer: String,
    pub responsavel_id: i64,
    pub prazo: NaiveDate,
    pub prioridade: Priority,
    pub status: ActionStatus,
}

impl ActionItem {
    /// Textos obligatorios y plazo no anterior a `today`.
    pub fn validate(&self, today: NaiveDate) -> Result<(), DomainError> {
        let texts = [("descricao_desvio", &self.descricao_desvio),
                     ("o_que_fazer", &self.o_que_fazer),
                     ("como_fazer", &self.como_fazer)];
        if let Some((field, _)) = texts.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(DomainError::InvalidActionItem { field: *field,
                                                        reason: "must not be blank".to_string() });
        }
        if self.prazo < today {
            return Err(DomainError::InvalidActionItem { field: "prazo",
                                                        reason: format!("{} is before {today}", self.prazo) });
        }
        Ok(())
    }
}

/// Preguntas del checklist. Los planes de acción viven en la sesión, en la
/// sección `planos_acao`, para que viajen con el borrador y sobrevivan a un
/// resume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectionChecklist {
    questions: Vec<Question>,
}

impl InspectionChecklist {
    pub fn new(questions: Vec<Question>) -> Self { Self { questions } }

    pub fn questions(&self) -> &[Question] { &self.questions }

    pub fn question(&self, id: i64) -> Option<&Question> { self.questions.iter().find(|q| q.id == id) }

    pub fn add_action_item<E>(&self,
                              controller: &mut WizardController<E>,
                              item: ActionItem,
                              today: NaiveDate)
                              -> Result<(), DomainError>
        where E: EventStore
    {
        if self.question(item.pergunta_id).is_none() {
            return Err(DomainError::UnknownQuestion(item.pergunta_id));
        }
        item.validate(today)?;
        debug!("action_item:add pergunta_id={} responsavel_id={}", item.pergunta_id, item.responsavel_id);
        let mut items = action_items(controller.session());
        items.push(item);
        store_items(controller, &items)
    }

    /// Quita el plan `index` (orden de alta) de la pregunta.
    pub fn remove_action_item<E>(&self,
                                 controller: &mut WizardController<E>,
                                 question_id: i64,
                                 index: usize)
                                 -> Result<ActionItem, DomainError>
        where E: EventStore
    {
        let mut items = action_items(controller.session());
        let position = items.iter()
                            .enumerate()
                            .filter(|(_, i)| i.pergunta_id == question_id)
                            .nth(index)
                            .map(|(pos, _)| pos)
                            .ok_or(DomainError::UnknownActionItem { question_id, index })?;
        debug!("action_item:remove pergunta_id={question_id} index={index}");
        let removed = items.remove(position);
        store_items(controller, &items)?;
        Ok(removed)
    }

    pub fn items_for(&self, session: &FormSession, question_id: i64) -> Vec<ActionItem> {
        action_items(session).into_iter().filter(|i| i.pergunta_id == question_id).collect()
    }

    /// Respuesta registrada en el store para una pregunta.
    pub fn answer_of(&self, fields: &FieldStore, question_id: i64) -> Option<Answer> {
        fields.get(&answer_field(question_id))
              .and_then(|v| v.as_text())
              .and_then(|code| Answer::parse(code).ok())
    }

    /// Preguntas respondidas como no conformes (desvíos), en orden.
    pub fn deviations(&self, fields: &FieldStore) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| self.answer_of(fields, q.id) == Some(Answer::NaoConforme))
            .collect()
    }

    pub fn blocking_check(&self) -> BlockingActionPlanCheck<'_> { BlockingActionPlanCheck { checklist: self } }
}

/// Planes de acción guardados en la sesión. Una sección ilegible cuenta como
/// vacía.
pub fn action_items(session: &FormSession) -> Vec<ActionItem> {
    let Some(raw) = session.section(ACTION_PLANS_SECTION) else {
        return Vec::new();
    };
    serde_json::from_value(raw.clone()).unwrap_or_else(|e| {
                                           warn!("action_item:unreadable_section error={e}");
                                           Vec::new()
                                       })
}

fn store_items<E: EventStore>(controller: &mut WizardController<E>, items: &[ActionItem]) -> Result<(), DomainError> {
    let value = serde_json::to_value(items).map_err(|e| DomainError::Core(CoreEngineError::Internal(e.to_string())))?;
    controller.set_section(ACTION_PLANS_SECTION, value)?;
    Ok(())
}

/// Exige ≥1 plan de acción por pregunta bloqueante no conforme. El error se
/// reporta sobre el campo de respuesta de la pregunta.
#[derive(Debug, Clone, Copy)]
pub struct BlockingActionPlanCheck<'a> {
    checklist: &'a InspectionChecklist,
}

impl CompletionCheck for BlockingActionPlanCheck<'_> {
    fn name(&self) -> &str { "blocking_action_plan" }

    fn check(&self, _definition: &WizardDefinition, session: &FormSession) -> ValidationErrors {
        let items = action_items(session);
        self.checklist
            .deviations(session.fields())
            .into_iter()
            .filter(|q| q.bloqueante && !items.iter().any(|i| i.pergunta_id == q.id))
            .map(|q| (q.answer_field(), MISSING_ACTION_PLAN_MESSAGE.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(pergunta_id: i64) -> ActionItem {
        ActionItem { pergunta_id,
                     descricao_desvio: "Guarda-corpo solto".into(),
                     o_que_fazer: "Fixar".into(),
                     como_fazer: "Parafusos novos".into(),
                     responsavel_id: 5,
                     prazo: NaiveDate::from_ymd_opt(2030, 1, 10).expect("date"),
                     prioridade: Priority::Alta,
                     status: ActionStatus::Pendente }
    }

    fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2030, 1, 1).expect("date") }

    #[test]
    fn action_item_validation() {
        assert!(item(1).validate(today()).is_ok());
        let mut blank = item(1);
        blank.o_que_fazer = "  ".into();
        assert!(matches!(blank.validate(today()), Err(DomainError::InvalidActionItem { field: "o_que_fazer", .. })));
        let mut late = item(1);
        late.prazo = NaiveDate::from_ymd_opt(2029, 12, 31).expect("date");
        assert!(matches!(late.validate(today()), Err(DomainError::InvalidActionItem { field: "prazo", .. })));
    }

    #[test]
    fn add_and_remove_items() {
        let questions = vec![Question::new(1, "EPI em uso?", true)];
        let checklist = InspectionChecklist::new(questions.clone());
        let def = crate::wizards::inspection::definition(&questions).expect("definition");
        let mut c = WizardController::new(std::sync::Arc::new(def), wizard_core::InMemoryEventStore::default());
        assert_eq!(checklist.add_action_item(&mut c, item(2), today()), Err(DomainError::UnknownQuestion(2)));
        checklist.add_action_item(&mut c, item(1), today()).expect("add");
        assert_eq!(checklist.items_for(c.session(), 1).len(), 1);
        assert!(c.session().section(ACTION_PLANS_SECTION).is_some());
        checklist.remove_action_item(&mut c, 1, 0).expect("remove");
        assert!(checklist.items_for(c.session(), 1).is_empty());
        assert!(checklist.remove_action_item(&mut c, 1, 0).is_err());
    }

    #[test]
    fn questions_read_from_loose_records() {
        let q = Question::from_json(&serde_json::json!({"id": "12", "texto": "Andaime liberado?", "bloqueante": true}));
        assert_eq!(q, Some(Question::new(12, "Andaime liberado?", true)));
        let q = Question::from_json(&serde_json::json!({"id": 3, "texto": "Área limpa?"}));
        assert_eq!(q.map(|q| q.bloqueante), Some(false));
        assert_eq!(Question::from_json(&serde_json::json!({"id": "x", "texto": "?"})), None);
        assert_eq!(Question::from_json(&serde_json::json!({"id": 4})), None);
    }

    #[test]
    fn answers_parse_codes() {
        assert_eq!(Answer::parse("nc"), Ok(Answer::NaoConforme));
        assert!(Answer::parse("x").is_err());
        assert_eq!(Answer::NaoAplicavel.code(), "NA");
    }
}
