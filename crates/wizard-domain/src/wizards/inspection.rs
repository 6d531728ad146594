//! Execução de inspeção.
//!
//! local → participantes → perguntas → finalizar. El paso `perguntas` se arma
//! a partir del checklist: un campo `resposta_<id>` (C/NC/NA) por pregunta.
//! Los planes de acción viajan en la sección `planos_acao` del borrador. El
//! envío final agrupa los desvíos con sus planes y el nombre del responsable.

use serde_json::{json, Map, Value};
use wizard_core::constants::{STATUS_CONCLUDED, STATUS_KEY};
use wizard_core::{visited_fields, CompletionCheck, CoreEngineError, FieldSpec, FinalSubmission, FormSession, FormStep,
                  WizardDefinition};

use crate::checklist::{ActionItem, Answer, BlockingActionPlanCheck, InspectionChecklist, Question, ACTION_PLANS_SECTION,
                       ANSWER_FIELD_PREFIX};
use crate::option::ReferenceOption;

pub const NAME: &str = "inspecao";
pub const COLLECTION: &str = "execucoes_inspecao";
/// Catálogo remoto de perguntas do checklist.
pub const QUESTIONS_COLLECTION: &str = "perguntas_checklist";

pub fn definition(questions: &[Question]) -> Result<WizardDefinition, CoreEngineError> {
    let answers = questions.iter().map(|q| {
                                      FieldSpec::choice(&q.answer_field(), &q.texto, &Answer::CODES).required()
                                  });
    WizardDefinition::builder(NAME)
        .first_step(FormStep::new("local", "Local").with_field(FieldSpec::text("data_inspecao", "Data").required())
                                                   .with_field(FieldSpec::id("local_instalacao_id", "Local").required())
                                                   .with_field(FieldSpec::text("area", "Área")))
        .add_step(FormStep::new("participantes", "Participantes")
            .with_field(FieldSpec::id_list("participantes_ids", "Participantes").required()))
        .add_step(FormStep::new("perguntas", "Perguntas").with_fields(answers))
        .add_step(FormStep::new("finalizar", "Finalizar").with_field(FieldSpec::text("observacoes", "Observações")))
        .section(ACTION_PLANS_SECTION)
        .build()
}

/// Envío final de una ejecución: respuestas + desvíos con planes de acción.
pub struct InspectionSubmission<'a> {
    checklist: &'a InspectionChecklist,
    users: &'a [ReferenceOption],
    check: BlockingActionPlanCheck<'a>,
}

impl<'a> InspectionSubmission<'a> {
    pub fn new(checklist: &'a InspectionChecklist, users: &'a [ReferenceOption]) -> Self {
        Self { checklist,
               users,
               check: checklist.blocking_check() }
    }

    fn user_name(&self, id: i64) -> Option<&str> {
        self.users.iter().find(|u| u.id_as_i64() == Some(id)).map(|u| u.label.as_str())
    }

    fn action_plan(&self, item: &ActionItem) -> Value {
        json!({
            "descricao_desvio": item.descricao_desvio,
            "o_que_fazer": item.o_que_fazer,
            "como_fazer": item.como_fazer,
            "responsavel_id": item.responsavel_id,
            "responsavel_nome": self.user_name(item.responsavel_id),
            "prazo": item.prazo.to_string(),
            "prioridade": item.prioridade,
            "status": item.status,
        })
    }
}

impl FinalSubmission for InspectionSubmission<'_> {
    fn checks(&self) -> Vec<&dyn CompletionCheck> {
        let check: &dyn CompletionCheck = &self.check;
        vec![check]
    }

    fn final_payload(&self, definition: &WizardDefinition, session: &FormSession) -> Value {
        let fields = session.fields();
        let mut map: Map<String, Value> = visited_fields(definition, session).into_iter()
                                                                             .filter(|(key, _)| {
                                                                                 !key.starts_with(ANSWER_FIELD_PREFIX)
                                                                             })
                                                                             .collect();
        let respostas: Vec<Value> =
            self.checklist
                .questions()
                .iter()
                .filter_map(|q| {
                    self.checklist
                        .answer_of(fields, q.id)
                        .map(|a| json!({"pergunta_id": q.id, "resposta": a.code()}))
                })
                .collect();
        let desvios: Vec<Value> = self.checklist
                                      .deviations(fields)
                                      .into_iter()
                                      .map(|q| {
                                          let planos: Vec<Value> =
                                              self.checklist
                                                  .items_for(session, q.id)
                                                  .iter()
                                                  .map(|i| self.action_plan(i))
                                                  .collect();
                                          json!({
                                              "pergunta_id": q.id,
                                              "pergunta": q.texto,
                                              "bloqueante": q.bloqueante,
                                              "planos_acao": planos,
                                          })
                                      })
                                      .collect();
        map.insert("respostas".to_string(), Value::from(respostas));
        map.insert("desvios".to_string(), Value::from(desvios));
        map.insert(STATUS_KEY.to_string(), Value::from(STATUS_CONCLUDED));
        Value::Object(map)
    }
}
