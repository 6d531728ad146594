use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use safety_wizard::wizard_core::{replay_summary, FieldValue, InMemoryEventStore, RequestContext, StepOutcome};
use safety_wizard::wizard_domain::checklist::MISSING_ACTION_PLAN_MESSAGE;
use safety_wizard::wizard_domain::wizards::{incident, inspection};
use safety_wizard::wizard_domain::{ActionItem, ActionStatus, InspectionChecklist, InspectionSubmission, Priority,
                                   Question, ReferenceOption};
use safety_wizard::wizard_remote::{CollectingNotifier, FinalizeResult, WizardRuntime};
use safety_wizard::{offline_session, OfflineSession};

fn ctx() -> RequestContext { RequestContext::new("tecnico-3", "obra-norte").with_all_permissions() }

async fn set(session: &OfflineSession, key: &str, value: FieldValue) {
    session.runtime.set_field(key, value).await.expect("set field");
}

async fn advance(session: &OfflineSession) {
    let outcome = session.runtime.advance().await.expect("advance");
    assert!(matches!(outcome, StepOutcome::Moved { .. }), "unexpected {outcome:?}");
}

#[tokio::test]
async fn incident_resolved_on_the_spot_skips_action_plan() {
    let session = offline_session(incident::definition().expect("definition"), incident::COLLECTION, ctx());

    set(&session, "area", FieldValue::text("Pátio de cargas")).await;
    set(&session, "atividade", FieldValue::text("Movimentação de bobinas")).await;
    set(&session, "contrato_id", FieldValue::Id(7)).await;
    set(&session, "letra_id", FieldValue::Id(71)).await;
    set(&session, "contrato_id", FieldValue::Id(8)).await;
    assert_eq!(session.runtime.read(|c| c.get("letra_id").cloned()).await, None);
    set(&session, "letra_id", FieldValue::Id(81)).await;
    advance(&session).await;
    let draft_id = session.runtime.save_draft().await.expect("draft");

    set(&session, "paralisacao_realizada", FieldValue::flag(false)).await;
    advance(&session).await;
    set(&session, "natureza_id", FieldValue::Id(1)).await;
    set(&session, "tipo_id", FieldValue::Id(11)).await;
    set(&session, "risco_id", FieldValue::Id(3)).await;
    set(&session, "gravidade", FieldValue::choice("alta")).await;
    set(&session, "descricao", FieldValue::text("Cinta de içamento desgastada")).await;
    advance(&session).await;
    set(&session, "ver_agir", FieldValue::flag(true)).await;
    set(&session, "acao_imediata", FieldValue::text("Cinta substituída")).await;
    advance(&session).await;
    assert_eq!(session.runtime.read(|c| c.current_step().id().to_string()).await, "finalizacao");

    let result = session.runtime.finalize(&incident::submission()).await.expect("finalize");
    let FinalizeResult::Finalized { record_id } = result else { panic!("expected finalized") };
    assert_eq!(record_id, draft_id.as_str());

    let record = session.gateway.record(incident::COLLECTION, &record_id).expect("stored");
    assert_eq!(record.status(), Some("concluido"));
    assert_eq!(record.payload["letra_id"], json!(81));
    assert!(record.payload.get("o_que_fazer").is_none());
    assert_eq!(session.gateway.count(incident::COLLECTION), 1);

    let summary = replay_summary(&session.runtime.read(|c| c.events()).await);
    assert!(summary.is_finalized());
    assert_eq!(summary.remote_id.as_deref(), Some(draft_id.as_str()));
    assert!(summary.drafts_saved >= 1);
}

fn questions() -> Vec<Question> {
    vec![Question::new(10, "Permissão de trabalho assinada?", true),
         Question::new(11, "Área limpa?", false)]
}

fn plan() -> ActionItem {
    ActionItem { pergunta_id: 10,
                 descricao_desvio: "PT sem assinatura do supervisor".into(),
                 o_que_fazer: "Colher assinatura".into(),
                 como_fazer: "Parar a frente até assinar".into(),
                 responsavel_id: 21,
                 prazo: NaiveDate::from_ymd_opt(2031, 3, 1).expect("date"),
                 prioridade: Priority::Alta,
                 status: ActionStatus::Pendente }
}

#[tokio::test]
async fn inspection_blocks_until_blocking_nonconformity_has_a_plan() {
    let questions = questions();
    let session = offline_session(inspection::definition(&questions).expect("definition"), inspection::COLLECTION, ctx());
    set(&session, "data_inspecao", FieldValue::text("2031-02-01")).await;
    set(&session, "local_instalacao_id", FieldValue::Id(4)).await;
    advance(&session).await;
    set(&session, "participantes_ids", FieldValue::IdList(vec![21, 22])).await;
    advance(&session).await;
    set(&session, "resposta_10", FieldValue::choice("NC")).await;
    set(&session, "resposta_11", FieldValue::choice("C")).await;
    advance(&session).await;

    let users = vec![ReferenceOption { id: "21".into(),
                                       label: "Ana Souza".into(),
                                       parent_id: None }];
    let checklist = InspectionChecklist::new(questions.clone());
    {
        let submission = InspectionSubmission::new(&checklist, &users);
        let result = session.runtime.finalize(&submission).await.expect("finalize");
        let FinalizeResult::Rejected(errors) = result else { panic!("expected rejection") };
        assert_eq!(errors.get("resposta_10"), Some(MISSING_ACTION_PLAN_MESSAGE));
        assert_eq!(session.gateway.create_calls(), 0);
    }

    let today = NaiveDate::from_ymd_opt(2031, 2, 1).expect("date");
    session.runtime
           .update(|c| checklist.add_action_item(c, plan(), today))
           .await
           .expect("editable")
           .expect("valid plan");
    let draft_id = session.runtime.save_draft().await.expect("draft");
    let draft = session.gateway.record(inspection::COLLECTION, draft_id.as_str()).expect("draft stored");
    assert_eq!(draft.payload["planos_acao"][0]["pergunta_id"], json!(10));

    // Outra sessão retoma o rascunho: o plano precisa vir junto.
    let resumed = WizardRuntime::resume(Arc::new(inspection::definition(&questions).expect("definition")),
                                        InMemoryEventStore::default(),
                                        Arc::clone(&session.gateway),
                                        inspection::COLLECTION,
                                        draft_id.clone(),
                                        ctx(),
                                        Arc::new(CollectingNotifier::new()),
                                        Duration::from_millis(1000)).await
                                                                    .expect("resume");
    assert_eq!(resumed.read(|c| checklist.items_for(c.session(), 10)).await, vec![plan()]);
    assert_eq!(resumed.save_draft().await.expect("unchanged draft"), draft_id);
    assert_eq!(session.gateway.update_calls(), 0);

    let submission = InspectionSubmission::new(&checklist, &users);
    let result = resumed.finalize(&submission).await.expect("finalize");
    let FinalizeResult::Finalized { record_id } = result else { panic!("expected finalized") };
    assert_eq!(record_id, draft_id.as_str());

    let record = session.gateway.record(inspection::COLLECTION, &record_id).expect("stored");
    let desvios = record.payload["desvios"].as_array().expect("desvios");
    assert_eq!(desvios.len(), 1);
    assert_eq!(desvios[0]["planos_acao"][0]["responsavel_nome"], json!("Ana Souza"));
    assert!(record.payload.get("resposta_10").is_none());
    assert!(record.payload.get("planos_acao").is_none());
}
