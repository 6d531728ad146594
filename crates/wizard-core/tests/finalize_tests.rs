use std::sync::Arc;

use serde_json::json;
use wizard_core::constants::REQUIRED_MESSAGE;
use wizard_core::{draft_fingerprint, draft_payload, replay_summary, restore_fields, restore_sections, CompletionCheck,
                  CoreEngineError,
                  FieldSpec, FieldValue, FinalSubmission, FinalizeOutcome, FormSession, FormStep, InMemoryEventStore,
                  RemoteId, RenamedSubmission, ValidationErrors, WizardController, WizardDefinition};

fn definition() -> Arc<WizardDefinition> {
    let def = WizardDefinition::builder("teste")
        .first_step(FormStep::new("dados", "Dados").with_field(FieldSpec::text("data_interacao", "Data").required())
                                                  .with_field(FieldSpec::id("local_instalacao_id", "Local").required()))
        .add_step(FormStep::new("relato", "Relato").with_field(FieldSpec::text("descricao", "Descrição").required()
                                                                                                          .min_length(5)))
        .build()
        .expect("valid definition");
    Arc::new(def)
}

fn at_last_step() -> WizardController {
    let mut c = WizardController::new(definition(), InMemoryEventStore::default());
    c.set_field("data_interacao", FieldValue::text("2024-05-01")).expect("set");
    c.set_field("local_instalacao_id", FieldValue::Id(3)).expect("set");
    c.advance().expect("advance");
    c
}

struct NoTuesdays;

impl CompletionCheck for NoTuesdays {
    fn name(&self) -> &str { "no_tuesdays" }

    fn check(&self, _definition: &WizardDefinition, session: &FormSession) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if session.fields().get("descricao") == Some(&FieldValue::text("terça")) {
            errors.insert("descricao", "sem terças");
        }
        errors
    }
}

#[test]
fn finalize_only_from_last_step() {
    let mut c = WizardController::new(definition(), InMemoryEventStore::default());
    assert_eq!(c.prepare_finalize(&[]), Err(CoreEngineError::NotAtLastStep));
}

#[test]
fn completion_check_blocks_and_reports() {
    let mut c = at_last_step();
    let FinalizeOutcome::Rejected(errors) = c.prepare_finalize(&[]).expect("prepare") else { panic!("expected rejection") };
    assert_eq!(errors.get("descricao"), Some(REQUIRED_MESSAGE));

    c.set_field("descricao", FieldValue::text("terça")).expect("set");
    let FinalizeOutcome::Rejected(errors) = c.prepare_finalize(&[&NoTuesdays]).expect("prepare") else {
        panic!("expected rejection")
    };
    assert_eq!(errors.get("descricao"), Some("sem terças"));
    assert_eq!(c.complete("1"), Err(CoreEngineError::FinalizeNotPrepared));
}

#[test]
fn complete_requires_fresh_preparation_and_locks_session() {
    let mut c = at_last_step();
    c.set_field("descricao", FieldValue::text("tudo certo")).expect("set");
    assert_eq!(c.prepare_finalize(&[&NoTuesdays]).expect("prepare"), FinalizeOutcome::Ready);
    c.set_field("descricao", FieldValue::text("mudou depois")).expect("set");
    assert_eq!(c.complete("1"), Err(CoreEngineError::FinalizeNotPrepared));

    assert_eq!(c.prepare_finalize(&[]).expect("prepare"), FinalizeOutcome::Ready);
    c.complete("99").expect("complete");
    assert!(c.session().is_submitted());
    assert_eq!(c.set_field("descricao", FieldValue::text("tarde")), Err(CoreEngineError::SessionSubmitted));
    assert_eq!(c.retreat(), Err(CoreEngineError::SessionSubmitted));
    assert_eq!(replay_summary(&c.events()).record_id.as_deref(), Some("99"));
}

#[test]
fn payload_shapes() {
    let mut c = at_last_step();
    c.set_field("descricao", FieldValue::text("tudo certo")).expect("set");
    let draft = draft_payload(c.definition(), c.session());
    assert_eq!(draft,
               json!({"data_interacao": "2024-05-01", "local_instalacao_id": 3, "descricao": "tudo certo",
                      "status": "em_andamento", "etapa_atual": "relato"}));
    assert_eq!(draft_fingerprint(&draft), draft_fingerprint(&draft.clone()));

    let submission = RenamedSubmission::new().rename("data_interacao", "data")
                                             .rename("local_instalacao_id", "local_interacao_id");
    let final_payload = submission.final_payload(c.definition(), c.session());
    assert_eq!(final_payload,
               json!({"data": "2024-05-01", "local_interacao_id": 3, "descricao": "tudo certo", "status": "concluido"}));
}

#[test]
fn resume_rebuilds_fields_step_and_history() {
    let def = definition();
    let stored = json!({"data_interacao": "2024-05-01", "local_instalacao_id": "3", "extra": 1,
                        "status": "em_andamento", "etapa_atual": "relato"});
    let (fields, step) = restore_fields(&def, &stored);
    assert_eq!(fields.len(), 2);
    assert_eq!(fields.get("local_instalacao_id"), Some(&FieldValue::Id(3)));
    let mut c = WizardController::resume(def, InMemoryEventStore::default(), RemoteId::new("55"), fields, step.as_deref())
        .expect("resume");
    assert_eq!(c.session().current_step(), 1);
    assert_eq!(c.session().history(), &[0]);
    assert_eq!(c.session().remote_id(), Some(&RemoteId::new("55")));
    c.retreat().expect("retreat");
    assert_eq!(c.session().current_step(), 0);
}

fn with_attachments() -> Arc<WizardDefinition> {
    let def = WizardDefinition::builder("teste")
        .first_step(FormStep::new("dados", "Dados").with_field(FieldSpec::text("descricao", "Descrição")))
        .add_step(FormStep::new("fim", "Fim"))
        .section("anexos")
        .build()
        .expect("valid definition");
    Arc::new(def)
}

#[test]
fn sections_must_not_clash_with_fields_or_reserved_keys() {
    for key in ["descricao", "status", "etapa_atual"] {
        let result = WizardDefinition::builder("teste")
            .first_step(FormStep::new("dados", "Dados").with_field(FieldSpec::text("descricao", "Descrição")))
            .section(key)
            .build();
        assert_eq!(result.err(), Some(CoreEngineError::SectionConflict(key.to_string())));
    }
    assert_ne!(with_attachments().definition_hash(), definition().definition_hash());
}

#[test]
fn sections_travel_with_the_draft_and_invalidate_preparation() {
    let mut c = WizardController::new(with_attachments(), InMemoryEventStore::default());
    assert_eq!(c.set_section("fotos", json!([])), Err(CoreEngineError::UnknownField("fotos".into())));
    c.advance().expect("advance");
    assert_eq!(c.prepare_finalize(&[]).expect("prepare"), FinalizeOutcome::Ready);
    assert_eq!(c.set_section("anexos", json!([{"nome": "foto.jpg"}])), Ok(true));
    assert!(!c.is_finalize_ready());
    assert_eq!(c.set_section("anexos", json!([{"nome": "foto.jpg"}])), Ok(false));
    assert_eq!(replay_summary(&c.events()).sections_changed, 1);

    let draft = draft_payload(c.definition(), c.session());
    assert_eq!(draft["anexos"][0]["nome"], "foto.jpg");
    let sections = restore_sections(c.definition(), &draft);
    assert_eq!(sections.get("anexos"), Some(&json!([{"nome": "foto.jpg"}])));
    assert!(restore_sections(c.definition(), &json!({"status": "em_andamento"})).is_empty());
}
