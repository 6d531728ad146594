use std::sync::Arc;

use wizard_core::constants::REQUIRED_MESSAGE;
use wizard_core::{replay_summary, CoreEngineError, FieldSpec, FieldValue, FormStep, InMemoryEventStore, SessionEventKind,
                  StepOutcome, StepStatus, Transition, WizardController, WizardDefinition};

// Wizard mínimo: a → b → c, con atajo a → c cuando `pular` = true.
fn definition() -> Arc<WizardDefinition> {
    let def = WizardDefinition::builder("teste")
        .depends("contrato_id", &["equipe_id"])
        .first_step(FormStep::new("a", "Início").with_field(FieldSpec::text("nome", "Nome").required().min_length(3))
                                                .with_field(FieldSpec::flag("pular", "Pular detalhes?").required())
                                                .with_field(FieldSpec::id("contrato_id", "Contrato"))
                                                .with_field(FieldSpec::id("equipe_id", "Equipe"))
                                                .then(Transition::when_flag("pular", true, "c")))
        .add_step(FormStep::new("b", "Detalhes").with_field(FieldSpec::text("detalhe", "Detalhe").required()))
        .add_step(FormStep::new("c", "Fim").with_field(FieldSpec::text("obs", "Observação")))
        .build()
        .expect("valid definition");
    Arc::new(def)
}

fn controller() -> WizardController {
    WizardController::new(definition(), InMemoryEventStore::default())
}

#[test]
fn advance_is_blocked_until_step_is_valid() {
    let mut c = controller();
    let outcome = c.advance().expect("advance");
    let StepOutcome::Rejected(errors) = outcome else { panic!("expected rejection") };
    assert_eq!(errors.get("nome"), Some(REQUIRED_MESSAGE));
    assert_eq!(errors.get("pular"), Some(REQUIRED_MESSAGE));
    assert_eq!(c.session().current_step(), 0);
    assert_eq!(c.session().errors(), &errors);

    c.set_field("nome", FieldValue::text("Ana")).expect("set");
    c.set_field("pular", FieldValue::flag(false)).expect("set");
    let outcome = c.advance().expect("advance");
    assert_eq!(outcome,
               StepOutcome::Moved { from: "a".into(),
                                    to: "b".into() });
    assert!(c.session().errors().is_empty());
}

#[test]
fn validation_is_repeatable_and_rejection_leaves_state_alone() {
    let mut c = controller();
    c.set_field("nome", FieldValue::text("Al")).expect("set");
    let first = c.validate_current();
    let second = c.validate_current();
    assert_eq!(first, second);
    assert_eq!(first.get("nome"), Some("Mínimo de 3 caracteres"));
    assert_eq!(first.get("pular"), Some(REQUIRED_MESSAGE));
    assert!(c.session().errors().is_empty());

    let step = c.definition().step(0).expect("first step");
    assert_eq!(step.validate(c.session().fields()), step.validate(c.session().fields()));
    assert_eq!(step.validate(c.session().fields()), first);

    let fields_before = c.session().fields().clone();
    let history_before = c.session().history().to_vec();
    let StepOutcome::Rejected(errors) = c.advance().expect("advance") else { panic!("expected rejection") };
    assert_eq!(errors, first);
    assert_eq!(c.session().fields(), &fields_before);
    assert_eq!(c.session().history(), history_before.as_slice());
    assert_eq!(c.session().current_step(), 0);
    assert_eq!(c.session().errors(), &first);

    let StepOutcome::Rejected(again) = c.advance().expect("advance") else { panic!("expected rejection") };
    assert_eq!(again, errors);
    assert_eq!(c.session().fields(), &fields_before);
    assert_eq!(c.validate_current(), first);
}

#[test]
fn branch_skips_step_and_retreat_follows_history() {
    let mut c = controller();
    c.set_field("nome", FieldValue::text("Ana")).expect("set");
    c.set_field("pular", FieldValue::flag(true)).expect("set");
    assert_eq!(c.advance().expect("advance"),
               StepOutcome::Moved { from: "a".into(),
                                    to: "c".into() });
    let statuses = c.step_statuses();
    assert_eq!(statuses[1], ("b".to_string(), StepStatus::Skipped));
    assert_eq!(statuses[2], ("c".to_string(), StepStatus::Active));

    assert_eq!(c.retreat().expect("retreat"),
               StepOutcome::Moved { from: "c".into(),
                                    to: "a".into() });
    assert_eq!(c.retreat(), Err(CoreEngineError::AtFirstStep));
}

#[test]
fn retreat_does_not_revalidate_and_clears_errors() {
    let mut c = controller();
    c.set_field("nome", FieldValue::text("Ana")).expect("set");
    c.set_field("pular", FieldValue::flag(false)).expect("set");
    c.advance().expect("advance");
    assert!(matches!(c.advance().expect("advance"), StepOutcome::Rejected(_)));
    assert!(!c.session().errors().is_empty());
    c.retreat().expect("retreat");
    assert!(c.session().errors().is_empty());
    assert_eq!(c.session().current_step(), 0);
}

#[test]
fn advancing_from_last_step_is_an_error() {
    let mut c = controller();
    c.set_field("nome", FieldValue::text("Ana")).expect("set");
    c.set_field("pular", FieldValue::flag(true)).expect("set");
    c.advance().expect("advance");
    assert_eq!(c.advance(), Err(CoreEngineError::AtLastStep));
}

#[test]
fn set_field_rejects_unknown_keys_and_wrong_kinds() {
    let mut c = controller();
    assert_eq!(c.set_field("nope", FieldValue::text("x")),
               Err(CoreEngineError::UnknownField("nope".into())));
    assert!(matches!(c.set_field("pular", FieldValue::text("sim")),
                     Err(CoreEngineError::InvalidAnswer { .. })));
}

#[test]
fn parent_change_clears_dependents_and_is_logged() {
    let mut c = controller();
    c.set_field("contrato_id", FieldValue::Id(1)).expect("set");
    c.set_field("equipe_id", FieldValue::Id(9)).expect("set");
    let result = c.set_field("contrato_id", FieldValue::Id(2)).expect("set");
    assert_eq!(result.cleared, vec!["equipe_id".to_string()]);
    assert!(c.get("equipe_id").is_none());

    let events = c.events();
    assert!(matches!(events[0].kind, SessionEventKind::SessionStarted { step_count: 3, .. }));
    let last = events.last().expect("event");
    assert_eq!(last.kind,
               SessionEventKind::FieldChanged { key: "contrato_id".into(),
                                                cleared: vec!["equipe_id".into()] });
    assert_eq!(replay_summary(&events).fields_changed, 3);
}

#[test]
fn jump_back_truncates_history() {
    let mut c = controller();
    c.set_field("nome", FieldValue::text("Ana")).expect("set");
    c.set_field("pular", FieldValue::flag(false)).expect("set");
    c.advance().expect("advance");
    c.set_field("detalhe", FieldValue::text("ok")).expect("set");
    c.advance().expect("advance");
    assert_eq!(c.session().history(), &[0, 1]);
    c.jump_back_to("a").expect("jump");
    assert_eq!(c.session().current_step(), 0);
    assert!(c.session().history().is_empty());
    assert!(matches!(c.jump_back_to("c"), Err(CoreEngineError::UnknownStep(_))));
}
