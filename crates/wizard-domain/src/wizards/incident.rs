//! Registro de desvío (incidente).
//!
//! contexto → paralisacao → classificacao → ver_agir → plano_acao → finalizacao
//!
//! Si el desvío se resolvió en el acto (`ver_agir = true`) se salta el plan
//! de acción y se exige describir la acción inmediata.

use wizard_core::{CoreEngineError, FieldSpec, FieldValue, FormStep, RenamedSubmission, Transition, WizardDefinition};

pub const NAME: &str = "desvio";
pub const COLLECTION: &str = "desvios";

pub const DESCRIPTION_MIN_CHARS: usize = 10;

pub const SEVERITIES: [&str; 3] = ["baixa", "media", "alta"];

pub fn definition() -> Result<WizardDefinition, CoreEngineError> {
    WizardDefinition::builder(NAME)
        .depends("contrato_id", &["letra_id", "equipe_id"])
        .depends("natureza_id", &["tipo_id"])
        .first_step(FormStep::new("contexto", "Contexto").with_field(FieldSpec::text("area", "Área").required())
                                                         .with_field(FieldSpec::text("atividade", "Atividade").required())
                                                         .with_field(FieldSpec::text("data_ocorrencia", "Data da ocorrência"))
                                                         .with_field(FieldSpec::id("local_instalacao_id", "Local"))
                                                         .with_field(FieldSpec::id("contrato_id", "Contrato"))
                                                         .with_field(FieldSpec::id("letra_id", "Letra"))
                                                         .with_field(FieldSpec::id("equipe_id", "Equipe")))
        .add_step(FormStep::new("paralisacao", "Paralisação")
            .with_field(FieldSpec::flag("paralisacao_realizada", "Houve paralisação?").required())
            .with_field(FieldSpec::text("tempo_paralisacao", "Tempo de paralisação")
                .required_when("paralisacao_realizada", FieldValue::flag(true))))
        .add_step(FormStep::new("classificacao", "Classificação")
            .with_field(FieldSpec::id("natureza_id", "Natureza").required())
            .with_field(FieldSpec::id("tipo_id", "Tipo").required())
            .with_field(FieldSpec::id("risco_id", "Risco").required())
            .with_field(FieldSpec::choice("gravidade", "Gravidade", &SEVERITIES).required())
            .with_field(FieldSpec::text("descricao", "Descrição").required().min_length(DESCRIPTION_MIN_CHARS)))
        .add_step(FormStep::new("ver_agir", "Ver e agir")
            .with_field(FieldSpec::flag("ver_agir", "Resolvido no ato?").required())
            .with_field(FieldSpec::text("acao_imediata", "Ação imediata").required_when("ver_agir", FieldValue::flag(true)))
            .then(Transition::when_flag("ver_agir", true, "finalizacao")))
        .add_step(FormStep::new("plano_acao", "Plano de ação")
            .with_field(FieldSpec::text("o_que_fazer", "O que fazer").required())
            .with_field(FieldSpec::text("como_fazer", "Como fazer").required())
            .with_field(FieldSpec::id("responsavel_id", "Responsável").required())
            .with_field(FieldSpec::text("prazo", "Prazo").required()))
        .add_step(FormStep::new("finalizacao", "Finalização")
            .with_field(FieldSpec::id_list("envolvidos_ids", "Envolvidos"))
            .with_field(FieldSpec::text("observacoes", "Observações")))
        .build()
}

/// El desvío se envía con las claves del borrador, limitado a los campos de
/// los pasos recorridos.
pub fn submission() -> RenamedSubmission { RenamedSubmission::new() }
