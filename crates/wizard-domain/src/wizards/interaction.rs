//! Registro de interação (diálogo de segurança).
//!
//! dados → participantes → relato. El envío final renombra los campos de
//! fecha y local al esquema del registro definitivo.

use wizard_core::{CoreEngineError, FieldSpec, FormStep, RenamedSubmission, WizardDefinition};

pub const NAME: &str = "interacao";
pub const COLLECTION: &str = "interacoes";

pub const REPORT_MIN_CHARS: usize = 5;

pub fn definition() -> Result<WizardDefinition, CoreEngineError> {
    WizardDefinition::builder(NAME)
        .first_step(FormStep::new("dados", "Dados").with_field(FieldSpec::text("data_interacao", "Data").required())
                                                   .with_field(FieldSpec::id("local_instalacao_id", "Local").required())
                                                   .with_field(FieldSpec::id("tipo_interacao_id", "Tipo de interação")
                                                       .required()))
        .add_step(FormStep::new("participantes", "Participantes")
            .with_field(FieldSpec::id_list("participantes_ids", "Participantes").required()))
        .add_step(FormStep::new("relato", "Relato")
            .with_field(FieldSpec::text("relato", "Relato").required().min_length(REPORT_MIN_CHARS))
            .with_field(FieldSpec::text("observacoes", "Observações")))
        .build()
}

pub fn submission() -> RenamedSubmission {
    RenamedSubmission::new().rename("data_interacao", "data")
                            .rename("local_instalacao_id", "local_interacao_id")
}
