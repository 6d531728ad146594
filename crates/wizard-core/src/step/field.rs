//! Declaración de campos: clave, etiqueta, tipo y reglas.

use crate::model::{FieldKind, FieldStore, FieldValue};
use crate::validation::{self, Rule};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub rules: Vec<Rule>,
    /// Valor inicial que se escribe al crear la sesión.
    pub default: Option<FieldValue>,
}

impl FieldSpec {
    pub fn new(key: &str, label: &str, kind: FieldKind) -> Self {
        Self { key: key.to_string(),
               label: label.to_string(),
               kind,
               rules: Vec::new(),
               default: None }
    }

    pub fn text(key: &str, label: &str) -> Self { Self::new(key, label, FieldKind::Text) }

    pub fn flag(key: &str, label: &str) -> Self { Self::new(key, label, FieldKind::Flag) }

    pub fn id(key: &str, label: &str) -> Self { Self::new(key, label, FieldKind::Id) }

    pub fn id_list(key: &str, label: &str) -> Self { Self::new(key, label, FieldKind::IdList) }

    pub fn choice(key: &str, label: &str, options: &[&str]) -> Self {
        Self::new(key, label, FieldKind::Choice(options.iter().map(|o| o.to_string()).collect()))
    }

    pub fn required(mut self) -> Self {
        self.rules.push(Rule::Required);
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.rules.push(Rule::MinLength(min));
        self
    }

    pub fn required_when(mut self, field: &str, equals: FieldValue) -> Self {
        self.rules.push(Rule::RequiredWhen { field: field.to_string(),
                                             equals });
        self
    }

    pub fn with_default(mut self, value: FieldValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Obligatorio incondicional (no cuenta `RequiredWhen`).
    pub fn is_required(&self) -> bool { self.rules.iter().any(|r| matches!(r, Rule::Required)) }

    pub fn validate(&self, fields: &FieldStore) -> Option<String> { validation::validate_field(self, fields) }
}
