//! Reglas declarativas por campo.

use crate::constants::{min_length_message, REQUIRED_MESSAGE};
use crate::model::{FieldStore, FieldValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Según el tipo: texto no vacío tras trim, booleano respondido, lista no vacía.
    Required,
    /// Longitud mínima en caracteres tras trim. Un valor vacío no se evalúa.
    MinLength(usize),
    /// Obligatorio sólo cuando `field` vale exactamente `equals`.
    RequiredWhen { field: String, equals: FieldValue },
}

impl Rule {
    pub fn check(&self, key: &str, fields: &FieldStore) -> Option<String> {
        let value = fields.get(key);
        let blank = value.map(FieldValue::is_blank).unwrap_or(true);
        match self {
            Rule::Required if blank => Some(REQUIRED_MESSAGE.to_string()),
            Rule::Required => None,
            Rule::MinLength(min) => match value.and_then(FieldValue::as_text) {
                Some(text) if !text.trim().is_empty() && text.trim().chars().count() < *min => {
                    Some(min_length_message(*min))
                }
                _ => None,
            },
            Rule::RequiredWhen { field, equals } => {
                if blank && fields.get(field) == Some(equals) {
                    Some(REQUIRED_MESSAGE.to_string())
                } else {
                    None
                }
            }
        }
    }
}
