//! Validación pura: no muta el store ni la sesión. Devuelve un mapa
//! campo → mensaje; el mapa vacío significa "válido".

pub mod errors;
pub mod rules;

pub use errors::ValidationErrors;
pub use rules::Rule;

use crate::constants::INVALID_OPTION_MESSAGE;
use crate::model::{FieldKind, FieldStore, FieldValue};
use crate::step::FieldSpec;

/// Primer mensaje de error para un campo, o `None` si es válido.
pub fn validate_field(spec: &FieldSpec, fields: &FieldStore) -> Option<String> {
    if let Some(message) = spec.rules.iter().find_map(|rule| rule.check(&spec.key, fields)) {
        return Some(message);
    }
    match (&spec.kind, fields.get(&spec.key)) {
        (FieldKind::Choice(options), Some(FieldValue::Choice(value)))
            if !options.is_empty() && !value.is_empty() && !options.iter().any(|o| o == value) =>
        {
            Some(INVALID_OPTION_MESSAGE.to_string())
        }
        _ => None,
    }
}

pub fn validate_fields(specs: &[FieldSpec], fields: &FieldStore) -> ValidationErrors {
    specs.iter()
         .filter_map(|spec| validate_field(spec, fields).map(|msg| (spec.key.clone(), msg)))
         .collect()
}
