//! Valores de campo.
//!
//! `FieldValue` es la unión etiquetada que circula entre el store, los
//! validadores y la capa de payloads. `FieldKind` describe qué variante espera
//! cada campo declarado en un paso y guía la reconstrucción desde JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Texto libre.
    Text(String),
    /// Booleano tri-estado: `None` significa "sin responder".
    Flag(Option<bool>),
    /// Selección dentro de un conjunto enumerado.
    Choice(String),
    /// Identificador numérico de otra entidad.
    Id(i64),
    /// Lista de identificadores (p.ej. participantes).
    IdList(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Flag,
    /// Valores admitidos. Lista vacía = sin restricción local (opciones remotas).
    Choice(Vec<String>),
    Id,
    IdList,
}

impl FieldKind {
    /// `true` si `value` es de la variante que este tipo espera.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        matches!((self, value),
                 (FieldKind::Text, FieldValue::Text(_))
                 | (FieldKind::Flag, FieldValue::Flag(_))
                 | (FieldKind::Choice(_), FieldValue::Choice(_))
                 | (FieldKind::Id, FieldValue::Id(_))
                 | (FieldKind::IdList, FieldValue::IdList(_)))
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Flag => "flag",
            FieldKind::Choice(_) => "choice",
            FieldKind::Id => "id",
            FieldKind::IdList => "id_list",
        }
    }
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self { FieldValue::Text(value.into()) }

    pub fn flag(value: bool) -> Self { FieldValue::Flag(Some(value)) }

    pub fn choice(value: impl Into<String>) -> Self { FieldValue::Choice(value.into()) }

    /// `true` cuando el valor cuenta como vacío para las reglas de obligatoriedad.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) => s.trim().is_empty(),
            FieldValue::Flag(v) => v.is_none(),
            FieldValue::Id(_) => false,
            FieldValue::IdList(ids) => ids.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(v) => *v,
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<i64> {
        match self {
            FieldValue::Id(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_ids(&self) -> Option<&[i64]> {
        match self {
            FieldValue::IdList(ids) => Some(ids.as_slice()),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) => Value::String(s.clone()),
            FieldValue::Flag(Some(b)) => Value::Bool(*b),
            FieldValue::Flag(None) => Value::Null,
            FieldValue::Id(id) => Value::from(*id),
            FieldValue::IdList(ids) => Value::from(ids.clone()),
        }
    }

    /// Reconstruye un valor desde el JSON de un borrador remoto. Devuelve
    /// `None` si la forma no corresponde al tipo declarado.
    pub fn from_json(kind: &FieldKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (FieldKind::Flag, Value::Null) => Some(FieldValue::Flag(None)),
            (FieldKind::Flag, Value::Bool(b)) => Some(FieldValue::Flag(Some(*b))),
            (FieldKind::Text, Value::String(s)) => Some(FieldValue::Text(s.clone())),
            (FieldKind::Choice(_), Value::String(s)) => Some(FieldValue::Choice(s.clone())),
            (FieldKind::Id, v) => json_to_id(v).map(FieldValue::Id),
            (FieldKind::IdList, Value::Array(items)) => {
                items.iter().map(json_to_id).collect::<Option<Vec<_>>>().map(FieldValue::IdList)
            }
            _ => None,
        }
    }
}

fn json_to_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_values() {
        assert!(FieldValue::text("   ").is_blank());
        assert!(FieldValue::Flag(None).is_blank());
        assert!(!FieldValue::flag(false).is_blank());
        assert!(FieldValue::IdList(vec![]).is_blank());
        assert!(!FieldValue::Id(0).is_blank());
    }

    #[test]
    fn from_json_follows_declared_kind() {
        assert_eq!(FieldValue::from_json(&FieldKind::Id, &json!("42")), Some(FieldValue::Id(42)));
        assert_eq!(FieldValue::from_json(&FieldKind::IdList, &json!([1, "2"])),
                   Some(FieldValue::IdList(vec![1, 2])));
        assert_eq!(FieldValue::from_json(&FieldKind::Flag, &json!(null)), Some(FieldValue::Flag(None)));
        assert_eq!(FieldValue::from_json(&FieldKind::Text, &json!(3)), None);
    }
}
