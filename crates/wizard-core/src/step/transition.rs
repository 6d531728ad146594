//! Tabla de transiciones por paso. La navegación hacia adelante se decide aquí
//! (no en la UI) a partir del estado actual del store.

use crate::model::{FieldStore, FieldValue};

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Paso siguiente en orden de declaración.
    Next,
    /// Salto incondicional a un paso posterior.
    Goto(String),
    /// Primer brazo cuyo valor coincide con `field`; si ninguno, `otherwise`.
    Branch { field: String, arms: Vec<(FieldValue, String)>, otherwise: Box<Transition> },
}

/// Destino resuelto de una transición.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Next,
    Step(&'a str),
}

impl Transition {
    /// Bifurcación sobre un booleano: si `field == value` salta a `target`,
    /// en otro caso sigue en orden.
    pub fn when_flag(field: &str, value: bool, target: &str) -> Self {
        Transition::Branch { field: field.to_string(),
                             arms: vec![(FieldValue::flag(value), target.to_string())],
                             otherwise: Box::new(Transition::Next) }
    }

    pub fn resolve<'a>(&'a self, fields: &FieldStore) -> Target<'a> {
        match self {
            Transition::Next => Target::Next,
            Transition::Goto(id) => Target::Step(id.as_str()),
            Transition::Branch { field, arms, otherwise } => {
                let current = fields.get(field);
                match arms.iter().find(|(value, _)| Some(value) == current) {
                    Some((_, id)) => Target::Step(id.as_str()),
                    None => otherwise.resolve(fields),
                }
            }
        }
    }

    /// Todos los ids de paso que esta transición puede alcanzar.
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Transition::Next => Vec::new(),
            Transition::Goto(id) => vec![id.as_str()],
            Transition::Branch { arms, otherwise, .. } => {
                let mut out: Vec<&str> = arms.iter().map(|(_, id)| id.as_str()).collect();
                out.extend(otherwise.targets());
                out
            }
        }
    }
}
