//! Contrato de un paso del wizard.
//!
//! Un paso es declarativo: lista de campos + transición. `FormStep` cubre
//! todos los wizards concretos; el trait queda como punto de extensión para
//! pasos con validación propia (sobrescribiendo `validate`).

use std::fmt;

use crate::model::FieldStore;
use crate::validation::{validate_fields, ValidationErrors};

use super::{FieldSpec, Transition};

pub trait StepDefinition: Send + Sync + fmt::Debug {
    /// Identificador estable (también viaja como `etapa_atual`).
    fn id(&self) -> &str;
    fn title(&self) -> &str { self.id() }
    fn fields(&self) -> &[FieldSpec];
    fn transition(&self) -> &Transition;

    /// Validación pura de los campos propios del paso.
    fn validate(&self, fields: &FieldStore) -> ValidationErrors { validate_fields(self.fields(), fields) }

    fn owns(&self, key: &str) -> bool { self.fields().iter().any(|f| f.key == key) }

    fn field(&self, key: &str) -> Option<&FieldSpec> { self.fields().iter().find(|f| f.key == key) }
}

#[derive(Debug, Clone)]
pub struct FormStep {
    id: String,
    title: String,
    fields: Vec<FieldSpec>,
    transition: Transition,
}

impl FormStep {
    pub fn new(id: &str, title: &str) -> Self {
        Self { id: id.to_string(),
               title: title.to_string(),
               fields: Vec::new(),
               transition: Transition::Next }
    }

    pub fn with_field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn with_fields(mut self, specs: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(specs);
        self
    }

    pub fn then(mut self, transition: Transition) -> Self {
        self.transition = transition;
        self
    }
}

impl StepDefinition for FormStep {
    fn id(&self) -> &str { &self.id }
    fn title(&self) -> &str { &self.title }
    fn fields(&self) -> &[FieldSpec] { &self.fields }
    fn transition(&self) -> &Transition { &self.transition }
}
