//! Definición de un wizard: lista ordenada de pasos, grafo de dependencias
//! entre campos y hash de definición.
//!
//! Invariantes verificadas al construir:
//! - al menos un paso, ids únicos;
//! - ningún campo declarado por dos pasos (tampoco uno obligatorio);
//! - toda transición apunta a un paso existente y posterior;
//! - las dependencias sólo mencionan campos declarados;
//! - las secciones no chocan con campos ni con claves reservadas.

use serde_json::json;

use crate::constants::{CURRENT_STEP_KEY, DEFINITION_VERSION, STATUS_KEY};
use crate::errors::CoreEngineError;
use crate::hashing::hash_value;
use crate::model::{Dependencies, FieldStore};
use crate::step::{FieldSpec, StepDefinition, Target};

use super::builder::DefinitionBuilderInit;

#[derive(Debug)]
pub struct WizardDefinition {
    name: String,
    steps: Vec<Box<dyn StepDefinition>>,
    dependencies: Dependencies,
    sections: Vec<String>,
    definition_hash: String,
}

impl WizardDefinition {
    pub fn builder(name: &str) -> DefinitionBuilderInit { DefinitionBuilderInit::new(name) }

    pub fn name(&self) -> &str { &self.name }

    pub fn definition_hash(&self) -> &str { &self.definition_hash }

    pub fn len(&self) -> usize { self.steps.len() }

    pub fn is_empty(&self) -> bool { self.steps.is_empty() }

    pub fn last_index(&self) -> usize { self.steps.len().saturating_sub(1) }

    pub fn steps(&self) -> impl Iterator<Item = &dyn StepDefinition> { self.steps.iter().map(|s| s.as_ref()) }

    pub fn step(&self, index: usize) -> Option<&dyn StepDefinition> { self.steps.get(index).map(|s| s.as_ref()) }

    /// Acceso directo para índices ya validados por la sesión.
    pub(crate) fn step_at(&self, index: usize) -> &dyn StepDefinition { self.steps[index].as_ref() }

    pub fn index_of(&self, step_id: &str) -> Option<usize> { self.steps.iter().position(|s| s.id() == step_id) }

    pub fn dependencies(&self) -> &Dependencies { &self.dependencies }

    pub fn sections(&self) -> &[String] { &self.sections }

    pub fn has_section(&self, key: &str) -> bool { self.sections.iter().any(|s| s == key) }

    /// Índice del paso dueño del campo y su declaración.
    pub fn field_spec(&self, key: &str) -> Option<(usize, &FieldSpec)> {
        self.steps.iter().enumerate().find_map(|(i, s)| s.field(key).map(|f| (i, f)))
    }

    /// Campos cuyo paso dueño está en `visited`, en orden de declaración.
    pub fn owned_by(&self, visited: &[usize]) -> Vec<&FieldSpec> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(i, _)| visited.contains(i))
            .flat_map(|(_, s)| s.fields())
            .collect()
    }

    /// Pares (campo, paso) de todos los campos obligatorios incondicionales.
    pub fn required_fields(&self) -> Vec<(&str, &str)> {
        self.steps
            .iter()
            .flat_map(|s| s.fields().iter().filter(|f| f.is_required()).map(move |f| (f.key.as_str(), s.id())))
            .collect()
    }

    /// Store vacío con las dependencias y valores por defecto de la definición.
    pub fn new_store(&self) -> FieldStore {
        let mut store = FieldStore::with_dependencies(self.dependencies.clone());
        for spec in self.steps.iter().flat_map(|s| s.fields()) {
            if let Some(default) = &spec.default {
                store.set(&spec.key, default.clone());
            }
        }
        store
    }

    /// Índice destino al avanzar desde `index` con el estado actual.
    pub fn resolve_next(&self, index: usize, fields: &FieldStore) -> Result<usize, CoreEngineError> {
        let step = self.step(index).ok_or_else(|| CoreEngineError::UnknownStep(index.to_string()))?;
        match step.transition().resolve(fields) {
            Target::Next if index + 1 < self.steps.len() => Ok(index + 1),
            Target::Next => Err(CoreEngineError::AtLastStep),
            Target::Step(id) => self.index_of(id).ok_or_else(|| CoreEngineError::UnknownStep(id.to_string())),
        }
    }

    /// Camino (historial) que lleva desde el primer paso hasta `target`
    /// siguiendo las transiciones con el estado dado. Si el estado no
    /// conduce a `target`, se asume recorrido lineal.
    pub fn path_to(&self, target: usize, fields: &FieldStore) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = 0;
        while current < target {
            path.push(current);
            match self.resolve_next(current, fields) {
                Ok(next) => current = next,
                Err(_) => break,
            }
        }
        if current == target {
            path
        } else {
            (0..target).collect()
        }
    }
}

/// Valida invariantes y calcula el hash. Usado por el builder.
pub fn build_wizard_definition(name: &str,
                               steps: Vec<Box<dyn StepDefinition>>,
                               dependencies: Dependencies,
                               sections: Vec<String>)
                               -> Result<WizardDefinition, CoreEngineError> {
    if steps.is_empty() {
        return Err(CoreEngineError::EmptyDefinition);
    }
    for (i, step) in steps.iter().enumerate() {
        if steps[..i].iter().any(|s| s.id() == step.id()) {
            return Err(CoreEngineError::DuplicateStep(step.id().to_string()));
        }
    }

    let mut owners: Vec<(&FieldSpec, &str)> = Vec::new();
    for step in &steps {
        for spec in step.fields() {
            if let Some((prev, first)) = owners.iter().find(|(f, _)| f.key == spec.key) {
                let (field, first, second) = (spec.key.clone(), first.to_string(), step.id().to_string());
                return Err(if prev.is_required() || spec.is_required() {
                               CoreEngineError::DuplicateRequiredField { field, first, second }
                           } else {
                               CoreEngineError::DuplicateField { field, first, second }
                           });
            }
            owners.push((spec, step.id()));
        }
    }

    for (i, step) in steps.iter().enumerate() {
        for target in step.transition().targets() {
            match steps.iter().position(|s| s.id() == target) {
                None => {
                    return Err(CoreEngineError::UnknownTransitionTarget { from: step.id().to_string(),
                                                                          to: target.to_string() })
                }
                Some(j) if j <= i => {
                    return Err(CoreEngineError::BackwardTransition { from: step.id().to_string(),
                                                                     to: target.to_string() })
                }
                Some(_) => {}
            }
        }
    }

    for (parent, children) in dependencies.iter() {
        for key in std::iter::once(parent).chain(children.iter().map(|c| c.as_str())) {
            if !owners.iter().any(|(f, _)| f.key == key) {
                return Err(CoreEngineError::UnknownField(key.to_string()));
            }
        }
    }

    for (i, key) in sections.iter().enumerate() {
        let reserved = key == STATUS_KEY || key == CURRENT_STEP_KEY;
        if reserved || sections[..i].contains(key) || owners.iter().any(|(f, _)| f.key == *key) {
            return Err(CoreEngineError::SectionConflict(key.clone()));
        }
    }

    let shape = json!({
        "version": DEFINITION_VERSION,
        "name": name,
        "steps": steps.iter().map(|s| json!({
            "id": s.id(),
            "fields": s.fields().iter().map(|f| f.key.as_str()).collect::<Vec<_>>(),
            "targets": s.transition().targets(),
        })).collect::<Vec<_>>(),
        "sections": sections,
    });
    let definition_hash = hash_value(&shape);
    Ok(WizardDefinition { name: name.to_string(),
                          steps,
                          dependencies,
                          sections,
                          definition_hash })
}
