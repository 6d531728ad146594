//! Store de campos: mapa clave → valor con reinicio en cascada de
//! dependientes. Conserva el orden de inserción para que los payloads
//! serialicen de forma estable.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{Dependencies, FieldValue};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldStore {
    values: IndexMap<String, FieldValue>,
    dependencies: Dependencies,
}

/// Resultado de una escritura: si el valor cambió y qué dependientes se borraron.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetResult {
    pub changed: bool,
    pub cleared: Vec<String>,
}

impl FieldStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_dependencies(dependencies: Dependencies) -> Self {
        Self { values: IndexMap::new(),
               dependencies }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> { self.values.get(key) }

    pub fn contains_key(&self, key: &str) -> bool { self.values.contains_key(key) }

    /// Escribe `value`. Si cambia, borra todos los dependientes transitivos
    /// que tenían valor. Escribir el mismo valor no borra nada.
    pub fn set(&mut self, key: &str, value: FieldValue) -> SetResult {
        if self.values.get(key) == Some(&value) {
            return SetResult::default();
        }
        self.values.insert(key.to_string(), value);
        SetResult { changed: true,
                    cleared: self.clear_descendants(key) }
    }

    /// Escritura sin cascada, para restaurar borradores ya consistentes.
    pub(crate) fn insert_raw(&mut self, key: &str, value: FieldValue) { self.values.insert(key.to_string(), value); }

    /// Quita el valor de `key`; también reinicia sus dependientes.
    pub fn remove(&mut self, key: &str) -> SetResult {
        if self.values.shift_remove(key).is_none() {
            return SetResult::default();
        }
        SetResult { changed: true,
                    cleared: self.clear_descendants(key) }
    }

    fn clear_descendants(&mut self, key: &str) -> Vec<String> {
        let mut cleared = Vec::new();
        for child in self.dependencies.descendants(key) {
            if self.values.shift_remove(&child).is_some() {
                cleared.push(child);
            }
        }
        cleared
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn dependencies(&self) -> &Dependencies { &self.dependencies }

    pub fn to_json(&self) -> Map<String, Value> {
        self.values.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
    }
}
