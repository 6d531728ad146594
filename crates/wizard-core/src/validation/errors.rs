use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapa campo → mensaje. Orden estable (BTreeMap) para comparaciones y logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> { self.0.get(field).map(|m| m.as_str()) }

    pub fn contains(&self, field: &str) -> bool { self.0.contains_key(field) }

    pub fn remove(&mut self, field: &str) -> Option<String> { self.0.remove(field) }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn fields(&self) -> Vec<String> { self.0.keys().cloned().collect() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Une `other` sobre `self`; en conflicto conserva el primer mensaje.
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, message) in other.0 {
            self.0.entry(field).or_insert(message);
        }
    }

    pub fn clear(&mut self) { self.0.clear(); }
}

impl FromIterator<(String, String)> for ValidationErrors {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self { Self(iter.into_iter().collect()) }
}
