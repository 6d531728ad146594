//! Grafo padre → hijos entre campos. Cambiar un padre invalida a todos sus
//! descendientes (p.ej. contrato → letra/equipe, natureza → tipo).

use std::collections::VecDeque;

use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    edges: IndexMap<String, Vec<String>>,
}

impl Dependencies {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, parent: &str, children: &[&str]) {
        let entry = self.edges.entry(parent.to_string()).or_default();
        for child in children {
            if !entry.iter().any(|c| c == child) {
                entry.push(child.to_string());
            }
        }
    }

    pub fn children_of(&self, parent: &str) -> &[String] {
        self.edges.get(parent).map(|c| c.as_slice()).unwrap_or(&[])
    }

    /// Descendientes transitivos en orden BFS, sin repetidos y sin `key`.
    /// Tolera ciclos.
    pub fn descendants<'a>(&'a self, key: &'a str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut queue: VecDeque<&'a str> = VecDeque::from([key]);
        while let Some(current) = queue.pop_front() {
            for child in self.children_of(current) {
                if child != key && !out.contains(child) {
                    out.push(child.clone());
                    queue.push_back(child.as_str());
                }
            }
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.edges.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool { self.edges.is_empty() }
}
