//! Datos de referencia (locais, usuários, contratos...).
//!
//! Cada colección remota expone la etiqueta en un atributo distinto. La
//! normalización ocurre aquí, en el borde del loader: todo lo que sale es un
//! `ReferenceOption { id, label, parent_id }` uniforme.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionKind {
    Locais,
    Usuarios,
    Contratos,
    Letras,
    Equipes,
    Naturezas,
    Tipos,
    Riscos,
    TiposInteracao,
}

/// Atributos de etiqueta que se prueban cuando el tipo no declara uno propio.
const FALLBACK_LABEL_KEYS: &[&str] = &["nome", "descricao", "titulo", "name", "label"];

impl OptionKind {
    pub fn collection(self) -> &'static str {
        match self {
            OptionKind::Locais => "locais",
            OptionKind::Usuarios => "usuarios",
            OptionKind::Contratos => "contratos",
            OptionKind::Letras => "letras",
            OptionKind::Equipes => "equipes",
            OptionKind::Naturezas => "naturezas",
            OptionKind::Tipos => "tipos",
            OptionKind::Riscos => "riscos",
            OptionKind::TiposInteracao => "tipos_interacao",
        }
    }

    /// Atributos de etiqueta en orden de preferencia.
    pub fn label_keys(self) -> &'static [&'static str] {
        match self {
            OptionKind::Locais => &["local", "nome"],
            OptionKind::Usuarios => &["nome", "email"],
            OptionKind::Contratos => &["nome", "codigo"],
            OptionKind::Letras => &["letra", "nome"],
            OptionKind::Equipes => &["equipe", "nome"],
            OptionKind::Naturezas => &["natureza", "nome"],
            OptionKind::Tipos => &["tipo", "nome"],
            OptionKind::Riscos => &["risco", "descricao"],
            OptionKind::TiposInteracao => &["tipo", "nome"],
        }
    }

    /// Campo padre del que depende la lista (también es el parámetro de filtro).
    pub fn parent_filter(self) -> Option<&'static str> {
        match self {
            OptionKind::Letras | OptionKind::Equipes => Some("contrato_id"),
            OptionKind::Tipos => Some("natureza_id"),
            _ => None,
        }
    }

    /// Lista de referencia que alimenta un campo de formulario.
    pub fn for_field(key: &str) -> Option<Self> {
        match key {
            "local_instalacao_id" => Some(OptionKind::Locais),
            "contrato_id" => Some(OptionKind::Contratos),
            "letra_id" => Some(OptionKind::Letras),
            "equipe_id" => Some(OptionKind::Equipes),
            "natureza_id" => Some(OptionKind::Naturezas),
            "tipo_id" => Some(OptionKind::Tipos),
            "risco_id" => Some(OptionKind::Riscos),
            "tipo_interacao_id" => Some(OptionKind::TiposInteracao),
            "responsavel_id" | "participantes_ids" | "envolvidos_ids" => Some(OptionKind::Usuarios),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceOption {
    pub id: String,
    pub label: String,
    pub parent_id: Option<String>,
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ReferenceOption {
    /// Normaliza un registro crudo. Sin `id` utilizable devuelve `None`; sin
    /// etiqueta reconocible usa el id como etiqueta.
    pub fn normalize(kind: OptionKind, raw: &Value) -> Option<Self> {
        let id = raw.get("id").and_then(scalar_to_string)?;
        let label = kind.label_keys()
                        .iter()
                        .chain(FALLBACK_LABEL_KEYS)
                        .find_map(|key| raw.get(*key).and_then(scalar_to_string))
                        .unwrap_or_else(|| id.clone());
        let parent_id = kind.parent_filter().and_then(|key| raw.get(key)).and_then(scalar_to_string);
        Some(Self { id, label, parent_id })
    }

    pub fn id_as_i64(&self) -> Option<i64> { self.id.parse().ok() }
}

/// Contexto de filtro para una carga de opciones (parámetros de query).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OptionFilter(BTreeMap<String, String>);

impl OptionFilter {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Filtro por el padre de `kind`. `None` si el tipo no es dependiente.
    pub fn for_parent(kind: OptionKind, parent_id: impl Into<String>) -> Option<Self> {
        kind.parent_filter().map(|key| Self::new().with(key, parent_id))
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn to_query(&self) -> Vec<(String, String)> { self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_heterogeneous_shapes() {
        let local = ReferenceOption::normalize(OptionKind::Locais, &json!({"id": 4, "local": "Armazém 4"})).expect("option");
        assert_eq!(local.label, "Armazém 4");
        assert_eq!(local.id, "4");

        let tipo = ReferenceOption::normalize(OptionKind::Tipos, &json!({"id": "t1", "tipo": "Queda", "natureza_id": 2}))
            .expect("option");
        assert_eq!(tipo.parent_id.as_deref(), Some("2"));

        let fallback = ReferenceOption::normalize(OptionKind::Riscos, &json!({"id": 9, "titulo": "Ruído"})).expect("option");
        assert_eq!(fallback.label, "Ruído");

        let bare = ReferenceOption::normalize(OptionKind::Equipes, &json!({"id": 3})).expect("option");
        assert_eq!(bare.label, "3");

        assert!(ReferenceOption::normalize(OptionKind::Usuarios, &json!({"nome": "sem id"})).is_none());
    }

    #[test]
    fn filters_follow_parent_field() {
        let filter = OptionFilter::for_parent(OptionKind::Letras, "7").expect("dependent");
        assert_eq!(filter.to_query(), vec![("contrato_id".to_string(), "7".to_string())]);
        assert!(OptionFilter::for_parent(OptionKind::Locais, "7").is_none());
        assert_eq!(OptionKind::for_field("letra_id"), Some(OptionKind::Letras));
        assert_eq!(OptionKind::for_field("envolvidos_ids"), Some(OptionKind::Usuarios));
        assert_eq!(OptionKind::for_field("descricao"), None);
    }
}
