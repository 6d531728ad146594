//! Forma de los payloads remotos.
//!
//! Borrador: todos los campos + secciones + `status = em_andamento` +
//! `etapa_atual`. Final: lo decide cada wizard vía `FinalSubmission`
//! (renombres, listas derivadas) con `status = concluido`, y sólo incluye
//! campos de pasos visitados.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::completion::CompletionCheck;
use crate::constants::{CURRENT_STEP_KEY, STATUS_CONCLUDED, STATUS_DRAFT, STATUS_KEY};
use crate::engine::{FormSession, WizardDefinition};
use crate::hashing::hash_value;
use crate::model::{FieldStore, FieldValue};

pub fn draft_payload(definition: &WizardDefinition, session: &FormSession) -> Value {
    let mut map = session.fields().to_json();
    for (key, value) in session.sections() {
        map.insert(key.clone(), value.clone());
    }
    map.insert(STATUS_KEY.to_string(), Value::from(STATUS_DRAFT));
    if let Some(step) = definition.step(session.current_step()) {
        map.insert(CURRENT_STEP_KEY.to_string(), Value::from(step.id()));
    }
    Value::Object(map)
}

/// Hash del payload canónico. Dos borradores iguales producen el mismo
/// fingerprint y el segundo guardado se omite.
pub fn draft_fingerprint(payload: &Value) -> String { hash_value(payload) }

/// Reconstruye el store desde un borrador remoto. Sólo toma claves
/// declaradas y con la forma esperada; devuelve también `etapa_atual`.
pub fn restore_fields(definition: &WizardDefinition, payload: &Value) -> (FieldStore, Option<String>) {
    let mut store = FieldStore::with_dependencies(definition.dependencies().clone());
    let Some(map) = payload.as_object() else {
        return (store, None);
    };
    for spec in definition.steps().flat_map(|s| s.fields()) {
        if let Some(value) = map.get(&spec.key).and_then(|raw| FieldValue::from_json(&spec.kind, raw)) {
            store.insert_raw(&spec.key, value);
        }
    }
    let step = map.get(CURRENT_STEP_KEY).and_then(Value::as_str).map(str::to_string);
    (store, step)
}

/// Secciones declaradas presentes en un borrador remoto.
pub fn restore_sections(definition: &WizardDefinition, payload: &Value) -> BTreeMap<String, Value> {
    definition.sections()
              .iter()
              .filter_map(|key| payload.get(key).map(|value| (key.clone(), value.clone())))
              .collect()
}

/// Campos de los pasos del camino recorrido (historial + actual). Los datos
/// de ramas abandonadas quedan en el store pero no se envían: nunca pasaron
/// por la validación final.
pub fn visited_fields(definition: &WizardDefinition, session: &FormSession) -> Map<String, Value> {
    let visited = session.visited();
    let fields = session.fields();
    definition.owned_by(&visited)
              .into_iter()
              .filter_map(|spec| fields.get(&spec.key).map(|value| (spec.key.clone(), value.to_json())))
              .collect()
}

/// Payload de envío final de un wizard concreto.
pub trait FinalSubmission: Send + Sync {
    /// Chequeos de dominio que deben pasar antes del envío.
    fn checks(&self) -> Vec<&dyn CompletionCheck> { Vec::new() }

    fn final_payload(&self, definition: &WizardDefinition, session: &FormSession) -> Value;
}

/// Envío final = campos con claves renombradas + `status = concluido`.
#[derive(Debug, Clone, Default)]
pub struct RenamedSubmission {
    renames: Vec<(String, String)>,
}

impl RenamedSubmission {
    pub fn new() -> Self { Self::default() }

    pub fn rename(mut self, from: &str, to: &str) -> Self {
        self.renames.push((from.to_string(), to.to_string()));
        self
    }

    pub fn apply(&self, fields: Map<String, Value>) -> Map<String, Value> {
        fields.into_iter()
              .map(|(key, value)| {
                  let key = self.renames
                                .iter()
                                .find(|(from, _)| *from == key)
                                .map(|(_, to)| to.clone())
                                .unwrap_or(key);
                  (key, value)
              })
              .collect()
    }
}

impl FinalSubmission for RenamedSubmission {
    fn final_payload(&self, definition: &WizardDefinition, session: &FormSession) -> Value {
        let mut map = self.apply(visited_fields(definition, session));
        map.insert(STATUS_KEY.to_string(), Value::from(STATUS_CONCLUDED));
        Value::Object(map)
    }
}
