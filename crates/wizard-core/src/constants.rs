//! Constantes del controlador de wizards.
//!
//! Los textos de error y los marcadores de estado viajan tal cual hacia la UI
//! y hacia la API remota, por eso se mantienen en un único lugar.

/// Versión lógica del formato de definición. Participa del `definition_hash`,
/// de modo que un cambio incompatible invalida borradores de otra versión.
pub const DEFINITION_VERSION: &str = "W1.0";

/// Mensaje para campos obligatorios sin valor.
pub const REQUIRED_MESSAGE: &str = "Campo obrigatório";

/// Mensaje para selecciones fuera de la lista de opciones declarada.
pub const INVALID_OPTION_MESSAGE: &str = "Opção inválida";

/// Clave del payload que transporta el estado del registro remoto.
pub const STATUS_KEY: &str = "status";

/// Clave del payload de borrador con el id del paso activo.
pub const CURRENT_STEP_KEY: &str = "etapa_atual";

/// Estado remoto de un borrador en curso.
pub const STATUS_DRAFT: &str = "em_andamento";

/// Estado remoto de un registro finalizado.
pub const STATUS_CONCLUDED: &str = "concluido";

/// Debounce por defecto entre la última edición y el guardado del borrador.
pub const DEFAULT_DEBOUNCE_MS: u64 = 1_000;

pub fn min_length_message(min: usize) -> String {
    format!("Mínimo de {min} caracteres")
}
