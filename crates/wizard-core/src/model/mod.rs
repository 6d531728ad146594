//! Modelo de datos del formulario: valores tipados, store y grafo de
//! dependencias entre campos.

pub mod dependency;
pub mod store;
pub mod value;

pub use dependency::Dependencies;
pub use store::{FieldStore, SetResult};
pub use value::{FieldKind, FieldValue};
