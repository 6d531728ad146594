//! Wizards concretos expresados como tablas de pasos. Cada módulo expone
//! `NAME`, `COLLECTION` (colección remota), `definition()` y el envío final.

pub mod incident;
pub mod inspection;
pub mod interaction;
