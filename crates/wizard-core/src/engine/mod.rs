//! Motor del wizard: definición inmutable (pasos + dependencias), sesión
//! mutable y controlador que aplica las transiciones.

pub mod builder;
pub mod controller;
pub mod definition;
pub mod session;

pub use builder::{DefinitionBuilder, DefinitionBuilderInit};
pub use controller::{FinalizeOutcome, StepOutcome, WizardController};
pub use definition::{build_wizard_definition, WizardDefinition};
pub use session::{FormSession, RemoteId, SessionStatus};
