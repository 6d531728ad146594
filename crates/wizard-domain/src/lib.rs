//! wizard-domain: dominio de gestión de seguridad sobre `wizard-core`.
//!
//! - `option`: tipos de datos de referencia y normalización de opciones.
//! - `checklist`: preguntas de inspección, respuestas y planes de acción.
//! - `wizards`: definiciones concretas (desvio, interacao, inspecao).

pub mod checklist;
pub mod errors;
pub mod option;
pub mod wizards;

pub use checklist::{action_items, ActionItem, ActionStatus, Answer, BlockingActionPlanCheck, InspectionChecklist, Priority, Question};
pub use errors::DomainError;
pub use option::{OptionFilter, OptionKind, ReferenceOption};
pub use wizards::inspection::InspectionSubmission;
