//! wizard-core: controlador de formularios multi-paso.
//!
//! Piezas:
//! - `model`: valores tipados, store con reinicio de dependientes.
//! - `validation`: reglas puras por campo.
//! - `step` / `engine`: definición declarativa de pasos, transiciones y
//!   controlador de sesión.
//! - `event`: log append-only de la sesión y replay.
//! - `shape`: payloads de borrador y de envío final.
//!
//! Sin I/O: la capa remota vive en `wizard-remote`.

pub mod completion;
pub mod constants;
pub mod context;
pub mod conversation;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod model;
pub mod shape;
pub mod step;
pub mod validation;

pub use completion::{CompletionCheck, RequiredFieldsCheck};
pub use context::{Permission, RequestContext};
pub use conversation::{parse_answer, Conversation, Prompt, Turn};
pub use engine::{FinalizeOutcome, FormSession, RemoteId, SessionStatus, StepOutcome, WizardController, WizardDefinition};
pub use errors::CoreEngineError;
pub use event::{replay_summary, EventStore, InMemoryEventStore, SessionEvent, SessionEventKind, SessionSummary};
pub use model::{Dependencies, FieldKind, FieldStore, FieldValue, SetResult};
pub use shape::{draft_fingerprint, draft_payload, restore_fields, restore_sections, visited_fields, FinalSubmission,
                RenamedSubmission};
pub use step::{FieldSpec, FormStep, StepDefinition, StepStatus, Transition};
pub use validation::{Rule, ValidationErrors};
