//! wizard-remote: borde HTTP del wizard.
//!
//! Cliente JSON con envoltorio `{success, data}`, loader de opciones con
//! descarte de respuestas viejas, gateway de borradores (HTTP y en memoria),
//! debounce de guardado, adjuntos en dos fases y el `WizardRuntime` que une
//! controlador y gateway.

pub mod attachments;
pub mod client;
pub mod config;
pub mod debounce;
pub mod error;
pub mod gateway;
pub mod loader;
pub mod notify;
pub mod retry;
pub mod runtime;

pub use attachments::{Attachment, Attachments, RegisteredAttachment};
pub use client::ApiClient;
pub use config::ApiConfig;
pub use debounce::Debouncer;
pub use error::RemoteError;
pub use gateway::{DraftGateway, HttpDraftGateway, InMemoryDraftGateway};
pub use loader::{LoadOutcome, OptionLoader, OptionSource};
pub use notify::{CollectingNotifier, LogNotifier, Notice, NoticeLevel, Notifier};
pub use runtime::{FinalizeResult, WizardRuntime};
