//! Eventos de sesión, trait EventStore y replay.

mod replay;
mod store;
mod types;

pub use replay::{replay_summary, SessionSummary};
pub use store::{EventStore, InMemoryEventStore};
pub use types::{SessionEvent, SessionEventKind};
