//! Safety Wizard
//!
//! Formularios guiados de gestión de seguridad (desvíos, interacciones,
//! inspecciones) con borradores remotos:
//! - `wizard_core`: controlador de pasos, validación y eventos, sin I/O.
//! - `wizard_domain`: definiciones concretas y checklist de inspección.
//! - `wizard_remote`: cliente HTTP, loader de opciones, borradores y runtime.

use std::sync::Arc;
use std::time::Duration;

pub use wizard_core;
pub use wizard_domain;
pub use wizard_remote;

use wizard_core::constants::DEFAULT_DEBOUNCE_MS;
use wizard_core::{InMemoryEventStore, RequestContext, WizardController, WizardDefinition};
use wizard_remote::{CollectingNotifier, InMemoryDraftGateway, WizardRuntime};

/// Sesión sin red: borradores en memoria y avisos acumulados.
pub struct OfflineSession {
    pub runtime: WizardRuntime<InMemoryDraftGateway>,
    pub gateway: Arc<InMemoryDraftGateway>,
    pub notices: Arc<CollectingNotifier>,
}

pub fn offline_session(definition: WizardDefinition, collection: &str, ctx: RequestContext) -> OfflineSession {
    let gateway = Arc::new(InMemoryDraftGateway::new());
    let notices = Arc::new(CollectingNotifier::new());
    let controller = WizardController::new(Arc::new(definition), InMemoryEventStore::default());
    let runtime = WizardRuntime::new(controller,
                                     Arc::clone(&gateway),
                                     collection,
                                     ctx,
                                     notices.clone(),
                                     Duration::from_millis(DEFAULT_DEBOUNCE_MS));
    OfflineSession { runtime,
                     gateway,
                     notices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wizard_domain::wizards::interaction;

    #[test]
    fn offline_session_starts_at_first_step() {
        let def = interaction::definition().expect("definition");
        let session = offline_session(def, interaction::COLLECTION, RequestContext::new("u", "t"));
        let step = tokio_test::block_on(session.runtime.read(|c| c.current_step().id().to_string()));
        assert_eq!(step, "dados");
        assert_eq!(session.gateway.count(interaction::COLLECTION), 0);
    }
}
