//! Loader de opciones de referencia, last-request-wins por tipo.
//!
//! Cada carga toma un ticket (generación) del slot de su tipo. Al volver la
//! respuesta sólo se aplica si el ticket sigue siendo el último; si no, se
//! descarta como `Stale`. Chequeo y escritura ocurren bajo el lock de la
//! entrada del DashMap.
//!
//! Un fallo remoto nunca corta el wizard: la lista queda vacía y se emite
//! una notificación no bloqueante.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, warn};
use serde_json::Value;
use wizard_domain::{OptionFilter, OptionKind, ReferenceOption};

use crate::client::ApiClient;
use crate::error::RemoteError;
use crate::notify::{Notice, Notifier};

#[async_trait]
pub trait OptionSource: Send + Sync {
    async fn fetch(&self, kind: OptionKind, filter: &OptionFilter) -> Result<Vec<Value>, RemoteError>;
}

#[async_trait]
impl OptionSource for ApiClient {
    async fn fetch(&self, kind: OptionKind, filter: &OptionFilter) -> Result<Vec<Value>, RemoteError> {
        self.list(kind.collection(), &filter.to_query()).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(Vec<ReferenceOption>),
    /// Superada por una carga más reciente del mismo tipo; no se aplicó.
    Stale,
}

#[derive(Debug, Default)]
struct OptionSlot {
    generation: u64,
    filter: OptionFilter,
    options: Vec<ReferenceOption>,
}

pub struct OptionLoader<S: OptionSource> {
    source: S,
    slots: DashMap<OptionKind, OptionSlot>,
    notifier: Arc<dyn Notifier>,
}

impl<S: OptionSource> OptionLoader<S> {
    pub fn new(source: S, notifier: Arc<dyn Notifier>) -> Self {
        Self { source,
               slots: DashMap::new(),
               notifier }
    }

    pub fn source(&self) -> &S { &self.source }

    fn begin(&self, kind: OptionKind, filter: &OptionFilter) -> u64 {
        let mut slot = self.slots.entry(kind).or_default();
        slot.generation += 1;
        slot.filter = filter.clone();
        slot.generation
    }

    fn apply(&self, kind: OptionKind, ticket: u64, options: &[ReferenceOption]) -> bool {
        match self.slots.get_mut(&kind) {
            Some(mut slot) if slot.generation == ticket => {
                slot.options = options.to_vec();
                true
            }
            _ => false,
        }
    }

    pub async fn load(&self, kind: OptionKind, filter: OptionFilter) -> LoadOutcome {
        let ticket = self.begin(kind, &filter);
        debug!("options:load kind={kind:?} ticket={ticket} filter={:?}", filter.to_query());
        let result = self.source.fetch(kind, &filter).await;
        let (options, failure) = match result {
            Ok(raw) => (raw.iter().filter_map(|r| ReferenceOption::normalize(kind, r)).collect::<Vec<_>>(), None),
            Err(e) => (Vec::new(), Some(e)),
        };
        if !self.apply(kind, ticket, &options) {
            debug!("options:stale kind={kind:?} ticket={ticket}");
            return LoadOutcome::Stale;
        }
        if let Some(e) = failure {
            warn!("options:failed kind={kind:?} error={e}");
            self.notifier
                .notify(Notice::warning(format!("Não foi possível carregar {}", kind.collection())));
        }
        LoadOutcome::Applied(options)
    }

    /// Recarga una lista dependiente tras un cambio del padre. Sin padre la
    /// lista queda vacía sin ir a la red (e invalida cargas en vuelo).
    pub async fn load_dependent(&self, kind: OptionKind, parent_id: Option<&str>) -> LoadOutcome {
        if kind.parent_filter().is_none() {
            return self.load(kind, OptionFilter::new()).await;
        }
        match parent_id.and_then(|p| OptionFilter::for_parent(kind, p)) {
            Some(filter) => self.load(kind, filter).await,
            None => {
                let ticket = self.begin(kind, &OptionFilter::new());
                self.apply(kind, ticket, &[]);
                LoadOutcome::Applied(Vec::new())
            }
        }
    }

    /// Última lista aplicada para `kind`.
    pub fn current(&self, kind: OptionKind) -> Vec<ReferenceOption> {
        self.slots.get(&kind).map(|s| s.options.clone()).unwrap_or_default()
    }

    /// Filtro de la carga más reciente (aplicada o en vuelo).
    pub fn current_filter(&self, kind: OptionKind) -> Option<OptionFilter> { self.slots.get(&kind).map(|s| s.filter.clone()) }
}
