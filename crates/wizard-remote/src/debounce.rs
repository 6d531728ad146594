//! Debounce cancel-and-reschedule.
//!
//! Cada `schedule` invalida el timer anterior (contador de generación). Un
//! timer vencido sólo ejecuta su trabajo si sigue siendo el último; el
//! trabajo lee el estado al dispararse, no al programarse. Un guardado ya en
//! vuelo no se aborta.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, warn};
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay,
               generation: Arc::new(AtomicU64::new(0)),
               pending: Mutex::new(None) }
    }

    pub fn delay(&self) -> Duration { self.delay }

    fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Programa `job` tras `delay`, reemplazando cualquier timer pendiente.
    /// Requiere un runtime de tokio activo.
    pub fn schedule<F, Fut>(&self, job: F)
        where F: FnOnce() -> Fut + Send + 'static,
              Fut: Future<Output = ()> + Send + 'static
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) != ticket {
                debug!("debounce:superseded ticket={ticket}");
                return;
            }
            job().await;
        });
        *self.pending() = Some(handle);
    }

    /// Invalida el timer pendiente sin esperar.
    pub fn cancel(&self) { self.generation.fetch_add(1, Ordering::SeqCst); }

    /// Espera al último trabajo programado, si lo hay.
    pub async fn flush(&self) {
        let handle = self.pending().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("debounce:job_failed {e}");
            }
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) { self.cancel(); }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn only_last_schedule_fires() {
        let debouncer = Debouncer::new(Duration::from_millis(1_000));
        let runs = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(AtomicUsize::new(0));
        for value in 1..=3 {
            let runs = Arc::clone(&runs);
            let seen = Arc::clone(&seen);
            debouncer.schedule(move || async move {
                         runs.fetch_add(1, Ordering::SeqCst);
                         seen.store(value, Ordering::SeqCst);
                     });
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        debouncer.flush().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_pending_job() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        debouncer.schedule(move || async move {
                     counter.fetch_add(1, Ordering::SeqCst);
                 });
        debouncer.cancel();
        debouncer.flush().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
