use std::future::Future;
use std::time::Duration;

use log::warn;

use crate::error::RemoteError;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(50);

/// Reintento con backoff lineal para operaciones idempotentes.
///
/// Política:
/// - Sólo errores `is_retryable()`.
/// - Backoff: 50ms, 100ms, 150ms...
/// - Logs: se emite `warn!` por intento.
pub async fn with_retry<F, Fut, T>(max_retries: u32, mut f: F) -> Result<T, RemoteError>
    where F: FnMut() -> Fut,
          Fut: Future<Output = Result<T, RemoteError>>
{
    let mut attempts = 0;
    loop {
        match f().await {
            Err(e) if e.is_retryable() && attempts < max_retries => {
                let delay = RETRY_BASE_DELAY * (attempts + 1);
                warn!("retryable error (attempt {}): {e} -> sleeping {}ms",
                      attempts + 1,
                      delay.as_millis());
                tokio::time::sleep(delay).await;
                attempts += 1;
            }
            r => return r,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_only() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(3, move || async move {
                         if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                             Err(RemoteError::Timeout)
                         } else {
                             Ok(7)
                         }
                     }).await;
        assert_eq!(result, Ok(7));
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry(3, move || async move {
                                        calls.fetch_add(1, Ordering::SeqCst);
                                        Err(RemoteError::NotFound("x".into()))
                                    }).await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
