use std::future::Future;

use rocket::tokio::time::{sleep, Duration};

use crate::error::{Error, Result};

/// How many times a store operation is attempted before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// Base delay between attempts; attempt `n` waits `n` times this.
const BACKOFF: Duration = Duration::from_millis(50);

/// Run `op`, retrying transient store faults with linear backoff.
///
/// Non-transient errors are returned straight away. A transient fault that
/// survives [`MAX_ATTEMPTS`] attempts becomes [`Error::StoreUnavailable`].
pub async fn with_retry<T, F, Fut>(what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(err) if err.is_transient() => {
                if attempt >= MAX_ATTEMPTS {
                    error!("{what}: giving up after {attempt} attempts: {err}");
                    return Err(Error::StoreUnavailable(format!("{what}: {err}")));
                }
                warn!("{what}: transient store fault on attempt {attempt}, retrying: {err}");
                sleep(BACKOFF * attempt).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use mongodb::error::Error as DbError;

    use super::*;

    fn io_fault() -> Error {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        Error::Db(DbError::from(io))
    }

    #[rocket::async_test]
    async fn transient_faults_are_retried_then_surface() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry("test op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(io_fault()) }
        })
        .await;
        assert!(matches!(result, Err(Error::StoreUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[rocket::async_test]
    async fn recovery_within_budget_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test op", || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(io_fault())
                } else {
                    Ok(call)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 1);
    }

    #[rocket::async_test]
    async fn business_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry("test op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::NoActiveSession) }
        })
        .await;
        assert!(matches!(result, Err(Error::NoActiveSession)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
