use std::future::Future;
use std::time::Duration;

/// Runs `op` until it succeeds or `max_retries` extra attempts are spent.
///
/// `before_retry` receives each failure that will be retried and runs to
/// completion before the next attempt. It is called at most `max_retries`
/// times; if it fails, that error is returned and no further attempt is made.
pub async fn attempt<T, E, Op, OpFut, Hook, HookFut>(
    max_retries: u32,
    mut op: Op,
    mut before_retry: Hook,
) -> Result<T, E>
where
    Op: FnMut() -> OpFut,
    OpFut: Future<Output = Result<T, E>>,
    Hook: FnMut(E) -> HookFut,
    HookFut: Future<Output = Result<(), E>>,
{
    let mut retries = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if retries < max_retries => {
                retries += 1;
                before_retry(e).await?;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Bounds `fut` by `limit`, mapping expiry to `on_timeout`.
pub async fn with_deadline<T, E, F>(limit: Duration, fut: F, on_timeout: E) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout),
    }
}
