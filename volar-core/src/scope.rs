use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::{CoreResult, ReservationError};

/// Runs a gateway call inside a view's lifetime. Once `scope` is cancelled the
/// call is abandoned and resolves to [`ReservationError::Cancelled`].
pub async fn run_scoped<F, T>(scope: &CancellationToken, call: F) -> CoreResult<T>
where
    F: Future<Output = CoreResult<T>>,
{
    if scope.is_cancelled() {
        return Err(ReservationError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = scope.cancelled() => Err(ReservationError::Cancelled),
        result = call => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completed_call_passes_through() {
        let scope = CancellationToken::new();
        let result = run_scoped(&scope, async { Ok::<_, ReservationError>(5) }).await;
        assert_eq!(result, Ok(5));
    }

    #[tokio::test]
    async fn test_cancelled_scope_abandons_pending_call() {
        let scope = CancellationToken::new();
        let child = scope.child_token();
        let pending = tokio::spawn(async move {
            run_scoped(&child, std::future::pending::<CoreResult<()>>()).await
        });

        scope.cancel();
        let result = pending.await.unwrap();
        assert_eq!(result, Err(ReservationError::Cancelled));
    }

    #[tokio::test]
    async fn test_already_cancelled_scope_never_polls_call() {
        let scope = CancellationToken::new();
        scope.cancel();
        let polled = std::sync::atomic::AtomicBool::new(false);
        let result = run_scoped(&scope, async {
            polled.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok::<(), ReservationError>(())
        })
        .await;
        assert_eq!(result, Err(ReservationError::Cancelled));
        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
    }
}
