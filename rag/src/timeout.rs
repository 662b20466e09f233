//! Time budgets for external calls.

use std::future::Future;
use std::time::Duration;

use crate::error::{RagError, Result};

/// Runs a service call under a time limit.
///
/// Service errors are mapped with `wrap`; an expired limit becomes
/// [`RagError::Timeout`] naming `operation`.
pub(crate) async fn within<T, F>(
    operation: &'static str,
    after: Duration,
    future: F,
    wrap: fn(anyhow::Error) -> RagError,
) -> Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    tokio::time::timeout(after, future)
        .await
        .map_err(|_| RagError::Timeout { operation, after })?
        .map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, anyhow::Error>(1)
        };
        let err = within("embed", Duration::from_secs(5), slow, RagError::Embedding)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Timeout { operation: "embed", .. }));
        assert!(err.to_string().contains("embed timed out"));
    }

    #[tokio::test]
    async fn service_error_is_wrapped() {
        let failing = async { Err::<u8, _>(anyhow::anyhow!("quota exceeded")) };
        let err = within("generate", Duration::from_secs(5), failing, RagError::Generation)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Generation(_)));
    }

    #[tokio::test]
    async fn fast_call_passes_through() {
        let value = within("embed", Duration::from_secs(5), async { Ok(7) }, RagError::Embedding)
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
