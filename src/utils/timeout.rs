use crate::error::{ProtocolError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default bound on a single frame read or write
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on dialing the game server
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Run `fut` with a deadline, mapping expiry to [`ProtocolError::Timeout`].
pub async fn with_timeout_error<F, T>(fut: F, duration: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => {
            debug!(timeout_ms = duration.as_millis() as u64, "Operation timed out");
            Err(ProtocolError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_expiry_maps_to_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        };
        let result = with_timeout_error(slow, Duration::from_millis(20)).await;
        assert!(matches!(result, Err(ProtocolError::Timeout)));
    }

    #[tokio::test]
    async fn test_inner_result_passes_through() {
        let ok = with_timeout_error(async { Ok(7u32) }, Duration::from_secs(1)).await;
        assert_eq!(ok.ok(), Some(7));

        let err = with_timeout_error(
            async { Err::<(), _>(ProtocolError::ConnectionClosed) },
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(err, Err(ProtocolError::ConnectionClosed)));
    }
}
