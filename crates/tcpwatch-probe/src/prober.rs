//! Single TCP reachability check.
//!
//! One connect attempt per call, no retry. Success reports the wall-clock
//! time from the start of the attempt to the completed handshake; name
//! resolution counts against the same timeout.

use std::future::Future;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::debug;

use tcpwatch_core::ProbeOutcome;

/// Something that can check whether `host:port` accepts connections.
///
/// Implementations must finish within roughly `timeout` and must not retry.
pub trait Prober: Send + Sync + 'static {
    fn probe(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = ProbeOutcome> + Send;
}

/// Production prober: a plain TCP connect.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProber;

impl Prober for TcpProber {
    async fn probe(&self, host: &str, port: u16, timeout: Duration) -> ProbeOutcome {
        tcp_probe(host, port, timeout).await
    }
}

/// Connect to `host:port` once and measure the connect latency.
pub async fn tcp_probe(host: &str, port: u16, timeout: Duration) -> ProbeOutcome {
    let start = Instant::now();

    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(mut stream)) => {
            let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
            // Orderly close is best effort.
            if let Err(e) = stream.shutdown().await {
                debug!(%host, port, error = %e, "shutdown after probe failed");
            }
            ProbeOutcome::Success { latency_ms }
        }
        Ok(Err(e)) => ProbeOutcome::Failure {
            message: e.to_string(),
        },
        Err(_) => ProbeOutcome::Failure {
            message: format!("timed out after {} ms", timeout.as_millis()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn probe_open_port_succeeds() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((_sock, _)) = listener.accept().await {}
        });

        let outcome = tcp_probe("127.0.0.1", port, Duration::from_secs(2)).await;
        match outcome {
            ProbeOutcome::Success { latency_ms } => assert!(latency_ms >= 0.0),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn probe_closed_port_fails_with_message() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let outcome = TcpProber
            .probe("127.0.0.1", port, Duration::from_secs(2))
            .await;
        match outcome {
            ProbeOutcome::Failure { message } => assert!(!message.is_empty()),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn probe_unresolvable_host_fails() {
        let outcome = tcp_probe("name.invalid", 22, Duration::from_secs(2)).await;
        assert!(!outcome.is_ok());
    }
}
