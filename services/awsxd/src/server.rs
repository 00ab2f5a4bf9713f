//! UDP listener feeding datagrams into the pipeline.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tracing::{debug, error, info};

use awsx_protocol::from_wire;

use crate::pipeline::ObservationPipeline;

/// Largest datagram accepted; AWS-X sentences are well under 200 bytes.
pub const MAX_DATAGRAM: usize = 2048;

/// Receives one datagram at a time and runs it through the pipeline before
/// reading the next.
pub struct UdpListener {
    socket: UdpSocket,
    pipeline: Arc<ObservationPipeline>,
}

impl UdpListener {
    pub async fn bind(host: &str, port: u16, pipeline: Arc<ObservationPipeline>) -> Result<Self> {
        let socket = UdpSocket::bind((host, port))
            .await
            .with_context(|| format!("Failed to bind UDP {}:{}", host, port))?;
        Ok(Self { socket, pipeline })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let verbosity = self.pipeline.config().verbosity;
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let mut backoff = RecvBackoff::default();
        tokio::pin!(shutdown);

        info!(addr = %self.local_addr()?, "Listening for AWS-X datagrams");

        loop {
            let received = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping listener");
                    break;
                }
                received = self.socket.recv_from(&mut buf) => received,
            };

            let (len, peer) = match received {
                Ok(received) => {
                    backoff.reset();
                    received
                }
                Err(e) => {
                    let delay = backoff.failed();
                    if backoff.should_log() {
                        error!(
                            error = %e,
                            consecutive = backoff.failures(),
                            retry_in_ms = delay.as_millis() as u64,
                            "Failed to receive datagram"
                        );
                    }
                    tokio::select! {
                        _ = &mut shutdown => {
                            info!("Shutdown requested, stopping listener");
                            break;
                        }
                        _ = tokio::time::sleep(delay) => continue,
                    }
                }
            };

            let text = from_wire(&buf[..len]);
            let frame = text.trim_matches(|c: char| c.is_ascii_whitespace());
            if verbosity > 1 {
                debug!("Received {} bytes from {}", len, peer.ip());
                debug!("{}", frame);
            }

            self.pipeline.process(frame, Some(peer)).await;
        }

        Ok(())
    }
}

/// Exponential pause between consecutive receive errors.
#[derive(Debug, Default)]
struct RecvBackoff {
    failures: u32,
}

impl RecvBackoff {
    const BASE: Duration = Duration::from_millis(50);
    const MAX: Duration = Duration::from_secs(5);

    /// Record a failure and return how long to wait before the next read.
    fn failed(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let shift = (self.failures - 1).min(16);
        Self::BASE.saturating_mul(1 << shift).min(Self::MAX)
    }

    fn reset(&mut self) {
        self.failures = 0;
    }

    fn failures(&self) -> u32 {
        self.failures
    }

    /// Log the 1st, 2nd, 4th, 8th... error of a run.
    fn should_log(&self) -> bool {
        self.failures.is_power_of_two()
    }
}
