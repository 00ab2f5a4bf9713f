//! UDP replication of accepted sentences.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use tokio::net::{lookup_host, UdpSocket};
use tracing::debug;

use awsx_protocol::Observation;

use super::{ReplicationSink, SinkError};
use crate::config::ReplicationTarget;

/// Sends every observation, re-encoded with a fresh checksum, as a single
/// datagram to a fixed host and port.
pub struct UdpReplicator {
    target: ReplicationTarget,
}

impl UdpReplicator {
    pub fn new(target: ReplicationTarget) -> Self {
        Self { target }
    }

    async fn send(&self, datagram: &[u8]) -> io::Result<SocketAddr> {
        let addr = lookup_host((self.target.host.as_str(), self.target.port))
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} did not resolve", self.target.host),
                )
            })?;

        let local = if addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local).await?;

        let sent = socket.send_to(datagram, addr).await?;
        if sent != datagram.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {} of {} bytes", sent, datagram.len()),
            ));
        }
        Ok(addr)
    }
}

#[async_trait]
impl ReplicationSink for UdpReplicator {
    fn target(&self) -> String {
        self.target.to_string()
    }

    async fn replicate(&self, observation: &Observation) -> Result<(), SinkError> {
        let sentence = observation.to_sentence();
        let addr = self
            .send(&awsx_protocol::to_wire(&sentence))
            .await
            .map_err(|source| SinkError::Replication {
                target: self.target.to_string(),
                source,
            })?;

        debug!(dest = %addr, sentence = %sentence, "Packet replicated");
        Ok(())
    }
}
