//! Local sockets and helper programs for sink tests.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::UdpSocket;

/// Bind a UDP socket on an ephemeral localhost port.
pub async fn udp_collector() -> (UdpSocket, SocketAddr) {
    let socket = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test UDP socket");
    let addr = socket.local_addr().expect("bound socket has no address");
    (socket, addr)
}

/// Receive one datagram as raw bytes, or `None` if nothing arrives in time.
pub async fn recv_bytes(socket: &UdpSocket, wait: Duration) -> Option<Vec<u8>> {
    let mut buf = vec![0u8; 2048];
    match tokio::time::timeout(wait, socket.recv_from(&mut buf)).await {
        Ok(Ok((len, _))) => {
            buf.truncate(len);
            Some(buf)
        }
        _ => None,
    }
}

/// Receive one datagram as text, or `None` if nothing arrives in time.
pub async fn recv_text(socket: &UdpSocket, wait: Duration) -> Option<String> {
    recv_bytes(socket, wait)
        .await
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// A localhost address nothing listens on (bound then released).
pub fn unused_local_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind spare port");
    listener.local_addr().expect("spare socket has no address")
}

/// Write an executable shell script into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("failed to write script");
    let mut perms = std::fs::metadata(&path)
        .expect("script vanished")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("failed to chmod script");
    path
}

/// Temporary directory removed on drop.
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}
