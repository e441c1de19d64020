//! TCP connect primitive.
//!
//! Uses the operating system's socket API to complete a full handshake.
//! No special privileges are required.

use crate::error::{ScanError, ScanResult};
use crate::scanner::traits::{Connector, PortStatus};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Connector backed by `tokio::net::TcpStream`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, addr: SocketAddr, limit: Duration) -> ScanResult<TcpStream> {
        match timeout(limit, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(classify_connect_error(addr, e)),
            Err(_) => Err(ScanError::Timeout),
        }
    }
}

fn classify_connect_error(addr: SocketAddr, e: std::io::Error) -> ScanError {
    if e.kind() == ErrorKind::ConnectionRefused {
        return ScanError::ConnectionRefused;
    }
    let text = e.to_string().to_lowercase();
    if text.contains("refused") {
        ScanError::ConnectionRefused
    } else if text.contains("unreachable") {
        if text.contains("host") {
            ScanError::HostUnreachable
        } else {
            ScanError::NetworkUnreachable(e.to_string())
        }
    } else {
        ScanError::ConnectionFailed {
            target: addr.ip().to_string(),
            port: addr.port(),
            reason: e.to_string(),
        }
    }
}

/// Map a failed attempt to the status it implies.
pub fn status_for_error(e: &ScanError) -> PortStatus {
    match e {
        ScanError::Timeout | ScanError::HostUnreachable | ScanError::NetworkUnreachable(_) => {
            PortStatus::Filtered
        }
        _ => PortStatus::Closed,
    }
}
