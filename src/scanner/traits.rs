//! Connector abstraction.
//!
//! The scanner and the banner grabber never open sockets themselves; they go
//! through a [`Connector`], which lets tests substitute an instrumented fake.

use crate::error::ScanResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// Outcome of a single connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    /// Handshake completed.
    Open,
    /// Refused or failed outright.
    Closed,
    /// No answer within the timeout, or unreachable.
    Filtered,
}

impl PortStatus {
    /// Only a completed handshake counts as open; everything else is
    /// reported the same way.
    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Filtered => write!(f, "filtered"),
        }
    }
}

/// A TCP connect primitive with a per-call timeout.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Byte stream produced by a successful connect.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connect to `addr`, giving up after `timeout`.
    async fn connect(&self, addr: SocketAddr, timeout: Duration) -> ScanResult<Self::Stream>;
}
