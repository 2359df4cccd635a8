use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::domain::ScanTarget;
use crate::ports::{ProbeError, Prober};

/// Production prober: a plain TCP connect bounded by the per-probe timeout
pub struct TcpProber;

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, target: ScanTarget, probe_timeout: Duration) -> Result<bool, ProbeError> {
        match timeout(probe_timeout, TcpStream::connect((target.address, target.port))).await {
            Ok(Ok(_stream)) => Ok(true),
            Ok(Err(e)) if is_unreachable(&e) => Ok(false),
            // local failure (fd exhaustion etc.), the probe was never attempted
            Ok(Err(e)) => Err(ProbeError { target, source: e }),
            Err(_elapsed) => Ok(false),
        }
    }
}

fn is_unreachable(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::TimedOut
            | ErrorKind::AddrNotAvailable
    )
}
