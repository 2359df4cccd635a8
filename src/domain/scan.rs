use std::net::IpAddr;

use chrono::{DateTime, Utc};

/// An (address, port) pair subject to a reachability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanTarget {
    pub address: IpAddr,
    pub port: u16,
}

impl ScanTarget {
    pub fn new(address: IpAddr, port: u16) -> Self {
        Self { address, port }
    }
}

impl std::fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Outcome of one probe against one target
#[derive(Debug, Clone, Copy)]
pub struct ScanResult {
    pub target: ScanTarget,
    pub reachable: bool,
    pub observed_at: DateTime<Utc>,
}

impl ScanResult {
    pub fn new(target: ScanTarget, reachable: bool) -> Self {
        Self {
            target,
            reachable,
            observed_at: Utc::now(),
        }
    }
}
