use std::collections::HashSet;
use std::net::IpAddr;

use tracing::info;

use crate::application::scanner::ScannerHandle;

/// Hands one cycle's consolidated public IP set to the port scanner.
///
/// The call order is load-bearing: targets are replaced and stale results
/// purged before the scanner is re-armed, so a pass never runs against a
/// target set that is about to change.
pub struct PublicIpBridge {
    scanner: ScannerHandle,
}

impl PublicIpBridge {
    pub fn new(scanner: ScannerHandle) -> Self {
        Self { scanner }
    }

    pub fn complete_cycle(&self, ips: HashSet<IpAddr>) {
        info!(count = ips.len(), "collected public IPs");

        self.scanner.set_ips(ips);
        self.scanner.cleanup();
        self.scanner.enable();
    }
}
