use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use prometheus::{GaugeVec, Opts, Registry};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::adapters::SnapshotStore;
use crate::domain::{
    PortRange, ScanResult, ScanTarget, PORTSCAN_FAMILY_HELP, PORTSCAN_FAMILY_LABELS,
    PORTSCAN_FAMILY_NAME,
};
use crate::ports::Prober;

/// External mutations of the scanner state; routed as mailbox messages so
/// they serialize against scan passes instead of racing them.
#[derive(Debug)]
pub(crate) enum ScannerCommand {
    SetIps(HashSet<IpAddr>),
    Cleanup,
    Enable,
}

/// Cheap cloneable handle to the scanner actor
#[derive(Clone)]
pub struct ScannerHandle {
    tx: mpsc::UnboundedSender<ScannerCommand>,
}

impl ScannerHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<ScannerCommand>) -> Self {
        Self { tx }
    }

    /// Replace the scanner's target IP set
    pub fn set_ips(&self, ips: HashSet<IpAddr>) {
        let _ = self.tx.send(ScannerCommand::SetIps(ips));
    }

    /// Drop results whose address is no longer tracked
    pub fn cleanup(&self) {
        let _ = self.tx.send(ScannerCommand::Cleanup);
    }

    /// Permit scan passes. Idempotent: the actor loop is the only loop, so
    /// re-enabling can never start a second one.
    pub fn enable(&self) {
        let _ = self.tx.send(ScannerCommand::Enable);
    }
}

#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Cadence of the scan loop, independent of the scrape interval
    pub interval: Duration,
    /// Outer limit: IP addresses scanned concurrently
    pub parallel: usize,
    /// Inner limit: ports probed concurrently per IP
    pub threads: usize,
    /// Hard per-probe connection timeout
    pub timeout: Duration,
    pub ranges: Vec<PortRange>,
}

struct ScannerState {
    target_ips: HashSet<IpAddr>,
    enabled: bool,
    results: HashMap<ScanTarget, ScanResult>,
}

/// Port scanner engine: an actor owning all scanner state.
///
/// Created disabled with an empty target set; the bridge arms it once per
/// scrape cycle via SetIps/Cleanup/Enable. Commands received while a pass is
/// in flight wait in the mailbox, so Cleanup never removes entries a running
/// pass is about to write.
pub struct PortScanner {
    settings: ScanSettings,
    prober: Arc<dyn Prober>,
    store: Arc<SnapshotStore>,
    state: ScannerState,
}

impl PortScanner {
    pub fn new(settings: ScanSettings, prober: Arc<dyn Prober>, store: Arc<SnapshotStore>) -> Self {
        Self {
            settings,
            prober,
            store,
            state: ScannerState {
                target_ips: HashSet::new(),
                enabled: false,
                results: HashMap::new(),
            },
        }
    }

    /// Start the actor loop and hand back its command mailbox
    pub fn spawn(self) -> ScannerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(self.run(rx));
        ScannerHandle::new(tx)
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ScannerCommand>) {
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.state.enabled {
                        self.run_pass().await;
                    }
                }
                command = rx.recv() => match command {
                    Some(command) => self.handle(command),
                    // all handles dropped, shut the loop down
                    None => break,
                }
            }
        }
    }

    fn handle(&mut self, command: ScannerCommand) {
        match command {
            ScannerCommand::SetIps(ips) => {
                debug!(count = ips.len(), "portscanner target IPs replaced");
                self.state.target_ips = ips;
            }
            ScannerCommand::Cleanup => {
                let before = self.state.results.len();
                let ScannerState {
                    target_ips,
                    results,
                    ..
                } = &mut self.state;
                // scoped to whole addresses, never individual results
                results.retain(|target, _| target_ips.contains(&target.address));
                debug!(
                    removed = before - self.state.results.len(),
                    "portscanner stale results purged"
                );
            }
            ScannerCommand::Enable => {
                if !self.state.enabled {
                    info!("portscanner enabled");
                }
                self.state.enabled = true;
            }
        }
    }

    /// One scan pass over targetIPs x port ranges with two-tier bounded
    /// concurrency: at most parallel x threads probes in flight.
    async fn run_pass(&mut self) {
        let ports: Vec<u16> = self
            .settings
            .ranges
            .iter()
            .flat_map(|range| range.ports())
            .collect();
        let ips: Vec<IpAddr> = self.state.target_ips.iter().copied().collect();

        if ips.is_empty() || ports.is_empty() {
            debug!("portscan pass skipped, nothing to scan");
            return;
        }

        let started = Instant::now();
        let timeout = self.settings.timeout;
        let threads = self.settings.threads.max(1);
        let prober = Arc::clone(&self.prober);

        let results: Vec<ScanResult> = stream::iter(ips)
            .map(|address| {
                let ports = ports.clone();
                let prober = Arc::clone(&prober);
                async move {
                    stream::iter(ports)
                        .map(|port| {
                            let prober = Arc::clone(&prober);
                            async move {
                                let target = ScanTarget::new(address, port);
                                match prober.probe(target, timeout).await {
                                    Ok(reachable) => Some(ScanResult::new(target, reachable)),
                                    Err(e) => {
                                        warn!(target = %target, error = %e, "probe skipped");
                                        None
                                    }
                                }
                            }
                        })
                        .buffer_unordered(threads)
                        .filter_map(|result| async move { result })
                        .collect::<Vec<_>>()
                        .await
                }
            })
            .buffer_unordered(self.settings.parallel.max(1))
            .collect::<Vec<Vec<_>>>()
            .await
            .into_iter()
            .flatten()
            .collect();

        let open = results.iter().filter(|r| r.reachable).count();
        let scanned = results.len();
        for result in results {
            self.state.results.insert(result.target, result);
        }

        self.publish();

        info!(
            targets = scanned,
            open,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "portscan pass finished"
        );
    }

    /// Rebuild and swap the liveness family from all current results
    fn publish(&self) {
        let registry = Registry::new();
        let gauge = match GaugeVec::new(
            Opts::new(PORTSCAN_FAMILY_NAME, PORTSCAN_FAMILY_HELP),
            &PORTSCAN_FAMILY_LABELS,
        ) {
            Ok(gauge) => gauge,
            Err(e) => {
                error!(error = %e, "failed to build portscan family");
                return;
            }
        };
        if let Err(e) = registry.register(Box::new(gauge.clone())) {
            error!(error = %e, "failed to register portscan family");
            return;
        }

        for result in self.state.results.values() {
            let value = if result.reachable { 1.0 } else { 0.0 };
            let address = result.target.address.to_string();
            let port = result.target.port.to_string();
            match gauge.get_metric_with_label_values(&[address.as_str(), port.as_str()]) {
                Ok(metric) => metric.set(value),
                Err(e) => warn!(target = %result.target, error = %e, "dropping scan result"),
            }
        }

        self.store.publish_portscan(registry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::ports::ProbeError;

    /// Prober answering from a fixed set of open targets, with concurrency
    /// accounting for the cap test
    struct FakeProber {
        open: HashSet<ScanTarget>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        probes: AtomicUsize,
    }

    impl FakeProber {
        fn new(open: impl IntoIterator<Item = ScanTarget>) -> Arc<Self> {
            Arc::new(Self {
                open: open.into_iter().collect(),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                probes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Prober for FakeProber {
        async fn probe(&self, target: ScanTarget, _timeout: Duration) -> Result<bool, ProbeError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            self.probes.fetch_add(1, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(10)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(self.open.contains(&target))
        }
    }

    fn settings(ranges: Vec<PortRange>, parallel: usize, threads: usize) -> ScanSettings {
        ScanSettings {
            interval: Duration::from_secs(60),
            parallel,
            threads,
            timeout: Duration::from_millis(200),
            ranges,
        }
    }

    fn target(address: &str, port: u16) -> ScanTarget {
        ScanTarget::new(address.parse().unwrap(), port)
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_records_every_target() {
        // spec scenario: 10.0.0.5, ports 20-22, only 22 listening
        let prober = FakeProber::new([target("10.0.0.5", 22)]);
        let store = Arc::new(SnapshotStore::new());
        let mut scanner = PortScanner::new(
            settings(vec![PortRange { first: 20, last: 22 }], 2, 10),
            prober,
            Arc::clone(&store),
        );
        scanner.handle(ScannerCommand::SetIps(
            ["10.0.0.5".parse().unwrap()].into(),
        ));

        scanner.run_pass().await;

        assert_eq!(scanner.state.results.len(), 3);
        assert!(!scanner.state.results[&target("10.0.0.5", 20)].reachable);
        assert!(!scanner.state.results[&target("10.0.0.5", 21)].reachable);
        assert!(scanner.state.results[&target("10.0.0.5", 22)].reachable);

        let text = store.encode().unwrap();
        assert!(text.contains(r#"azurerm_publicip_portscan{ipAddress="10.0.0.5",port="22"} 1"#));
        assert!(text.contains(r#"azurerm_publicip_portscan{ipAddress="10.0.0.5",port="20"} 0"#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_probes_bounded_by_both_tiers() {
        let prober = FakeProber::new([]);
        let store = Arc::new(SnapshotStore::new());
        let mut scanner = PortScanner::new(
            settings(vec![PortRange { first: 1, last: 10 }], 2, 3),
            Arc::clone(&prober) as Arc<dyn Prober>,
            store,
        );
        scanner.handle(ScannerCommand::SetIps(
            (1..=4u8).map(|n| format!("10.0.0.{n}").parse().unwrap()).collect(),
        ));

        scanner.run_pass().await;

        assert_eq!(prober.probes.load(Ordering::SeqCst), 40);
        assert!(prober.max_in_flight.load(Ordering::SeqCst) <= 2 * 3);
    }

    #[tokio::test]
    async fn test_cleanup_scoped_to_addresses() {
        let prober = FakeProber::new([]);
        let store = Arc::new(SnapshotStore::new());
        let mut scanner = PortScanner::new(
            settings(vec![PortRange { first: 80, last: 81 }], 1, 1),
            prober,
            store,
        );

        for t in [
            target("10.0.0.1", 80),
            target("10.0.0.1", 81),
            target("10.0.0.2", 80),
        ] {
            scanner.state.results.insert(t, ScanResult::new(t, false));
        }

        scanner.handle(ScannerCommand::SetIps(["10.0.0.1".parse().unwrap()].into()));
        scanner.handle(ScannerCommand::Cleanup);

        assert_eq!(scanner.state.results.len(), 2);
        assert!(scanner
            .state
            .results
            .keys()
            .all(|t| t.address == "10.0.0.1".parse::<IpAddr>().unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_twice_keeps_a_single_loop() {
        let prober = FakeProber::new([]);
        let scanner = PortScanner::new(
            settings(vec![PortRange { first: 80, last: 80 }], 1, 1),
            Arc::clone(&prober) as Arc<dyn Prober>,
            Arc::new(SnapshotStore::new()),
        );
        let handle = scanner.spawn();

        handle.set_ips(["10.0.0.1".parse().unwrap()].into());
        handle.enable();
        handle.enable();

        // settle past the immediate first tick, then observe exactly one
        // more tick's worth of passes
        tokio::time::sleep(Duration::from_secs(1)).await;
        let settled = prober.probes.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(prober.probes.load(Ordering::SeqCst), settled + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_scanner_never_scans() {
        let prober = FakeProber::new([]);
        let scanner = PortScanner::new(
            settings(vec![PortRange { first: 80, last: 80 }], 1, 1),
            Arc::clone(&prober) as Arc<dyn Prober>,
            Arc::new(SnapshotStore::new()),
        );
        let handle = scanner.spawn();
        handle.set_ips(["10.0.0.1".parse().unwrap()].into());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(prober.probes.load(Ordering::SeqCst), 0);
    }
}
