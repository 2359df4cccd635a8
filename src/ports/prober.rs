use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ScanTarget;

/// Local failure to attempt a probe at all (e.g. socket allocation).
/// Refused or timed-out connections are results, not errors.
#[derive(Debug, Error)]
#[error("probe {target} could not be attempted: {source}")]
pub struct ProbeError {
    pub target: ScanTarget,
    #[source]
    pub source: std::io::Error,
}

/// Port for a single reachability probe against one target
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    /// Returns whether the target accepted a connection within `timeout`
    async fn probe(&self, target: ScanTarget, timeout: Duration) -> Result<bool, ProbeError>;
}
