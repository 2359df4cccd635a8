use std::net::IpAddr;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::{MetricMutation, Subscription};
use crate::ports::ApiError;

/// Collector task failure, with the severity decided by the task itself.
///
/// `Fatal` aborts the whole process (client/credential setup is broken beyond
/// this abstraction level); `Degraded` is logged by the orchestrator and the
/// task simply contributes no mutations this cycle.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("collector '{collector}' failed fatally: {source}")]
    Fatal {
        collector: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("collector '{collector}' degraded: {source}")]
    Degraded {
        collector: &'static str,
        #[source]
        source: ApiError,
    },
}

impl CollectorError {
    pub fn fatal(collector: &'static str, source: ApiError) -> Self {
        Self::Fatal { collector, source }
    }

    pub fn degraded(collector: &'static str, source: ApiError) -> Self {
        Self::Degraded { collector, source }
    }
}

/// Whether a collector runs once per subscription or once per
/// subscription x location pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorScope {
    Subscription,
    SubscriptionLocation,
}

/// Per-task view of the scrape cycle being collected
#[derive(Debug, Clone)]
pub struct CollectContext {
    pub subscription: Subscription,
    pub location: Option<String>,
}

/// Fan-in handle handed to every collector task of a cycle.
///
/// Mutations and discovered public IPs go to two separate streams; both are
/// unbounded so a task never blocks on emit before the join barrier runs.
#[derive(Clone)]
pub struct MutationSink {
    mutations: mpsc::UnboundedSender<MetricMutation>,
    ips: mpsc::UnboundedSender<IpAddr>,
}

impl MutationSink {
    pub fn new(
        mutations: mpsc::UnboundedSender<MetricMutation>,
        ips: mpsc::UnboundedSender<IpAddr>,
    ) -> Self {
        Self { mutations, ips }
    }

    /// Emit one deferred mutation. A send error means the cycle was dropped;
    /// the mutation is discarded with it.
    pub fn push(&self, mutation: MetricMutation) {
        let _ = self.mutations.send(mutation);
    }

    /// Report a discovered, allocated public IP for the portscanner
    pub fn track_ip(&self, address: IpAddr) {
        let _ = self.ips.send(address);
    }
}

/// Port for one resource-kind collector: queries the management API once per
/// (subscription[, location]) and translates the response into mutations.
#[async_trait]
pub trait ResourceCollector: Send + Sync {
    fn name(&self) -> &'static str;

    fn scope(&self) -> CollectorScope {
        CollectorScope::Subscription
    }

    async fn collect(
        &self,
        ctx: &CollectContext,
        sink: &MutationSink,
    ) -> Result<(), CollectorError>;
}
