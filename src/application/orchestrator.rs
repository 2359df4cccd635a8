use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::application::aggregator::ResultAggregator;
use crate::application::bridge::PublicIpBridge;
use crate::domain::Subscription;
use crate::ports::{
    CollectContext, CollectorError, CollectorScope, MutationSink, ResourceCollector,
};

/// Top-level scrape driver: one cycle per tick.
///
/// Every cycle fans out one task per (subscription, collector) pair (per
/// (subscription, location, collector) for location-scoped collectors), then
/// joins them all before the cycle's results are applied. Fatal task failures
/// propagate out of `run`; degraded ones only cost their own mutations.
pub struct Orchestrator {
    interval: Duration,
    subscriptions: Vec<Subscription>,
    locations: Vec<String>,
    collectors: Vec<Arc<dyn ResourceCollector>>,
    aggregator: ResultAggregator,
    bridge: Option<PublicIpBridge>,
}

impl Orchestrator {
    pub fn new(
        interval: Duration,
        subscriptions: Vec<Subscription>,
        locations: Vec<String>,
        collectors: Vec<Arc<dyn ResourceCollector>>,
        aggregator: ResultAggregator,
        bridge: Option<PublicIpBridge>,
    ) -> Self {
        Self {
            interval,
            subscriptions,
            locations,
            collectors,
            aggregator,
            bridge,
        }
    }

    /// Drive scrape cycles forever. Returns only on a fatal collector error.
    pub async fn run(self) -> Result<(), CollectorError> {
        let mut ticker = tokio::time::interval(self.interval);
        // single-flight: a tick firing while the previous cycle still runs is
        // skipped, so two cycles can never interleave their aggregation
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.run_cycle().await?;
        }
    }

    /// One scrape cycle: fan out, join, aggregate, arm the scanner
    pub async fn run_cycle(&self) -> Result<(), CollectorError> {
        let started = Instant::now();

        // unbounded fan-in streams: tasks never block on emit, so the join
        // barrier below can run before anything is drained
        let (mutation_tx, mut mutation_rx) = mpsc::unbounded_channel();
        let (ip_tx, mut ip_rx) = mpsc::unbounded_channel();
        let sink = MutationSink::new(mutation_tx, ip_tx);

        let mut tasks: JoinSet<Result<(), CollectorError>> = JoinSet::new();
        for subscription in &self.subscriptions {
            debug!(
                subscription = %subscription.subscription_id,
                "starting metrics collection"
            );
            for collector in &self.collectors {
                for ctx in self.contexts_for(collector.as_ref(), subscription) {
                    let collector = Arc::clone(collector);
                    let sink = sink.clone();
                    tasks.spawn(async move {
                        let result = collector.collect(&ctx, &sink).await;
                        debug!(
                            collector = collector.name(),
                            subscription = %ctx.subscription.subscription_id,
                            "finished collection"
                        );
                        result
                    });
                }
            }
        }
        let spawned = tasks.len();
        drop(sink);

        // join barrier: wait for all spawned tasks to report completion
        let mut fatal = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e @ CollectorError::Degraded { .. })) => {
                    warn!(error = %e, "collection degraded, no mutations this cycle");
                }
                Ok(Err(e @ CollectorError::Fatal { .. })) => fatal = Some(e),
                Err(join_error) => {
                    warn!(error = %join_error, "collector task panicked");
                }
            }
        }
        if let Some(e) = fatal {
            return Err(e);
        }

        // every sender is dropped, both streams are closed; drain this
        // cycle's buffered output and nothing else
        let mut mutations = Vec::new();
        while let Some(mutation) = mutation_rx.recv().await {
            mutations.push(mutation);
        }
        let mut ips: HashSet<_> = HashSet::new();
        while let Some(ip) = ip_rx.recv().await {
            ips.insert(ip);
        }

        info!(
            tasks = spawned,
            mutations = mutations.len(),
            public_ips = ips.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scrape cycle finished"
        );

        self.aggregator.apply_cycle(mutations);
        if let Some(bridge) = &self.bridge {
            bridge.complete_cycle(ips);
        }

        Ok(())
    }

    fn contexts_for(
        &self,
        collector: &dyn ResourceCollector,
        subscription: &Subscription,
    ) -> Vec<CollectContext> {
        match collector.scope() {
            CollectorScope::Subscription => vec![CollectContext {
                subscription: subscription.clone(),
                location: None,
            }],
            CollectorScope::SubscriptionLocation => self
                .locations
                .iter()
                .map(|location| CollectContext {
                    subscription: subscription.clone(),
                    location: Some(location.clone()),
                })
                .collect(),
        }
    }
}
