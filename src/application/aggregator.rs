use std::collections::HashMap;
use std::sync::Arc;

use prometheus::{GaugeVec, Opts, Registry};
use tracing::{error, warn};

use crate::adapters::SnapshotStore;
use crate::domain::{MetricFamily, MetricMutation};

/// Fan-in consumer for one finished scrape cycle.
///
/// Replays the cycle's buffered mutations into a private registry and swaps
/// it into the exposition path in one assignment. The reset-to-replay window
/// of the original in-place scheme is gone: readers see the previous cycle
/// until the new one is complete.
pub struct ResultAggregator {
    store: Arc<SnapshotStore>,
}

impl ResultAggregator {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self { store }
    }

    /// Apply all mutations of a finished cycle as the new metric state
    pub fn apply_cycle(&self, mutations: Vec<MetricMutation>) {
        match build_registry(mutations) {
            Ok(registry) => self.store.publish_resources(registry),
            // registration of the static descriptors failed; keep the old state
            Err(e) => error!(error = %e, "failed to build metric state, keeping previous cycle"),
        }
    }
}

fn build_registry(mutations: Vec<MetricMutation>) -> Result<Registry, prometheus::Error> {
    let registry = Registry::new();
    let mut families: HashMap<MetricFamily, GaugeVec> = HashMap::new();

    for family in MetricFamily::ALL {
        let gauge = GaugeVec::new(Opts::new(family.name(), family.help()), family.labels())?;
        registry.register(Box::new(gauge.clone()))?;
        families.insert(family, gauge);
    }

    for mutation in mutations {
        let labels: Vec<&str> = mutation.labels.iter().map(String::as_str).collect();
        // mutation order within a cycle is arbitrary; label sets are distinct
        match families[&mutation.family].get_metric_with_label_values(&labels) {
            Ok(gauge) => gauge.set(mutation.value),
            Err(e) => warn!(
                family = mutation.family.name(),
                error = %e,
                "dropping mutation with mismatched labels"
            ),
        }
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gauge_values(store: &SnapshotStore, family: MetricFamily) -> Vec<f64> {
        store
            .gather()
            .iter()
            .filter(|f| f.get_name() == family.name())
            .flat_map(|f| f.get_metric().iter().map(|m| m.get_gauge().get_value()))
            .collect()
    }

    #[test]
    fn test_replay_publishes_all_mutations() {
        let store = Arc::new(SnapshotStore::new());
        let aggregator = ResultAggregator::new(Arc::clone(&store));

        aggregator.apply_cycle(vec![
            MetricMutation::new(
                MetricFamily::Ratelimit,
                vec!["sub1".into(), "subscription".into(), "read".into()],
                11999.0,
            ),
            MetricMutation::new(
                MetricFamily::Ratelimit,
                vec!["sub1".into(), "tenant".into(), "read".into()],
                14999.0,
            ),
        ]);

        let mut values = gauge_values(&store, MetricFamily::Ratelimit);
        values.sort_by(f64::total_cmp);
        assert_eq!(values, vec![11999.0, 14999.0]);
    }

    #[test]
    fn test_next_cycle_replaces_previous_state() {
        let store = Arc::new(SnapshotStore::new());
        let aggregator = ResultAggregator::new(Arc::clone(&store));

        let labels = |rg: &str| {
            vec![
                format!("/subscriptions/s/resourceGroups/{rg}"),
                "s".to_string(),
                rg.to_string(),
                "westeurope".to_string(),
            ]
        };

        aggregator.apply_cycle(vec![
            MetricMutation::new(MetricFamily::ResourceGroupInfo, labels("old-a"), 1.0),
            MetricMutation::new(MetricFamily::ResourceGroupInfo, labels("old-b"), 1.0),
        ]);
        assert_eq!(gauge_values(&store, MetricFamily::ResourceGroupInfo).len(), 2);

        // a resource deleted between cycles ages out with the swap
        aggregator.apply_cycle(vec![MetricMutation::new(
            MetricFamily::ResourceGroupInfo,
            labels("new"),
            1.0,
        )]);
        assert_eq!(gauge_values(&store, MetricFamily::ResourceGroupInfo).len(), 1);
    }

    #[test]
    fn test_mismatched_labels_are_dropped_not_fatal() {
        let store = Arc::new(SnapshotStore::new());
        let aggregator = ResultAggregator::new(Arc::clone(&store));

        aggregator.apply_cycle(vec![
            MetricMutation {
                family: MetricFamily::Ratelimit,
                labels: vec!["only-one".into()],
                value: 1.0,
            },
            MetricMutation::new(
                MetricFamily::Ratelimit,
                vec!["sub1".into(), "subscription".into(), "read".into()],
                5.0,
            ),
        ]);

        assert_eq!(gauge_values(&store, MetricFamily::Ratelimit), vec![5.0]);
    }
}
