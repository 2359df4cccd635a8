use std::sync::{Arc, RwLock};

use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Registry, TextEncoder};

/// Atomically-swapped metric state read by the exposition endpoint.
///
/// Each writer (result aggregator, portscanner) builds a fresh fully-populated
/// `Registry` and publishes it with a single pointer swap, so a concurrent
/// scrape sees either the previous cycle's state or the new one, never the
/// empty window between reset and replay.
pub struct SnapshotStore {
    resources: RwLock<Arc<Registry>>,
    portscan: RwLock<Arc<Registry>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            resources: RwLock::new(Arc::new(Registry::new())),
            portscan: RwLock::new(Arc::new(Registry::new())),
        }
    }

    /// Replace the resource metric state with a finished cycle's registry
    pub fn publish_resources(&self, registry: Registry) {
        *self.resources.write().unwrap() = Arc::new(registry);
    }

    /// Replace the portscan metric state with a finished pass's registry
    pub fn publish_portscan(&self, registry: Registry) {
        *self.portscan.write().unwrap() = Arc::new(registry);
    }

    /// Gather both snapshots for exposition
    pub fn gather(&self) -> Vec<MetricFamily> {
        let resources = Arc::clone(&self.resources.read().unwrap());
        let portscan = Arc::clone(&self.portscan.read().unwrap());

        let mut families = resources.gather();
        families.extend(portscan.gather());
        families
    }

    /// Encode the current state in the Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{GaugeVec, Opts};

    fn registry_with_gauge(name: &str, value: f64) -> Registry {
        let registry = Registry::new();
        let gauge = GaugeVec::new(Opts::new(name, "test gauge"), &["label"]).unwrap();
        registry.register(Box::new(gauge.clone())).unwrap();
        gauge.with_label_values(&["a"]).set(value);
        registry
    }

    #[test]
    fn test_swap_replaces_previous_state() {
        let store = SnapshotStore::new();
        assert!(store.gather().is_empty());

        store.publish_resources(registry_with_gauge("azurerm_test", 1.0));
        let families = store.gather();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].get_metric()[0].get_gauge().get_value(), 1.0);

        store.publish_resources(registry_with_gauge("azurerm_test", 2.0));
        let families = store.gather();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].get_metric()[0].get_gauge().get_value(), 2.0);
    }

    #[test]
    fn test_portscan_and_resources_are_independent() {
        let store = SnapshotStore::new();
        store.publish_resources(registry_with_gauge("azurerm_vm_info", 1.0));
        store.publish_portscan(registry_with_gauge("azurerm_publicip_portscan", 0.0));

        assert_eq!(store.gather().len(), 2);

        // replacing the portscan side leaves resources untouched
        store.publish_portscan(Registry::new());
        let families = store.gather();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].get_name(), "azurerm_vm_info");
    }

    #[test]
    fn test_encode_text_format() {
        let store = SnapshotStore::new();
        store.publish_resources(registry_with_gauge("azurerm_test", 1.0));

        let text = store.encode().unwrap();
        assert!(text.contains("# TYPE azurerm_test gauge"));
        assert!(text.contains("azurerm_test{label=\"a\"} 1"));
    }
}
