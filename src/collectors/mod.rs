//! Per-resource-kind collector tasks.
//!
//! Each collector is a pure translator: one API call per subscription
//! (or subscription x location), copied field by field into label sets.

pub mod public_ip;
pub mod resource_group;
pub mod subscription;
pub mod usage;
pub mod vm;

use std::sync::Arc;

use crate::ports::{ResourceApi, ResourceCollector};

pub use public_ip::PublicIpCollector;
pub use resource_group::ResourceGroupCollector;
pub use subscription::SubscriptionCollector;
pub use usage::UsageCollector;
pub use vm::VmCollector;

/// The default collector set driven by the orchestrator each cycle
pub fn default_collectors(api: Arc<dyn ResourceApi>) -> Vec<Arc<dyn ResourceCollector>> {
    vec![
        Arc::new(SubscriptionCollector::new(Arc::clone(&api))),
        Arc::new(ResourceGroupCollector::new(Arc::clone(&api))),
        Arc::new(VmCollector::new(Arc::clone(&api))),
        Arc::new(PublicIpCollector::new(Arc::clone(&api))),
        Arc::new(UsageCollector::compute(Arc::clone(&api))),
        Arc::new(UsageCollector::network(Arc::clone(&api))),
        Arc::new(UsageCollector::storage(api)),
    ]
}
