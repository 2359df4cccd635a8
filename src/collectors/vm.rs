use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{extract_resource_group, MetricFamily, MetricMutation};
use crate::ports::{CollectContext, CollectorError, MutationSink, ResourceApi, ResourceCollector};

/// Emits one `azurerm_vm_info` per machine plus an `azurerm_vm_os` entry
/// keyed by vmID when the machine carries an image reference
pub struct VmCollector {
    api: Arc<dyn ResourceApi>,
}

impl VmCollector {
    pub fn new(api: Arc<dyn ResourceApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResourceCollector for VmCollector {
    fn name(&self) -> &'static str {
        "vm"
    }

    async fn collect(
        &self,
        ctx: &CollectContext,
        sink: &MutationSink,
    ) -> Result<(), CollectorError> {
        let subscription_id = &ctx.subscription.subscription_id;
        let machines = self
            .api
            .list_virtual_machines(subscription_id)
            .await
            .map_err(|e| CollectorError::degraded(self.name(), e))?;

        for vm in machines {
            sink.push(MetricMutation::new(
                MetricFamily::VmInfo,
                vec![
                    vm.id.clone(),
                    subscription_id.clone(),
                    vm.location,
                    extract_resource_group(&vm.id),
                    vm.vm_id.clone(),
                    vm.name,
                    vm.vm_type,
                    vm.size,
                    vm.provisioning_state,
                ],
                1.0,
            ));

            if let Some(os) = vm.os {
                sink.push(MetricMutation::new(
                    MetricFamily::VmOs,
                    vec![vm.vm_id, os.publisher, os.sku, os.offer, os.version],
                    1.0,
                ));
            }
        }

        Ok(())
    }
}
