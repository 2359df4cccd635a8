use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{extract_resource_group, MetricFamily, MetricMutation};
use crate::ports::{CollectContext, CollectorError, MutationSink, ResourceApi, ResourceCollector};

/// Label value published for public IPs without an allocated address
const NOT_ALLOCATED: &str = "not allocated";

/// Translates public IP resources and feeds every allocated address into the
/// cycle's dedicated IP stream for the portscanner
pub struct PublicIpCollector {
    api: Arc<dyn ResourceApi>,
}

impl PublicIpCollector {
    pub fn new(api: Arc<dyn ResourceApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResourceCollector for PublicIpCollector {
    fn name(&self) -> &'static str {
        "publicip"
    }

    async fn collect(
        &self,
        ctx: &CollectContext,
        sink: &MutationSink,
    ) -> Result<(), CollectorError> {
        let subscription_id = &ctx.subscription.subscription_id;
        let ips = self
            .api
            .list_public_ips(subscription_id)
            .await
            .map_err(|e| CollectorError::degraded(self.name(), e))?;

        for ip in ips {
            let (address_label, value) = match ip.address {
                Some(address) => {
                    sink.track_ip(address);
                    (address.to_string(), 1.0)
                }
                None => (NOT_ALLOCATED.to_string(), 0.0),
            };

            sink.push(MetricMutation::new(
                MetricFamily::PublicIpInfo,
                vec![
                    ip.id.clone(),
                    subscription_id.clone(),
                    extract_resource_group(&ip.id),
                    ip.location,
                    address_label,
                    ip.allocation_method,
                    ip.version,
                ],
                value,
            ));
        }

        Ok(())
    }
}
