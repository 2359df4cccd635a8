use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{MetricFamily, MetricMutation};
use crate::ports::{CollectContext, CollectorError, MutationSink, ResourceApi, ResourceCollector};

pub struct ResourceGroupCollector {
    api: Arc<dyn ResourceApi>,
}

impl ResourceGroupCollector {
    pub fn new(api: Arc<dyn ResourceApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResourceCollector for ResourceGroupCollector {
    fn name(&self) -> &'static str {
        "resourcegroup"
    }

    async fn collect(
        &self,
        ctx: &CollectContext,
        sink: &MutationSink,
    ) -> Result<(), CollectorError> {
        let subscription_id = &ctx.subscription.subscription_id;
        let groups = self
            .api
            .list_resource_groups(subscription_id)
            .await
            .map_err(|e| CollectorError::degraded(self.name(), e))?;

        for group in groups {
            sink.push(MetricMutation::new(
                MetricFamily::ResourceGroupInfo,
                vec![group.id, subscription_id.clone(), group.name, group.location],
                1.0,
            ));
        }

        Ok(())
    }
}
