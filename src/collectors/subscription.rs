use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{MetricFamily, MetricMutation};
use crate::ports::{CollectContext, CollectorError, MutationSink, ResourceApi, ResourceCollector};

/// Translates the subscription resource itself plus the API's remaining
/// rate-limit budget read from the same response
pub struct SubscriptionCollector {
    api: Arc<dyn ResourceApi>,
}

impl SubscriptionCollector {
    pub fn new(api: Arc<dyn ResourceApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResourceCollector for SubscriptionCollector {
    fn name(&self) -> &'static str {
        "subscription"
    }

    async fn collect(
        &self,
        ctx: &CollectContext,
        sink: &MutationSink,
    ) -> Result<(), CollectorError> {
        let subscription_id = &ctx.subscription.subscription_id;
        let sub = self
            .api
            .get_subscription(subscription_id)
            .await
            .map_err(|e| CollectorError::degraded(self.name(), e))?;

        sink.push(MetricMutation::new(
            MetricFamily::SubscriptionInfo,
            vec![
                sub.id,
                sub.subscription_id.clone(),
                sub.display_name,
                sub.spending_limit,
                sub.quota_id,
                sub.location_placement_id,
            ],
            1.0,
        ));

        for limit in sub.rate_limits {
            sink.push(MetricMutation::new(
                MetricFamily::Ratelimit,
                vec![sub.subscription_id.clone(), limit.scope, limit.kind],
                limit.remaining,
            ));
        }

        Ok(())
    }
}
