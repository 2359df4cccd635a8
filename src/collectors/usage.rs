use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{MetricFamily, MetricMutation, UsageValue};
use crate::ports::{
    ApiError, CollectContext, CollectorError, CollectorScope, MutationSink, ResourceApi,
    ResourceCollector,
};

/// Quota provider behind one usage listing. All three share the same
/// info/current/limit translator shape; the storage listing is per
/// subscription only, its samples still carry the location label.
#[derive(Debug, Clone, Copy)]
enum QuotaProvider {
    Compute,
    Network,
    Storage,
}

impl QuotaProvider {
    fn collector_name(self) -> &'static str {
        match self {
            QuotaProvider::Compute => "computeusage",
            QuotaProvider::Network => "networkusage",
            QuotaProvider::Storage => "storageusage",
        }
    }

    fn scope_label(self) -> &'static str {
        match self {
            QuotaProvider::Compute => "compute",
            QuotaProvider::Network => "network",
            QuotaProvider::Storage => "storage",
        }
    }
}

/// Location-scoped quota translator: one info/current/limit triplet per quota
pub struct UsageCollector {
    api: Arc<dyn ResourceApi>,
    provider: QuotaProvider,
}

impl UsageCollector {
    pub fn compute(api: Arc<dyn ResourceApi>) -> Self {
        Self { api, provider: QuotaProvider::Compute }
    }

    pub fn network(api: Arc<dyn ResourceApi>) -> Self {
        Self { api, provider: QuotaProvider::Network }
    }

    pub fn storage(api: Arc<dyn ResourceApi>) -> Self {
        Self { api, provider: QuotaProvider::Storage }
    }

    async fn list(&self, subscription_id: &str, location: &str) -> Result<Vec<UsageValue>, ApiError> {
        match self.provider {
            QuotaProvider::Compute => self.api.list_compute_usage(subscription_id, location).await,
            QuotaProvider::Network => self.api.list_network_usage(subscription_id, location).await,
            QuotaProvider::Storage => self.api.list_storage_usage(subscription_id).await,
        }
    }
}

#[async_trait]
impl ResourceCollector for UsageCollector {
    fn name(&self) -> &'static str {
        self.provider.collector_name()
    }

    fn scope(&self) -> CollectorScope {
        CollectorScope::SubscriptionLocation
    }

    async fn collect(
        &self,
        ctx: &CollectContext,
        sink: &MutationSink,
    ) -> Result<(), CollectorError> {
        let subscription_id = &ctx.subscription.subscription_id;
        // scope() guarantees a location is always present
        let location = ctx.location.as_deref().unwrap_or_default();

        let usages = self
            .list(subscription_id, location)
            .await
            .map_err(|e| CollectorError::degraded(self.name(), e))?;

        for usage in usages {
            let key_labels = vec![
                subscription_id.clone(),
                location.to_string(),
                self.provider.scope_label().to_string(),
                usage.name.clone(),
            ];

            let mut info_labels = key_labels.clone();
            info_labels.push(usage.localized_name);

            sink.push(MetricMutation::new(MetricFamily::QuotaInfo, info_labels, 1.0));
            sink.push(MetricMutation::new(
                MetricFamily::QuotaCurrent,
                key_labels.clone(),
                usage.current,
            ));
            sink.push(MetricMutation::new(
                MetricFamily::QuotaLimit,
                key_labels,
                usage.limit,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use crate::domain::{PublicIp, ResourceGroup, Subscription, VirtualMachine};

    /// Stub API answering every usage listing with one fixed quota entry
    struct StubApi;

    fn quota(name: &str) -> Vec<UsageValue> {
        vec![UsageValue {
            name: name.to_string(),
            localized_name: format!("{name} (localized)"),
            current: 3.0,
            limit: 10.0,
        }]
    }

    #[async_trait]
    impl ResourceApi for StubApi {
        async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ApiError> {
            Ok(Vec::new())
        }

        async fn get_subscription(&self, _subscription_id: &str) -> Result<Subscription, ApiError> {
            Err(ApiError::Credentials("unused".to_string()))
        }

        async fn list_resource_groups(
            &self,
            _subscription_id: &str,
        ) -> Result<Vec<ResourceGroup>, ApiError> {
            Ok(Vec::new())
        }

        async fn list_virtual_machines(
            &self,
            _subscription_id: &str,
        ) -> Result<Vec<VirtualMachine>, ApiError> {
            Ok(Vec::new())
        }

        async fn list_public_ips(&self, _subscription_id: &str) -> Result<Vec<PublicIp>, ApiError> {
            Ok(Vec::new())
        }

        async fn list_compute_usage(
            &self,
            _subscription_id: &str,
            _location: &str,
        ) -> Result<Vec<UsageValue>, ApiError> {
            Ok(quota("cores"))
        }

        async fn list_network_usage(
            &self,
            _subscription_id: &str,
            _location: &str,
        ) -> Result<Vec<UsageValue>, ApiError> {
            Ok(quota("PublicIPAddresses"))
        }

        async fn list_storage_usage(
            &self,
            _subscription_id: &str,
        ) -> Result<Vec<UsageValue>, ApiError> {
            Ok(quota("StorageAccounts"))
        }
    }

    fn context(location: &str) -> CollectContext {
        CollectContext {
            subscription: Subscription {
                id: "/subscriptions/sub1".to_string(),
                subscription_id: "sub1".to_string(),
                display_name: "sub1".to_string(),
                spending_limit: String::new(),
                quota_id: String::new(),
                location_placement_id: String::new(),
                rate_limits: Vec::new(),
            },
            location: Some(location.to_string()),
        }
    }

    async fn collect_mutations(collector: UsageCollector) -> Vec<MetricMutation> {
        let (mutation_tx, mut mutation_rx) = mpsc::unbounded_channel();
        let (ip_tx, _ip_rx) = mpsc::unbounded_channel();
        let sink = MutationSink::new(mutation_tx, ip_tx);

        collector.collect(&context("westeurope"), &sink).await.unwrap();
        drop(sink);

        let mut mutations = Vec::new();
        while let Some(mutation) = mutation_rx.recv().await {
            mutations.push(mutation);
        }
        mutations
    }

    #[tokio::test]
    async fn test_network_usage_emits_scoped_triplet() {
        let mutations = collect_mutations(UsageCollector::network(Arc::new(StubApi))).await;

        assert_eq!(mutations.len(), 3);
        assert_eq!(mutations[0].family, MetricFamily::QuotaInfo);
        assert_eq!(
            mutations[0].labels,
            vec!["sub1", "westeurope", "network", "PublicIPAddresses", "PublicIPAddresses (localized)"]
        );
        assert_eq!(mutations[1].family, MetricFamily::QuotaCurrent);
        assert_eq!(mutations[1].value, 3.0);
        assert_eq!(mutations[2].family, MetricFamily::QuotaLimit);
        assert_eq!(mutations[2].value, 10.0);
    }

    #[tokio::test]
    async fn test_storage_usage_labels_the_context_location() {
        // the storage listing is subscription-wide; samples still carry the
        // location of the fan-out context
        let mutations = collect_mutations(UsageCollector::storage(Arc::new(StubApi))).await;

        assert_eq!(mutations.len(), 3);
        assert_eq!(
            mutations[1].labels,
            vec!["sub1", "westeurope", "storage", "StorageAccounts"]
        );
    }
}
