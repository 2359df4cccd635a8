use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{PublicIp, ResourceGroup, Subscription, UsageValue, VirtualMachine};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Missing credentials: {0}")]
    Credentials(String),
}

/// Port for the cloud management API.
///
/// Each method is one list/get call against the ResourceManager REST surface;
/// pagination and authentication renewal are the adapter's concern.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// List all subscriptions visible to the credential
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ApiError>;

    /// Get a single subscription, including its current rate-limit headers
    async fn get_subscription(&self, subscription_id: &str) -> Result<Subscription, ApiError>;

    /// List resource groups of a subscription
    async fn list_resource_groups(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<ResourceGroup>, ApiError>;

    /// List all virtual machines of a subscription
    async fn list_virtual_machines(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<VirtualMachine>, ApiError>;

    /// List all public IP addresses of a subscription
    async fn list_public_ips(&self, subscription_id: &str) -> Result<Vec<PublicIp>, ApiError>;

    /// List compute quota usage for one location
    async fn list_compute_usage(
        &self,
        subscription_id: &str,
        location: &str,
    ) -> Result<Vec<UsageValue>, ApiError>;

    /// List network quota usage for one location
    async fn list_network_usage(
        &self,
        subscription_id: &str,
        location: &str,
    ) -> Result<Vec<UsageValue>, ApiError>;

    /// List storage quota usage; the API reports this per subscription only
    async fn list_storage_usage(&self, subscription_id: &str)
        -> Result<Vec<UsageValue>, ApiError>;
}
