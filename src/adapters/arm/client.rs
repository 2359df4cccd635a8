use std::env;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{
    OsImage, PublicIp, RateLimit, ResourceGroup, Subscription, UsageValue, VirtualMachine,
};
use crate::ports::{ApiError, ResourceApi};

const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

const API_VERSION_SUBSCRIPTIONS: &str = "2016-06-01";
const API_VERSION_RESOURCE_GROUPS: &str = "2018-05-01";
const API_VERSION_COMPUTE: &str = "2018-06-01";
const API_VERSION_NETWORK: &str = "2018-07-01";
const API_VERSION_STORAGE: &str = "2018-07-01";

/// Rate-limit response headers surfaced as `azurerm_ratelimit` samples
const RATELIMIT_HEADERS: [(&str, &str, &str); 6] = [
    ("x-ms-ratelimit-remaining-subscription-reads", "subscription", "read"),
    ("x-ms-ratelimit-remaining-subscription-resource-requests", "subscription", "resource-requests"),
    ("x-ms-ratelimit-remaining-subscription-resource-entities-read", "subscription", "resource-entities-read"),
    ("x-ms-ratelimit-remaining-tenant-reads", "tenant", "read"),
    ("x-ms-ratelimit-remaining-tenant-resource-requests", "tenant", "resource-requests"),
    ("x-ms-ratelimit-remaining-tenant-resource-entities-read", "tenant", "resource-entities-read"),
];

/// Thin ResourceManager REST adapter.
///
/// Authentication is out of scope here: the adapter takes a ready bearer
/// token (`AZURE_ACCESS_TOKEN`) and every call is a single unpaginated GET.
pub struct ArmClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl ArmClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    pub fn from_env() -> Result<Self, ApiError> {
        let token = env::var("AZURE_ACCESS_TOKEN")
            .map_err(|_| ApiError::Credentials("AZURE_ACCESS_TOKEN not set".to_string()))?;
        let endpoint =
            env::var("AZURE_RESOURCE_MANAGER_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());

        Ok(Self::new(endpoint, token))
    }

    async fn get(&self, path: &str, api_version: &str) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}?api-version={}", self.endpoint, path, api_version);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<T, ApiError> {
        Ok(self.get(path, api_version).await?.json().await?)
    }
}

fn rate_limits_from_headers(headers: &reqwest::header::HeaderMap) -> Vec<RateLimit> {
    RATELIMIT_HEADERS
        .iter()
        .filter_map(|(header, scope, kind)| {
            let remaining: f64 = headers.get(*header)?.to_str().ok()?.parse().ok()?;
            Some(RateLimit {
                scope: scope.to_string(),
                kind: kind.to_string(),
                remaining,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionDto {
    id: String,
    subscription_id: String,
    display_name: String,
    #[serde(default)]
    subscription_policies: SubscriptionPoliciesDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionPoliciesDto {
    #[serde(default)]
    location_placement_id: String,
    #[serde(default)]
    quota_id: String,
    #[serde(default)]
    spending_limit: String,
}

impl SubscriptionDto {
    fn into_domain(self, rate_limits: Vec<RateLimit>) -> Subscription {
        Subscription {
            id: self.id,
            subscription_id: self.subscription_id,
            display_name: self.display_name,
            spending_limit: self.subscription_policies.spending_limit,
            quota_id: self.subscription_policies.quota_id,
            location_placement_id: self.subscription_policies.location_placement_id,
            rate_limits,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResourceGroupDto {
    id: String,
    name: String,
    location: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VirtualMachineDto {
    id: String,
    name: String,
    #[serde(rename = "type")]
    vm_type: String,
    location: String,
    properties: VmPropertiesDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VmPropertiesDto {
    #[serde(default)]
    vm_id: String,
    #[serde(default)]
    provisioning_state: String,
    #[serde(default)]
    hardware_profile: HardwareProfileDto,
    #[serde(default)]
    storage_profile: StorageProfileDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardwareProfileDto {
    #[serde(default)]
    vm_size: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageProfileDto {
    image_reference: Option<ImageReferenceDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageReferenceDto {
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    sku: String,
    #[serde(default)]
    offer: String,
    #[serde(default)]
    version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicIpDto {
    id: String,
    location: String,
    properties: PublicIpPropertiesDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicIpPropertiesDto {
    ip_address: Option<String>,
    // the API spells these with an uppercase "IP"
    #[serde(default, rename = "publicIPAllocationMethod")]
    public_ip_allocation_method: String,
    #[serde(default, rename = "publicIPAddressVersion")]
    public_ip_address_version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageDto {
    name: UsageNameDto,
    current_value: f64,
    limit: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageNameDto {
    value: String,
    localized_value: String,
}

impl UsageDto {
    fn into_domain(self) -> UsageValue {
        UsageValue {
            name: self.name.value,
            localized_name: self.name.localized_value,
            current: self.current_value,
            limit: self.limit,
        }
    }
}

#[async_trait]
impl ResourceApi for ArmClient {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ApiError> {
        let listing: Listing<SubscriptionDto> = self
            .get_json("/subscriptions", API_VERSION_SUBSCRIPTIONS)
            .await?;

        Ok(listing
            .value
            .into_iter()
            .map(|dto| dto.into_domain(Vec::new()))
            .collect())
    }

    async fn get_subscription(&self, subscription_id: &str) -> Result<Subscription, ApiError> {
        let path = format!("/subscriptions/{}", subscription_id);
        let response = self.get(&path, API_VERSION_SUBSCRIPTIONS).await?;
        let rate_limits = rate_limits_from_headers(response.headers());
        let dto: SubscriptionDto = response.json().await?;

        Ok(dto.into_domain(rate_limits))
    }

    async fn list_resource_groups(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<ResourceGroup>, ApiError> {
        let path = format!("/subscriptions/{}/resourcegroups", subscription_id);
        let listing: Listing<ResourceGroupDto> =
            self.get_json(&path, API_VERSION_RESOURCE_GROUPS).await?;

        Ok(listing
            .value
            .into_iter()
            .map(|dto| ResourceGroup {
                id: dto.id,
                name: dto.name,
                location: dto.location,
            })
            .collect())
    }

    async fn list_virtual_machines(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<VirtualMachine>, ApiError> {
        let path = format!(
            "/subscriptions/{}/providers/Microsoft.Compute/virtualMachines",
            subscription_id
        );
        let listing: Listing<VirtualMachineDto> = self.get_json(&path, API_VERSION_COMPUTE).await?;

        Ok(listing
            .value
            .into_iter()
            .map(|dto| VirtualMachine {
                id: dto.id,
                vm_id: dto.properties.vm_id,
                name: dto.name,
                vm_type: dto.vm_type,
                location: dto.location,
                size: dto.properties.hardware_profile.vm_size,
                provisioning_state: dto.properties.provisioning_state,
                os: dto.properties.storage_profile.image_reference.map(|img| OsImage {
                    publisher: img.publisher,
                    sku: img.sku,
                    offer: img.offer,
                    version: img.version,
                }),
            })
            .collect())
    }

    async fn list_public_ips(&self, subscription_id: &str) -> Result<Vec<PublicIp>, ApiError> {
        let path = format!(
            "/subscriptions/{}/providers/Microsoft.Network/publicIPAddresses",
            subscription_id
        );
        let listing: Listing<PublicIpDto> = self.get_json(&path, API_VERSION_NETWORK).await?;

        Ok(listing
            .value
            .into_iter()
            .map(|dto| PublicIp {
                id: dto.id,
                location: dto.location,
                // the API reports addresses as strings; unparsable means unusable
                address: dto.properties.ip_address.and_then(|a| a.parse().ok()),
                allocation_method: dto.properties.public_ip_allocation_method,
                version: dto.properties.public_ip_address_version,
            })
            .collect())
    }

    async fn list_compute_usage(
        &self,
        subscription_id: &str,
        location: &str,
    ) -> Result<Vec<UsageValue>, ApiError> {
        let path = format!(
            "/subscriptions/{}/providers/Microsoft.Compute/locations/{}/usages",
            subscription_id, location
        );
        let listing: Listing<UsageDto> = self.get_json(&path, API_VERSION_COMPUTE).await?;

        Ok(listing.value.into_iter().map(UsageDto::into_domain).collect())
    }

    async fn list_network_usage(
        &self,
        subscription_id: &str,
        location: &str,
    ) -> Result<Vec<UsageValue>, ApiError> {
        let path = format!(
            "/subscriptions/{}/providers/Microsoft.Network/locations/{}/usages",
            subscription_id, location
        );
        let listing: Listing<UsageDto> = self.get_json(&path, API_VERSION_NETWORK).await?;

        Ok(listing.value.into_iter().map(UsageDto::into_domain).collect())
    }

    async fn list_storage_usage(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<UsageValue>, ApiError> {
        let path = format!("/subscriptions/{}/providers/Microsoft.Storage/usages", subscription_id);
        let listing: Listing<UsageDto> = self.get_json(&path, API_VERSION_STORAGE).await?;

        Ok(listing.value.into_iter().map(UsageDto::into_domain).collect())
    }
}
