/// Metric families published once per scrape cycle.
///
/// Each family is rebuilt from scratch by the result aggregator; the
/// descriptor (name, help, label names) is fixed at compile time so every
/// mutation for a family carries label values in descriptor order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricFamily {
    SubscriptionInfo,
    Ratelimit,
    ResourceGroupInfo,
    VmInfo,
    VmOs,
    PublicIpInfo,
    QuotaInfo,
    QuotaCurrent,
    QuotaLimit,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 9] = [
        MetricFamily::SubscriptionInfo,
        MetricFamily::Ratelimit,
        MetricFamily::ResourceGroupInfo,
        MetricFamily::VmInfo,
        MetricFamily::VmOs,
        MetricFamily::PublicIpInfo,
        MetricFamily::QuotaInfo,
        MetricFamily::QuotaCurrent,
        MetricFamily::QuotaLimit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MetricFamily::SubscriptionInfo => "azurerm_subscription_info",
            MetricFamily::Ratelimit => "azurerm_ratelimit",
            MetricFamily::ResourceGroupInfo => "azurerm_resourcegroup_info",
            MetricFamily::VmInfo => "azurerm_vm_info",
            MetricFamily::VmOs => "azurerm_vm_os",
            MetricFamily::PublicIpInfo => "azurerm_publicip_info",
            MetricFamily::QuotaInfo => "azurerm_quota_info",
            MetricFamily::QuotaCurrent => "azurerm_quota_current",
            MetricFamily::QuotaLimit => "azurerm_quota_limit",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            MetricFamily::SubscriptionInfo => "Azure ResourceManager subscription",
            MetricFamily::Ratelimit => "Azure ResourceManager ratelimit",
            MetricFamily::ResourceGroupInfo => "Azure ResourceManager resourcegroups",
            MetricFamily::VmInfo => "Azure ResourceManager VMs",
            MetricFamily::VmOs => "Azure ResourceManager VM OS",
            MetricFamily::PublicIpInfo => "Azure ResourceManager public ip",
            MetricFamily::QuotaInfo => "Azure ResourceManager quota info",
            MetricFamily::QuotaCurrent => "Azure ResourceManager quota current value",
            MetricFamily::QuotaLimit => "Azure ResourceManager quota limit",
        }
    }

    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            MetricFamily::SubscriptionInfo => &[
                "resourceID",
                "subscriptionID",
                "subscriptionName",
                "spendingLimit",
                "quotaID",
                "locationPlacementID",
            ],
            MetricFamily::Ratelimit => &["subscriptionID", "scope", "type"],
            MetricFamily::ResourceGroupInfo => {
                &["resourceID", "subscriptionID", "resourceGroup", "location"]
            }
            MetricFamily::VmInfo => &[
                "resourceID",
                "subscriptionID",
                "location",
                "resourceGroup",
                "vmID",
                "vmName",
                "vmType",
                "vmSize",
                "vmProvisioningState",
            ],
            MetricFamily::VmOs => &[
                "vmID",
                "imagePublisher",
                "imageSku",
                "imageOffer",
                "imageVersion",
            ],
            MetricFamily::PublicIpInfo => &[
                "resourceID",
                "subscriptionID",
                "resourceGroup",
                "location",
                "ipAddress",
                "ipAllocationMethod",
                "ipAddressVersion",
            ],
            MetricFamily::QuotaInfo => {
                &["subscriptionID", "location", "scope", "quota", "quotaName"]
            }
            MetricFamily::QuotaCurrent | MetricFamily::QuotaLimit => {
                &["subscriptionID", "location", "scope", "quota"]
            }
        }
    }
}

/// Portscan liveness family, rebuilt once per scan pass (not per scrape cycle)
pub const PORTSCAN_FAMILY_NAME: &str = "azurerm_publicip_portscan";
pub const PORTSCAN_FAMILY_HELP: &str = "Azure public IP open port";
pub const PORTSCAN_FAMILY_LABELS: [&str; 2] = ["ipAddress", "port"];

/// A buffered label-set/value update for one metric family.
///
/// Produced by collector tasks during a scrape cycle, applied exactly once
/// by the result aggregator after the whole cycle has joined. Label values
/// are positional, matching `family.labels()`.
#[derive(Debug, Clone)]
pub struct MetricMutation {
    pub family: MetricFamily,
    pub labels: Vec<String>,
    pub value: f64,
}

impl MetricMutation {
    pub fn new(family: MetricFamily, labels: Vec<String>, value: f64) -> Self {
        debug_assert_eq!(labels.len(), family.labels().len());
        Self {
            family,
            labels,
            value,
        }
    }
}
