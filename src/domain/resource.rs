use std::net::IpAddr;

/// One remaining-request budget reported by the API via response headers
#[derive(Debug, Clone)]
pub struct RateLimit {
    pub scope: String,
    pub kind: String,
    pub remaining: f64,
}

/// Azure subscription with its policy fields and observed rate limits
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: String,
    pub subscription_id: String,
    pub display_name: String,
    pub spending_limit: String,
    pub quota_id: String,
    pub location_placement_id: String,
    pub rate_limits: Vec<RateLimit>,
}

#[derive(Debug, Clone)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct OsImage {
    pub publisher: String,
    pub sku: String,
    pub offer: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct VirtualMachine {
    pub id: String,
    pub vm_id: String,
    pub name: String,
    pub vm_type: String,
    pub location: String,
    pub size: String,
    pub provisioning_state: String,
    pub os: Option<OsImage>,
}

/// Public IP resource; `address` is None while the IP is not yet allocated
#[derive(Debug, Clone)]
pub struct PublicIp {
    pub id: String,
    pub location: String,
    pub address: Option<IpAddr>,
    pub allocation_method: String,
    pub version: String,
}

/// One quota usage entry for a location-scoped usage listing
#[derive(Debug, Clone)]
pub struct UsageValue {
    pub name: String,
    pub localized_name: String,
    pub current: f64,
    pub limit: f64,
}

/// Extract the resource group name from an ARM resource ID, e.g.
/// `/subscriptions/xxx/resourceGroups/my-rg/providers/...` -> `my-rg`.
/// Returns an empty string when the ID carries no resource group segment.
pub fn extract_resource_group(resource_id: &str) -> String {
    let mut segments = resource_id.split('/');

    while let Some(segment) = segments.next() {
        if segment.eq_ignore_ascii_case("resourceGroups") {
            return segments.next().unwrap_or_default().to_string();
        }
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_resource_group() {
        let id = "/subscriptions/5ab4bd2d/resourceGroups/my-rg/providers/Microsoft.Network/publicIPAddresses/ip1";
        assert_eq!(extract_resource_group(id), "my-rg");
    }

    #[test]
    fn test_extract_resource_group_case_insensitive() {
        let id = "/subscriptions/5ab4bd2d/resourcegroups/RG-Prod/providers/x";
        assert_eq!(extract_resource_group(id), "RG-Prod");
    }

    #[test]
    fn test_extract_resource_group_missing() {
        assert_eq!(extract_resource_group("/subscriptions/5ab4bd2d"), "");
    }
}
