pub mod metrics;
pub mod portrange;
pub mod resource;
pub mod scan;

pub use metrics::{
    MetricFamily, MetricMutation, PORTSCAN_FAMILY_HELP, PORTSCAN_FAMILY_LABELS,
    PORTSCAN_FAMILY_NAME,
};
pub use portrange::{parse_port_ranges, ConfigError, PortRange};
pub use resource::{
    extract_resource_group, OsImage, PublicIp, RateLimit, ResourceGroup, Subscription, UsageValue,
    VirtualMachine,
};
pub use scan::{ScanResult, ScanTarget};
