pub mod aggregator;
pub mod bridge;
pub mod orchestrator;
pub mod scanner;

pub use aggregator::ResultAggregator;
pub use bridge::PublicIpBridge;
pub use orchestrator::Orchestrator;
pub use scanner::{PortScanner, ScanSettings, ScannerHandle};
