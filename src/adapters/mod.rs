pub mod arm;
pub mod probe;
pub mod store;

pub use arm::ArmClient;
pub use probe::TcpProber;
pub use store::SnapshotStore;
