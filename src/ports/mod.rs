pub mod collector;
pub mod prober;
pub mod resource_api;

pub use collector::{
    CollectContext, CollectorError, CollectorScope, MutationSink, ResourceCollector,
};
pub use prober::{ProbeError, Prober};
pub use resource_api::{ApiError, ResourceApi};
