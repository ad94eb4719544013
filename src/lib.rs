// Public modules
pub mod types;
pub mod config;
pub mod error;
pub mod fanout;
pub mod query;
pub mod events;
pub mod cluster;
pub mod resources;

// Re-export commonly used items
pub use types::*;
pub use config::{
    load_config, load_config_with_env, EnvironmentProvider, MockEnvironment, SystemEnvironment,
};
pub use error::EngineError;
pub use fanout::{list_channel, FetchSlot, NamespaceScope, ResourceChannels};
pub use query::{run_query, ComparableValue, PropertyAccessor, ResourceQuery};
pub use events::{cluster_warning_events, fill_events_type, pods_event_warnings, resource_events};
pub use cluster::{
    aggregate_health, cluster_health, cluster_version, fetch_cluster_metrics, node_readiness,
    SampleExclusion,
};
pub use resources::ResourceCell;
