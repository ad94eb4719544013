use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct Config {
    pub metrics_path: String,
    pub node_exclude_prefix: Option<String>,
    pub default_page_size: usize,
    pub cluster_name: Option<String>,
}

/// A warning event attached to the workload object that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningSummary {
    pub message: String,
    pub reason: String,
    #[serde(rename = "type")]
    pub type_: String,
}

/// List envelope metadata: total after filtering, plus the pagination that
/// produced the returned page (absent when the query was unpaginated).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    pub total_items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_per_page: Option<usize>,
}

/// Aggregate pod state for a controller-managed workload.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodInfo {
    pub current: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired: Option<i32>,
    pub running: i32,
    pub pending: i32,
    pub failed: i32,
    pub succeeded: i32,
    pub warnings: Vec<WarningSummary>,
}

/// Running/pending/failed breakdown across the items of one list call.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    pub running: i32,
    pub pending: i32,
    pub failed: i32,
}

/// Workload condition as exposed on detail views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub last_transition_time: Option<DateTime<Utc>>,
    pub last_probe_time: Option<DateTime<Utc>>,
}

/// Cluster-wide health numbers derived from one metrics scrape.
/// Recomputed on every request; never cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterHealthSnapshot {
    pub cpu_used_cores: f64,
    pub cpu_capacity_cores: f64,
    pub cpu_usage_percent: f64,
    #[serde(rename = "memoryUsedGiB")]
    pub memory_used_gib: f64,
    #[serde(rename = "memoryTotalGiB")]
    pub memory_total_gib: f64,
    pub memory_usage_percent: f64,
    pub node_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReadiness {
    pub ready: i32,
    pub unready: i32,
}
