use http::Request as HttpRequest;
use k8s_openapi::api::core::v1::Node;
use kube::{api::ListParams, Api, Client};
use prometheus_parse::{Sample, Scrape, Value};
use tracing::info;

use crate::error::EngineError;
use crate::fanout::FetchSlot;
use crate::types::{ClusterHealthSnapshot, Config, NodeReadiness};

const POD_CPU_REQUESTS: &str = "kube_pod_container_resource_requests_cpu_cores";
const NODE_CPU_CAPACITY: &str = "kube_node_status_capacity_cpu_cores";
const POD_MEMORY_REQUESTS: &str = "kube_pod_container_resource_requests_memory_bytes";
const NODE_MEMORY_ALLOCATABLE: &str = "kube_node_status_allocatable_memory_bytes";
const NODE_INFO: &str = "kube_node_info";

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Predicate deciding which samples to leave out of the health sums, keyed
/// on the sample's `node` label. Off by default; excluding control-plane
/// nodes is an explicit opt-in through configuration.
#[derive(Debug, Clone, Default)]
pub struct SampleExclusion {
    node_prefix: Option<String>,
}

impl SampleExclusion {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn node_prefix(prefix: impl Into<String>) -> Self {
        Self {
            node_prefix: Some(prefix.into()),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self {
            node_prefix: cfg.node_exclude_prefix.clone(),
        }
    }

    fn excludes(&self, sample: &Sample) -> bool {
        match &self.node_prefix {
            Some(prefix) => sample
                .labels
                .get("node")
                .map(|node| node.starts_with(prefix.as_str()))
                .unwrap_or(false),
            None => false,
        }
    }
}

/// Fetches the raw exposition payload from the configured metrics proxy path.
pub async fn fetch_cluster_metrics(client: &Client, path: &str) -> Result<String, EngineError> {
    let req = HttpRequest::builder()
        .method("GET")
        .uri(path)
        .body(Vec::new())
        .map_err(|e| EngineError::fetch("metrics", kube::Error::HttpError(e)))?;
    client
        .request_text(req)
        .await
        .map_err(|e| EngineError::fetch("metrics", e))
}

/// Fetches and aggregates the cluster health snapshot in one call.
pub async fn cluster_health(client: &Client, cfg: &Config) -> Result<ClusterHealthSnapshot, EngineError> {
    let raw = fetch_cluster_metrics(client, &cfg.metrics_path).await?;
    let snapshot = aggregate_health(&raw, &SampleExclusion::from_config(cfg))?;
    info!(
        "cluster health: cpu {}%, memory {}%, {} nodes",
        snapshot.cpu_usage_percent, snapshot.memory_usage_percent, snapshot.node_count
    );
    Ok(snapshot)
}

/// Aggregates a raw exposition payload into the cluster health snapshot.
///
/// Sums pod resource requests against node capacity, counts node-info
/// series, and derives request/capacity percentages. A family absent from
/// the payload contributes a zero sum and a zero percentage; only an
/// undecodable payload is an error.
pub fn aggregate_health(
    raw: &str,
    exclusion: &SampleExclusion,
) -> Result<ClusterHealthSnapshot, EngineError> {
    let scrape = Scrape::parse(raw.lines().map(|line| Ok(line.to_owned())))
        .map_err(|e| EngineError::Decode(e.to_string()))?;

    let mut cpu_requested = 0.0;
    let mut cpu_capacity = 0.0;
    let mut memory_requested = 0.0;
    let mut memory_allocatable = 0.0;
    let mut node_count = 0usize;

    for sample in &scrape.samples {
        if exclusion.excludes(sample) {
            continue;
        }
        match sample.metric.as_str() {
            POD_CPU_REQUESTS => cpu_requested += scalar_value(&sample.value),
            NODE_CPU_CAPACITY => cpu_capacity += scalar_value(&sample.value),
            POD_MEMORY_REQUESTS => memory_requested += scalar_value(&sample.value),
            NODE_MEMORY_ALLOCATABLE => memory_allocatable += scalar_value(&sample.value),
            NODE_INFO => node_count += 1,
            _ => {}
        }
    }

    Ok(ClusterHealthSnapshot {
        cpu_used_cores: round2(cpu_requested),
        cpu_capacity_cores: round2(cpu_capacity),
        cpu_usage_percent: ratio_percent(cpu_requested, cpu_capacity),
        memory_used_gib: round2(memory_requested / GIB),
        memory_total_gib: round2(memory_allocatable / GIB),
        memory_usage_percent: ratio_percent(memory_requested, memory_allocatable),
        node_count,
    })
}

/// Reports the API server version string.
pub async fn cluster_version(client: &Client) -> Result<String, EngineError> {
    let version = client
        .apiserver_version()
        .await
        .map_err(|e| EngineError::fetch("version", e))?;
    Ok(version.git_version)
}

/// Counts ready and unready nodes from their `Ready` condition.
pub async fn node_readiness(client: &Client) -> Result<NodeReadiness, EngineError> {
    let api: Api<Node> = Api::all(client.clone());
    let nodes = FetchSlot::spawn("nodes", async move {
        api.list(&ListParams::default())
            .await
            .map(|list| list.items)
            .map_err(|e| EngineError::fetch("nodes", e))
    })
    .recv()
    .await?;

    let mut readiness = NodeReadiness::default();
    for node in &nodes {
        if node_is_ready(node) {
            readiness.ready += 1;
        } else {
            readiness.unready += 1;
        }
    }
    Ok(readiness)
}

fn node_is_ready(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
        .unwrap_or(false)
}

fn scalar_value(value: &Value) -> f64 {
    match value {
        Value::Counter(v) | Value::Gauge(v) | Value::Untyped(v) => *v,
        Value::Histogram(_) | Value::Summary(_) => 0.0,
    }
}

fn ratio_percent(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    round2(numerator / denominator * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
