use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Event, Pod};
use kube::Client;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::events::{pods_event_warnings, resource_events};
use crate::fanout::{NamespaceScope, ResourceChannels};
use crate::query::{run_query, ResourceQuery};
use crate::resources::cell::{pod_restart_count, ResourceCell};
use crate::resources::common::list_meta;
use crate::types::{ListMeta, ResourceStatus, WarningSummary};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodDto {
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    pub status: String,
    pub restart_count: i64,
    pub warnings: Vec<WarningSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodList {
    pub list_meta: ListMeta,
    pub status: ResourceStatus,
    pub pods: Vec<PodDto>,
}

/// Lists pods with their correlated warnings through one fan-out.
pub async fn list_pods(
    client: &Client,
    scope: &NamespaceScope,
    query: &ResourceQuery,
) -> Result<PodList, EngineError> {
    let mut channels = ResourceChannels::new()
        .with_pods(client, scope)
        .with_events(client, scope);
    let pods = channels.recv_pods().await?;
    let events = channels.recv_events().await?;

    Ok(build_pod_list(pods, &events, query))
}

/// Shapes pre-fetched pods into the filtered, sorted, paginated list DTO.
pub fn build_pod_list(pods: Vec<Pod>, events: &[Event], query: &ResourceQuery) -> PodList {
    let (cells, total) = run_query(ResourceCell::from_pods(pods), query);
    let page: Vec<Pod> = cells.into_iter().filter_map(ResourceCell::into_pod).collect();

    let mut status = ResourceStatus::default();
    let mut dtos = Vec::with_capacity(page.len());
    for pod in &page {
        match pod.status.as_ref().and_then(|s| s.phase.as_deref()) {
            Some("Running") => status.running += 1,
            Some("Pending") => status.pending += 1,
            Some("Failed") => status.failed += 1,
            _ => {}
        }
        dtos.push(to_pod_dto(pod, events));
    }

    PodList {
        list_meta: list_meta(total, query),
        status,
        pods: dtos,
    }
}

/// Gets events that are associated with this pod.
pub async fn pod_events(
    client: &Client,
    namespace: &str,
    pod_name: &str,
) -> Result<Vec<Event>, EngineError> {
    resource_events(client, namespace, pod_name).await
}

fn to_pod_dto(pod: &Pod, events: &[Event]) -> PodDto {
    PodDto {
        name: pod.metadata.name.clone().unwrap_or_default(),
        namespace: pod.metadata.namespace.clone().unwrap_or_default(),
        labels: pod.metadata.labels.clone(),
        node_name: pod.spec.as_ref().and_then(|s| s.node_name.clone()),
        status: pod_display_status(pod),
        restart_count: pod_restart_count(pod),
        warnings: pods_event_warnings(events, std::slice::from_ref(pod)),
        creation_timestamp: pod.metadata.creation_timestamp.as_ref().map(|t| t.0),
    }
}

// Prefer a waiting container's reason (e.g. CrashLoopBackOff) over the
// pod phase.
fn pod_display_status(pod: &Pod) -> String {
    if let Some(statuses) = pod.status.as_ref().and_then(|s| s.container_statuses.as_ref()) {
        for cs in statuses {
            if let Some(waiting) = cs.state.as_ref().and_then(|s| s.waiting.as_ref()) {
                if let Some(reason) = waiting.reason.as_ref() {
                    if !reason.is_empty() {
                        return reason.clone();
                    }
                }
            }
        }
    }
    pod.status
        .as_ref()
        .and_then(|s| s.phase.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}
