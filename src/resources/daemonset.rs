use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::DaemonSet;
use k8s_openapi::api::core::v1::{Event, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::{Api, Client};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::EngineError;
use crate::events::pods_event_warnings;
use crate::fanout::{NamespaceScope, ResourceChannels};
use crate::query::{run_query, ResourceQuery};
use crate::resources::cell::ResourceCell;
use crate::resources::common::{container_images, list_meta, pod_info, pods_controlled_by};
use crate::resources::pod::{build_pod_list, PodList};
use crate::resources::service::{services_for_workload, ServiceList};
use crate::types::{ListMeta, PodInfo, ResourceStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonSetDto {
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    pub pods: PodInfo,
    pub container_images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonSetList {
    pub list_meta: ListMeta,
    pub status: ResourceStatus,
    pub daemon_sets: Vec<DaemonSetDto>,
}

/// Detailed information about one daemon set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonSetDetail {
    #[serde(flatten)]
    pub daemon_set: DaemonSetDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LabelSelector>,
    pub pod_list: PodList,
    pub svc_list: ServiceList,
}

pub async fn list_daemon_sets(
    client: &Client,
    scope: &NamespaceScope,
    query: &ResourceQuery,
) -> Result<DaemonSetList, EngineError> {
    let mut channels = ResourceChannels::new()
        .with_daemon_sets(client, scope)
        .with_pods(client, scope)
        .with_events(client, scope);

    let daemon_sets = channels.recv_daemon_sets().await?;
    let pods = channels.recv_pods().await?;
    let events = channels.recv_events().await?;

    Ok(build_daemon_set_list(daemon_sets, &pods, &events, query))
}

pub fn build_daemon_set_list(
    daemon_sets: Vec<DaemonSet>,
    pods: &[Pod],
    events: &[Event],
    query: &ResourceQuery,
) -> DaemonSetList {
    let mut status = ResourceStatus::default();
    for ds in &daemon_sets {
        let info = daemon_set_pod_info(ds, pods, events);
        if !info.warnings.is_empty() {
            status.failed += 1;
        } else if info.pending > 0 {
            status.pending += 1;
        } else {
            status.running += 1;
        }
    }

    let (cells, total) = run_query(ResourceCell::from_daemon_sets(daemon_sets), query);
    let page: Vec<DaemonSetDto> = cells
        .into_iter()
        .filter_map(ResourceCell::into_daemon_set)
        .map(|ds| to_daemon_set_dto(&ds, pods, events))
        .collect();

    DaemonSetList {
        list_meta: list_meta(total, query),
        status,
        daemon_sets: page,
    }
}

/// Returns detailed information about the given daemon set in the given
/// namespace.
pub async fn daemon_set_detail(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<DaemonSetDetail, EngineError> {
    info!(
        "Getting details of {} daemon set in {} namespace",
        name, namespace
    );
    let api: Api<DaemonSet> = Api::namespaced(client.clone(), namespace);
    let daemon_set = api
        .get(name)
        .await
        .map_err(|e| EngineError::fetch("daemonsets", e))?;

    let scope = NamespaceScope::namespace(namespace);
    let mut channels = ResourceChannels::new()
        .with_events(client, &scope)
        .with_pods(client, &scope);

    let events = channels.recv_events().await?;
    let pods = channels.recv_pods().await?;

    let owned = match daemon_set.metadata.uid.as_deref() {
        Some(uid) => pods_controlled_by(uid, &pods),
        None => Vec::new(),
    };
    let pod_list = build_pod_list(owned, &events, &ResourceQuery::default());
    let svc_list = services_for_workload(client, namespace, name).await?;

    Ok(DaemonSetDetail {
        daemon_set: to_daemon_set_dto(&daemon_set, &pods, &events),
        label_selector: daemon_set.spec.as_ref().map(|s| s.selector.clone()),
        pod_list,
        svc_list,
    })
}

fn daemon_set_pod_info(daemon_set: &DaemonSet, pods: &[Pod], events: &[Event]) -> PodInfo {
    let owned = match daemon_set.metadata.uid.as_deref() {
        Some(uid) => pods_controlled_by(uid, pods),
        None => Vec::new(),
    };
    let warnings = pods_event_warnings(events, &owned);
    let (current, desired) = daemon_set
        .status
        .as_ref()
        .map(|s| (s.current_number_scheduled, Some(s.desired_number_scheduled)))
        .unwrap_or((0, None));
    pod_info(current, desired, &owned, warnings)
}

fn to_daemon_set_dto(daemon_set: &DaemonSet, pods: &[Pod], events: &[Event]) -> DaemonSetDto {
    DaemonSetDto {
        name: daemon_set.metadata.name.clone().unwrap_or_default(),
        namespace: daemon_set.metadata.namespace.clone().unwrap_or_default(),
        labels: daemon_set.metadata.labels.clone(),
        pods: daemon_set_pod_info(daemon_set, pods, events),
        container_images: daemon_set
            .spec
            .as_ref()
            .map(|s| container_images(&s.template))
            .unwrap_or_default(),
        creation_timestamp: daemon_set.metadata.creation_timestamp.as_ref().map(|t| t.0),
    }
}
