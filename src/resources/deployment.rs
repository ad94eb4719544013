use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition, ReplicaSet};
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
use crate::resources::common::{container_images, is_controlled_by, list_meta, pod_info};
use crate::resources::pod::{build_pod_list, PodList};
use crate::resources::service::{services_for_workload, ServiceList};
use crate::types::{Condition, ListMeta, PodInfo, ResourceStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDto {
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
pub struct DeploymentList {
    pub list_meta: ListMeta,
    pub status: ResourceStatus,
    pub deployments: Vec<DeploymentDto>,
}

/// Detailed information about one deployment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDetail {
    #[serde(flatten)]
    pub deployment: DeploymentDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LabelSelector>,
    pub conditions: Vec<Condition>,
    pub pod_list: PodList,
    pub svc_list: ServiceList,
}

/// Lists deployments with status and warnings, fanning out the dependent
/// replica set, pod and event fetches concurrently. Any dependent fetch
/// failure is fatal to the whole call.
pub async fn list_deployments(
    client: &Client,
    scope: &NamespaceScope,
    query: &ResourceQuery,
) -> Result<DeploymentList, EngineError> {
    let mut channels = ResourceChannels::new()
        .with_deployments(client, scope)
        .with_replica_sets(client, scope)
        .with_pods(client, scope)
        .with_events(client, scope);

    let deployments = channels.recv_deployments().await?;
    let replica_sets = channels.recv_replica_sets().await?;
    let pods = channels.recv_pods().await?;
    let events = channels.recv_events().await?;

    Ok(build_deployment_list(
        deployments,
        &replica_sets,
        &pods,
        &events,
        query,
    ))
}

pub fn build_deployment_list(
    deployments: Vec<Deployment>,
    replica_sets: &[ReplicaSet],
    pods: &[Pod],
    events: &[Event],
    query: &ResourceQuery,
) -> DeploymentList {
    let status = deployments_status(&deployments, replica_sets, pods, events);

    let (cells, total) = run_query(ResourceCell::from_deployments(deployments), query);
    let page: Vec<DeploymentDto> = cells
        .into_iter()
        .filter_map(ResourceCell::into_deployment)
        .map(|d| to_deployment_dto(&d, replica_sets, pods, events))
        .collect();

    DeploymentList {
        list_meta: list_meta(total, query),
        status,
        deployments: page,
    }
}

/// Returns detailed information about the given deployment in the given
/// namespace.
pub async fn deployment_detail(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<DeploymentDetail, EngineError> {
    info!(
        "Getting details of {} deployment in {} namespace",
        name, namespace
    );
    let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let deployment = api
        .get(name)
        .await
        .map_err(|e| EngineError::fetch("deployments", e))?;

    let scope = NamespaceScope::namespace(namespace);
    let mut channels = ResourceChannels::new()
        .with_events(client, &scope)
        .with_pods(client, &scope)
        .with_replica_sets(client, &scope);

    let events = channels.recv_events().await?;
    let pods = channels.recv_pods().await?;
    let replica_sets = channels.recv_replica_sets().await?;

    let matching = matching_pods(&deployment, &replica_sets, &pods);
    let pod_list = build_pod_list(matching, &events, &ResourceQuery::default());
    let svc_list = services_for_workload(client, namespace, name).await?;

    let conditions = deployment
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|c| to_conditions(c))
        .unwrap_or_default();

    Ok(DeploymentDetail {
        deployment: to_deployment_dto(&deployment, &replica_sets, &pods, &events),
        label_selector: deployment.spec.as_ref().map(|s| s.selector.clone()),
        conditions,
        pod_list,
        svc_list,
    })
}

// Pods reach a deployment through the replica sets it controls.
fn matching_pods(deployment: &Deployment, replica_sets: &[ReplicaSet], pods: &[Pod]) -> Vec<Pod> {
    let uid = match deployment.metadata.uid.as_deref() {
        Some(uid) => uid,
        None => return Vec::new(),
    };
    let rs_uids: Vec<&str> = replica_sets
        .iter()
        .filter(|rs| is_controlled_by(&rs.metadata, uid))
        .filter_map(|rs| rs.metadata.uid.as_deref())
        .collect();

    pods.iter()
        .filter(|pod| {
            rs_uids
                .iter()
                .any(|rs_uid| is_controlled_by(&pod.metadata, rs_uid))
        })
        .cloned()
        .collect()
}

fn deployments_status(
    deployments: &[Deployment],
    replica_sets: &[ReplicaSet],
    pods: &[Pod],
    events: &[Event],
) -> ResourceStatus {
    let mut status = ResourceStatus::default();
    for deployment in deployments {
        let info = deployment_pod_info(deployment, replica_sets, pods, events);
        if !info.warnings.is_empty() {
            status.failed += 1;
        } else if info.pending > 0 {
            status.pending += 1;
        } else {
            status.running += 1;
        }
    }
    status
}

fn deployment_pod_info(
    deployment: &Deployment,
    replica_sets: &[ReplicaSet],
    pods: &[Pod],
    events: &[Event],
) -> PodInfo {
    let matching = matching_pods(deployment, replica_sets, pods);
    let warnings = pods_event_warnings(events, &matching);
    let current = deployment
        .status
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(0);
    let desired = deployment.spec.as_ref().and_then(|s| s.replicas);
    pod_info(current, desired, &matching, warnings)
}

fn to_deployment_dto(
    deployment: &Deployment,
    replica_sets: &[ReplicaSet],
    pods: &[Pod],
    events: &[Event],
) -> DeploymentDto {
    DeploymentDto {
        name: deployment.metadata.name.clone().unwrap_or_default(),
        namespace: deployment.metadata.namespace.clone().unwrap_or_default(),
        labels: deployment.metadata.labels.clone(),
        pods: deployment_pod_info(deployment, replica_sets, pods, events),
        container_images: deployment
            .spec
            .as_ref()
            .map(|s| container_images(&s.template))
            .unwrap_or_default(),
        creation_timestamp: deployment.metadata.creation_timestamp.as_ref().map(|t| t.0),
    }
}

fn to_conditions(conditions: &[DeploymentCondition]) -> Vec<Condition> {
    conditions
        .iter()
        .map(|c| Condition {
            type_: c.type_.clone(),
            status: c.status.clone(),
            reason: c.reason.clone(),
            message: c.message.clone(),
            last_transition_time: c.last_transition_time.as_ref().map(|t| t.0),
            last_probe_time: c.last_update_time.as_ref().map(|t| t.0),
        })
        .collect()
}
