use chrono::{DateTime, Utc};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Event, Pod};
use kube::{api::ListParams, Client};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::events::pods_event_warnings;
use crate::fanout::{NamespaceScope, ResourceChannels};
use crate::query::{run_query, ResourceQuery};
use crate::resources::cell::ResourceCell;
use crate::resources::common::{
    container_images, list_meta, match_labels_selector, pod_info, pods_controlled_by,
};
use crate::resources::pod::{build_pod_list, PodList};
use crate::types::{ListMeta, PodInfo, ResourceStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDto {
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    pub pods: PodInfo,
    pub container_images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completions: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobList {
    pub list_meta: ListMeta,
    pub status: ResourceStatus,
    pub jobs: Vec<JobDto>,
}

pub async fn list_jobs(
    client: &Client,
    scope: &NamespaceScope,
    query: &ResourceQuery,
) -> Result<JobList, EngineError> {
    let mut channels = ResourceChannels::new()
        .with_jobs(client, scope)
        .with_pods(client, scope)
        .with_events(client, scope);

    let jobs = channels.recv_jobs().await?;
    let pods = channels.recv_pods().await?;
    let events = channels.recv_events().await?;

    Ok(build_job_list(jobs, &pods, &events, query))
}

pub fn build_job_list(
    jobs: Vec<Job>,
    pods: &[Pod],
    events: &[Event],
    query: &ResourceQuery,
) -> JobList {
    let mut status = ResourceStatus::default();
    for job in &jobs {
        let info = job_pod_info(job, pods, events);
        if !info.warnings.is_empty() || info.failed > 0 {
            status.failed += 1;
        } else if info.pending > 0 {
            status.pending += 1;
        } else {
            status.running += 1;
        }
    }

    let (cells, total) = run_query(ResourceCell::from_jobs(jobs), query);
    let page: Vec<JobDto> = cells
        .into_iter()
        .filter_map(ResourceCell::into_job)
        .map(|job| to_job_dto(&job, pods, events))
        .collect();

    JobList {
        list_meta: list_meta(total, query),
        status,
        jobs: page,
    }
}

/// Pods belonging to the job, selected by its label selector the way
/// kubectl describe resolves them.
pub async fn job_pods(client: &Client, job: &Job) -> Result<PodList, EngineError> {
    let namespace = job.metadata.namespace.clone().unwrap_or_default();
    let scope = NamespaceScope::namespace(&namespace);

    let selector = job
        .spec
        .as_ref()
        .and_then(|s| s.selector.as_ref())
        .map(match_labels_selector)
        .unwrap_or_default();
    let mut params = ListParams::default();
    if !selector.is_empty() {
        params = params.labels(&selector);
    }

    let mut channels = ResourceChannels::new()
        .with_pods_options(client, &scope, params)
        .with_events(client, &scope);
    let pods = channels.recv_pods().await?;
    let events = channels.recv_events().await?;

    Ok(build_pod_list(pods, &events, &ResourceQuery::default()))
}

// Phase counts come from the owned pods, but the headline numbers follow
// the job status, the same way kubectl describe reports them.
fn job_pod_info(job: &Job, pods: &[Pod], events: &[Event]) -> PodInfo {
    let owned = match job.metadata.uid.as_deref() {
        Some(uid) => pods_controlled_by(uid, pods),
        None => Vec::new(),
    };
    let warnings = pods_event_warnings(events, &owned);
    let status = job.status.as_ref();
    let current = status.and_then(|s| s.active).unwrap_or(0);
    let desired = job.spec.as_ref().and_then(|s| s.completions);

    let mut info = pod_info(current, desired, &owned, warnings);
    info.running = status.and_then(|s| s.active).unwrap_or(0);
    info.succeeded = status.and_then(|s| s.succeeded).unwrap_or(0);
    info.failed = status.and_then(|s| s.failed).unwrap_or(0);
    info
}

fn to_job_dto(job: &Job, pods: &[Pod], events: &[Event]) -> JobDto {
    let spec = job.spec.as_ref();
    JobDto {
        name: job.metadata.name.clone().unwrap_or_default(),
        namespace: job.metadata.namespace.clone().unwrap_or_default(),
        labels: job.metadata.labels.clone(),
        pods: job_pod_info(job, pods, events),
        container_images: spec
            .map(|s| container_images(&s.template))
            .unwrap_or_default(),
        parallelism: spec.and_then(|s| s.parallelism),
        completions: spec.and_then(|s| s.completions),
        creation_timestamp: job.metadata.creation_timestamp.as_ref().map(|t| t.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::batch::v1::{JobSpec, JobStatus};
    use k8s_openapi::api::core::v1::PodStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

    fn job(name: &str, uid: &str, active: i32, succeeded: i32, failed: i32) -> Job {
        Job {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                uid: Some(uid.to_string()),
                ..Default::default()
            },
            spec: Some(JobSpec {
                completions: Some(3),
                parallelism: Some(2),
                ..Default::default()
            }),
            status: Some(JobStatus {
                active: Some(active),
                succeeded: Some(succeeded),
                failed: Some(failed),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn owned_pod(uid: &str, owner_uid: &str, phase: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(format!("pod-{}", uid)),
                uid: Some(uid.to_string()),
                owner_references: Some(vec![OwnerReference {
                    uid: owner_uid.to_string(),
                    controller: Some(true),
                    ..Default::default()
                }]),
                ..Default::default()
            },
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_job_pod_info_follows_job_status() {
        let j = job("migrate", "j1", 1, 2, 0);
        let pods = vec![owned_pod("p1", "j1", "Running")];

        let info = job_pod_info(&j, &pods, &[]);
        assert_eq!(info.running, 1);
        assert_eq!(info.succeeded, 2);
        assert_eq!(info.failed, 0);
        assert_eq!(info.desired, Some(3));
    }

    #[test]
    fn test_build_job_list_counts_failed_jobs() {
        let jobs = vec![job("ok", "j1", 1, 0, 0), job("broken", "j2", 0, 0, 2)];
        let list = build_job_list(jobs, &[], &[], &ResourceQuery::default());

        assert_eq!(list.list_meta.total_items, 2);
        assert_eq!(list.status.failed, 1);
        assert_eq!(list.status.running, 1);
    }
}
