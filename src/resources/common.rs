use k8s_openapi::api::core::v1::{Pod, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use crate::query::ResourceQuery;
use crate::types::{ListMeta, PodInfo, WarningSummary};

/// Builds the list envelope metadata for a query's result.
pub(crate) fn list_meta(total: usize, query: &ResourceQuery) -> ListMeta {
    ListMeta {
        total_items: total,
        page: query.pagination.map(|p| p.page),
        items_per_page: query.pagination.map(|p| p.page_size),
    }
}

/// Aggregates phase counts for the pods of one workload.
pub(crate) fn pod_info(
    current: i32,
    desired: Option<i32>,
    pods: &[Pod],
    warnings: Vec<WarningSummary>,
) -> PodInfo {
    let mut info = PodInfo {
        current,
        desired,
        warnings,
        ..Default::default()
    };
    for pod in pods {
        match pod.status.as_ref().and_then(|s| s.phase.as_deref()) {
            Some("Running") => info.running += 1,
            Some("Pending") => info.pending += 1,
            Some("Failed") => info.failed += 1,
            Some("Succeeded") => info.succeeded += 1,
            _ => {}
        }
    }
    info
}

/// Returns true if the object's controller owner reference points at the
/// given UID.
pub(crate) fn is_controlled_by(meta: &ObjectMeta, owner_uid: &str) -> bool {
    meta.owner_references
        .as_ref()
        .map(|refs| {
            refs.iter()
                .any(|r| r.controller == Some(true) && r.uid == owner_uid)
        })
        .unwrap_or(false)
}

/// Pods controlled by the object with the given UID.
pub(crate) fn pods_controlled_by(owner_uid: &str, pods: &[Pod]) -> Vec<Pod> {
    pods.iter()
        .filter(|p| is_controlled_by(&p.metadata, owner_uid))
        .cloned()
        .collect()
}

/// Renders a label selector's match labels as a list-call selector string.
/// Match expressions are not rendered.
pub(crate) fn match_labels_selector(selector: &LabelSelector) -> String {
    selector
        .match_labels
        .as_ref()
        .map(|labels| {
            labels
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default()
}

/// Images of every container in the workload's pod template.
pub(crate) fn container_images(template: &PodTemplateSpec) -> Vec<String> {
    template
        .spec
        .as_ref()
        .map(|spec| {
            spec.containers
                .iter()
                .filter_map(|c| c.image.clone())
                .collect()
        })
        .unwrap_or_default()
}
