use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::query::{property, ComparableValue, PropertyAccessor};

/// A resource instance wrapped for generic querying. One variant per
/// supported kind; adding a kind means adding a variant and its property
/// mapping here, nothing in the pipeline changes.
pub enum ResourceCell {
    Deployment(Deployment),
    DaemonSet(DaemonSet),
    Job(Job),
    Pod(Pod),
    Service(Service),
}

impl ResourceCell {
    pub fn from_deployments(items: Vec<Deployment>) -> Vec<ResourceCell> {
        items.into_iter().map(ResourceCell::Deployment).collect()
    }

    pub fn from_daemon_sets(items: Vec<DaemonSet>) -> Vec<ResourceCell> {
        items.into_iter().map(ResourceCell::DaemonSet).collect()
    }

    pub fn from_jobs(items: Vec<Job>) -> Vec<ResourceCell> {
        items.into_iter().map(ResourceCell::Job).collect()
    }

    pub fn from_pods(items: Vec<Pod>) -> Vec<ResourceCell> {
        items.into_iter().map(ResourceCell::Pod).collect()
    }

    pub fn from_services(items: Vec<Service>) -> Vec<ResourceCell> {
        items.into_iter().map(ResourceCell::Service).collect()
    }

    pub fn into_deployment(self) -> Option<Deployment> {
        match self {
            ResourceCell::Deployment(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_daemon_set(self) -> Option<DaemonSet> {
        match self {
            ResourceCell::DaemonSet(ds) => Some(ds),
            _ => None,
        }
    }

    pub fn into_job(self) -> Option<Job> {
        match self {
            ResourceCell::Job(j) => Some(j),
            _ => None,
        }
    }

    pub fn into_pod(self) -> Option<Pod> {
        match self {
            ResourceCell::Pod(p) => Some(p),
            _ => None,
        }
    }

    pub fn into_service(self) -> Option<Service> {
        match self {
            ResourceCell::Service(s) => Some(s),
            _ => None,
        }
    }

    fn metadata(&self) -> &ObjectMeta {
        match self {
            ResourceCell::Deployment(d) => &d.metadata,
            ResourceCell::DaemonSet(ds) => &ds.metadata,
            ResourceCell::Job(j) => &j.metadata,
            ResourceCell::Pod(p) => &p.metadata,
            ResourceCell::Service(s) => &s.metadata,
        }
    }

    fn kind_property(&self, name: &str) -> Option<ComparableValue> {
        match (self, name) {
            (ResourceCell::Deployment(d), "replicas") => d
                .spec
                .as_ref()
                .and_then(|s| s.replicas)
                .map(|r| ComparableValue::Quantity(r as i64)),
            (ResourceCell::DaemonSet(ds), "numberReady") => ds
                .status
                .as_ref()
                .map(|s| ComparableValue::Quantity(s.number_ready as i64)),
            (ResourceCell::Job(j), "succeeded") => j
                .status
                .as_ref()
                .and_then(|s| s.succeeded)
                .map(|v| ComparableValue::Quantity(v as i64)),
            (ResourceCell::Pod(p), property::STATUS) => p
                .status
                .as_ref()
                .and_then(|s| s.phase.as_deref())
                .map(ComparableValue::str),
            (ResourceCell::Pod(p), "podIP") => p
                .status
                .as_ref()
                .and_then(|s| s.pod_ip.as_deref())
                .map(ComparableValue::str),
            (ResourceCell::Pod(p), "restartCount") => {
                Some(ComparableValue::Quantity(pod_restart_count(p)))
            }
            (ResourceCell::Service(s), "type") => s
                .spec
                .as_ref()
                .and_then(|spec| spec.type_.as_deref())
                .map(ComparableValue::str),
            (ResourceCell::Service(s), "clusterIP") => s
                .spec
                .as_ref()
                .and_then(|spec| spec.cluster_ip.as_deref())
                .map(ComparableValue::str),
            _ => None,
        }
    }
}

impl PropertyAccessor for ResourceCell {
    fn property(&self, name: &str) -> Option<ComparableValue> {
        match name {
            property::NAME => self.metadata().name.as_deref().map(ComparableValue::str),
            property::NAMESPACE => self
                .metadata()
                .namespace
                .as_deref()
                .map(ComparableValue::str),
            property::CREATION_TIMESTAMP => self
                .metadata()
                .creation_timestamp
                .as_ref()
                .map(|t| ComparableValue::Time(t.0)),
            _ => self.kind_property(name),
        }
    }
}

pub(crate) fn pod_restart_count(pod: &Pod) -> i64 {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| statuses.iter().map(|cs| cs.restart_count as i64).sum())
        .unwrap_or(0)
}
