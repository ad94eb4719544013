use std::fmt;
use std::future::Future;

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Event, Pod, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::{api::ListParams, Api, Client, Resource};
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::EngineError;

/// Namespace scope of a list fetch: one namespace or the whole cluster.
#[derive(Debug, Clone)]
pub enum NamespaceScope {
    All,
    Namespace(String),
}

impl NamespaceScope {
    pub fn namespace(ns: impl Into<String>) -> Self {
        NamespaceScope::Namespace(ns.into())
    }
}

/// Single-slot completion channel for one dispatched fetch.
///
/// The worker writes its `(result, err)` outcome exactly once; the buffered
/// slot means the worker never blocks on a slow consumer, and a slot the
/// owner drops unread simply discards the outcome once the worker finishes.
/// Reading consumes the slot, so no result is ever read twice.
pub struct FetchSlot<T> {
    resource: &'static str,
    rx: oneshot::Receiver<Result<T, EngineError>>,
}

impl<T: Send + 'static> FetchSlot<T> {
    /// Starts exactly one worker for `fut` and returns its completion slot
    /// without waiting.
    pub fn spawn<F>(resource: &'static str, fut: F) -> Self
    where
        F: Future<Output = Result<T, EngineError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            // send fails only when the consumer abandoned the slot
            let _ = tx.send(fut.await);
        });
        Self { resource, rx }
    }

    /// Blocks until the worker delivers, consuming the slot.
    pub async fn recv(self) -> Result<T, EngineError> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(EngineError::WorkerGone {
                resource: self.resource,
            }),
        }
    }
}

/// Dispatches one concurrent list worker for the given resource kind.
pub fn list_channel<K>(
    client: &Client,
    scope: &NamespaceScope,
    params: ListParams,
    resource: &'static str,
) -> FetchSlot<Vec<K>>
where
    K: Resource<Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + fmt::Debug
        + Send
        + 'static,
    K::DynamicType: Default,
{
    let api: Api<K> = match scope {
        NamespaceScope::All => Api::all(client.clone()),
        NamespaceScope::Namespace(ns) => Api::namespaced(client.clone(), ns),
    };
    debug!("dispatching {} list fetch", resource);
    FetchSlot::spawn(resource, async move {
        api.list(&params)
            .await
            .map(|list| list.items)
            .map_err(|e| EngineError::fetch(resource, e))
    })
}

/// Named bundle of pending list results, one slot per dependent resource a
/// call requested. Owned by the call that created it; each slot delivers
/// exactly once and is consumed by its `recv_*` drain.
#[derive(Default)]
pub struct ResourceChannels {
    deployments: Option<FetchSlot<Vec<Deployment>>>,
    replica_sets: Option<FetchSlot<Vec<ReplicaSet>>>,
    daemon_sets: Option<FetchSlot<Vec<DaemonSet>>>,
    jobs: Option<FetchSlot<Vec<Job>>>,
    pods: Option<FetchSlot<Vec<Pod>>>,
    services: Option<FetchSlot<Vec<Service>>>,
    events: Option<FetchSlot<Vec<Event>>>,
}

impl ResourceChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deployments(mut self, client: &Client, scope: &NamespaceScope) -> Self {
        self.deployments = Some(list_channel(
            client,
            scope,
            ListParams::default(),
            "deployments",
        ));
        self
    }

    pub fn with_replica_sets(mut self, client: &Client, scope: &NamespaceScope) -> Self {
        self.replica_sets = Some(list_channel(
            client,
            scope,
            ListParams::default(),
            "replicasets",
        ));
        self
    }

    pub fn with_daemon_sets(mut self, client: &Client, scope: &NamespaceScope) -> Self {
        self.daemon_sets = Some(list_channel(
            client,
            scope,
            ListParams::default(),
            "daemonsets",
        ));
        self
    }

    pub fn with_jobs(mut self, client: &Client, scope: &NamespaceScope) -> Self {
        self.jobs = Some(list_channel(client, scope, ListParams::default(), "jobs"));
        self
    }

    pub fn with_pods(self, client: &Client, scope: &NamespaceScope) -> Self {
        self.with_pods_options(client, scope, ListParams::default())
    }

    pub fn with_pods_options(
        mut self,
        client: &Client,
        scope: &NamespaceScope,
        params: ListParams,
    ) -> Self {
        self.pods = Some(list_channel(client, scope, params, "pods"));
        self
    }

    pub fn with_services(mut self, client: &Client, scope: &NamespaceScope) -> Self {
        self.services = Some(list_channel(
            client,
            scope,
            ListParams::default(),
            "services",
        ));
        self
    }

    pub fn with_events(self, client: &Client, scope: &NamespaceScope) -> Self {
        self.with_events_options(client, scope, ListParams::default())
    }

    pub fn with_events_options(
        mut self,
        client: &Client,
        scope: &NamespaceScope,
        params: ListParams,
    ) -> Self {
        self.events = Some(list_channel(client, scope, params, "events"));
        self
    }

    pub async fn recv_deployments(&mut self) -> Result<Vec<Deployment>, EngineError> {
        Self::drain(self.deployments.take(), "deployments").await
    }

    pub async fn recv_replica_sets(&mut self) -> Result<Vec<ReplicaSet>, EngineError> {
        Self::drain(self.replica_sets.take(), "replicasets").await
    }

    pub async fn recv_daemon_sets(&mut self) -> Result<Vec<DaemonSet>, EngineError> {
        Self::drain(self.daemon_sets.take(), "daemonsets").await
    }

    pub async fn recv_jobs(&mut self) -> Result<Vec<Job>, EngineError> {
        Self::drain(self.jobs.take(), "jobs").await
    }

    pub async fn recv_pods(&mut self) -> Result<Vec<Pod>, EngineError> {
        Self::drain(self.pods.take(), "pods").await
    }

    pub async fn recv_services(&mut self) -> Result<Vec<Service>, EngineError> {
        Self::drain(self.services.take(), "services").await
    }

    pub async fn recv_events(&mut self) -> Result<Vec<Event>, EngineError> {
        Self::drain(self.events.take(), "events").await
    }

    async fn drain<T: Send + 'static>(
        slot: Option<FetchSlot<T>>,
        resource: &'static str,
    ) -> Result<T, EngineError> {
        match slot {
            Some(slot) => slot.recv().await,
            None => Err(EngineError::NotDispatched { resource }),
        }
    }
}
