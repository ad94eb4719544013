use k8s_openapi::api::core::v1::Service;
use kube::{api::ListParams, Client};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::EngineError;
use crate::fanout::{list_channel, NamespaceScope};
use crate::query::{run_query, ResourceQuery};
use crate::resources::cell::ResourceCell;
use crate::resources::common::list_meta;
use crate::types::ListMeta;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDto {
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(rename = "clusterIP", skip_serializing_if = "Option::is_none")]
    pub cluster_ip: Option<String>,
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceList {
    pub list_meta: ListMeta,
    pub services: Vec<ServiceDto>,
}

pub async fn list_services(
    client: &Client,
    scope: &NamespaceScope,
    query: &ResourceQuery,
) -> Result<ServiceList, EngineError> {
    let services = list_channel::<Service>(client, scope, ListParams::default(), "services")
        .recv()
        .await?;
    Ok(build_service_list(services, query))
}

/// Services correlated to a workload by name. The lookup is name-based,
/// not selector-based: only services sharing the workload's name are found.
pub async fn services_for_workload(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<ServiceList, EngineError> {
    let scope = NamespaceScope::namespace(namespace);
    let params = ListParams::default().fields(&format!("metadata.name={}", name));
    let services = list_channel::<Service>(client, &scope, params, "services")
        .recv()
        .await?;
    debug!(
        "found {} services named {} in {} namespace",
        services.len(),
        name,
        namespace
    );
    Ok(build_service_list(services, &ResourceQuery::default()))
}

pub fn build_service_list(services: Vec<Service>, query: &ResourceQuery) -> ServiceList {
    let (cells, total) = run_query(ResourceCell::from_services(services), query);
    let page: Vec<ServiceDto> = cells
        .into_iter()
        .filter_map(ResourceCell::into_service)
        .map(|svc| to_service_dto(&svc))
        .collect();

    ServiceList {
        list_meta: list_meta(total, query),
        services: page,
    }
}

fn to_service_dto(service: &Service) -> ServiceDto {
    let spec = service.spec.as_ref();
    ServiceDto {
        name: service.metadata.name.clone().unwrap_or_default(),
        namespace: service.metadata.namespace.clone().unwrap_or_default(),
        labels: service.metadata.labels.clone(),
        type_: spec.and_then(|s| s.type_.clone()),
        cluster_ip: spec.and_then(|s| s.cluster_ip.clone()),
        ports: spec
            .and_then(|s| s.ports.as_ref())
            .map(|ports| {
                ports
                    .iter()
                    .map(|p| {
                        format!(
                            "{}/{}",
                            p.port,
                            p.protocol.clone().unwrap_or_else(|| "TCP".to_string())
                        )
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{ServicePort, ServiceSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn service(name: &str, type_: &str) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                type_: Some(type_.to_string()),
                cluster_ip: Some("10.96.0.7".to_string()),
                ports: Some(vec![ServicePort {
                    port: 8080,
                    protocol: None,
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_service_list() {
        let services = vec![service("web", "ClusterIP"), service("api", "NodePort")];
        let list = build_service_list(services, &ResourceQuery::default());

        assert_eq!(list.list_meta.total_items, 2);
        assert_eq!(list.services[0].name, "web");
        assert_eq!(list.services[0].ports, vec!["8080/TCP"]);
        assert_eq!(list.services[1].type_.as_deref(), Some("NodePort"));
    }
}
