use anyhow::Result;
use kube::Client;
use tracing::info;

use kube_console_core::cluster::{cluster_health, cluster_version, node_readiness};
use kube_console_core::config::load_config;
use kube_console_core::fanout::NamespaceScope;
use kube_console_core::query::ResourceQuery;
use kube_console_core::resources::deployment::list_deployments;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_config()?;
    let client = Client::try_default().await?;

    let version = cluster_version(&client).await?;
    info!("connected to cluster running {}", version);

    let readiness = node_readiness(&client).await?;
    info!(
        "nodes ready: {}, unready: {}",
        readiness.ready, readiness.unready
    );

    let snapshot = cluster_health(&client, &cfg).await?;
    info!(
        "cpu {:.2}/{:.2} cores ({}%), memory {:.2}/{:.2} GiB ({}%), {} nodes",
        snapshot.cpu_used_cores,
        snapshot.cpu_capacity_cores,
        snapshot.cpu_usage_percent,
        snapshot.memory_used_gib,
        snapshot.memory_total_gib,
        snapshot.memory_usage_percent,
        snapshot.node_count
    );

    let query = ResourceQuery::from_params(
        "d,creationTimestamp",
        "",
        Some(1),
        Some(cfg.default_page_size),
    );
    let deployments = list_deployments(&client, &NamespaceScope::All, &query).await?;
    info!(
        "{} deployments ({} running, {} pending, {} failed)",
        deployments.list_meta.total_items,
        deployments.status.running,
        deployments.status.pending,
        deployments.status.failed
    );
    for d in &deployments.deployments {
        info!(
            "  {}/{}: {} warnings",
            d.namespace,
            d.name,
            d.pods.warnings.len()
        );
    }

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}
