use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::types::Config;

/// Proxy path of the kube-state-metrics exposition endpoint.
const DEFAULT_METRICS_PATH: &str =
    "/api/v1/namespaces/kube-system/services/kube-state-metrics:http-metrics/proxy/metrics";

const DEFAULT_PAGE_SIZE: usize = 10;

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let metrics_path = env
        .get_var("METRICS_PATH")
        .unwrap_or_else(|| DEFAULT_METRICS_PATH.to_string());

    // Empty string means no exclusion, same as unset.
    let node_exclude_prefix = env
        .get_var("NODE_EXCLUDE_PREFIX")
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim().to_string());

    let default_page_size: usize = env
        .get_var("DEFAULT_PAGE_SIZE")
        .unwrap_or_else(|| DEFAULT_PAGE_SIZE.to_string())
        .parse()
        .context("Invalid DEFAULT_PAGE_SIZE")?;

    let cluster_name = env.get_var("CLUSTER_NAME");

    Ok(Config {
        metrics_path,
        node_exclude_prefix,
        default_page_size,
        cluster_name,
    })
}
