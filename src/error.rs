use thiserror::Error;

/// Errors produced by the aggregation engine.
///
/// A `Fetch` failure is isolated to the one resource kind that failed; the
/// caller decides whether it is fatal to the surrounding call. `Decode` is
/// fatal to the single metrics-aggregation call that hit it. Nothing here is
/// retried inside the engine and nothing is process-fatal.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("list {resource} failed: {source}")]
    Fetch {
        resource: &'static str,
        #[source]
        source: kube::Error,
    },

    #[error("decode metrics payload: {0}")]
    Decode(String),

    #[error("{resource} fetch worker exited without delivering a result")]
    WorkerGone { resource: &'static str },

    #[error("no {resource} fetch was dispatched on this channel bundle")]
    NotDispatched { resource: &'static str },
}

impl EngineError {
    pub(crate) fn fetch(resource: &'static str, source: kube::Error) -> Self {
        EngineError::Fetch { resource, source }
    }
}
