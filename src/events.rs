use std::collections::HashSet;

use k8s_openapi::api::core::v1::{Event, Pod};
use kube::{api::ListParams, Client};
use tracing::debug;

use crate::error::EngineError;
use crate::fanout::{list_channel, NamespaceScope};
use crate::types::WarningSummary;

const EVENT_TYPE_WARNING: &str = "Warning";
const EVENT_TYPE_NORMAL: &str = "Normal";

/// Reason fragments that mark an untyped event as a warning.
const FAILED_REASON_PARTIALS: &[&str] = &["failed", "err", "exceeded", "invalid", "unhealthy"];

/// Correlates warning events to the failing pods that caused them.
///
/// Events tied to healthy pods are dropped; the survivors are deduplicated
/// by reason (first occurrence wins, insertion order preserved) so the list
/// is bounded by the number of distinct failure categories.
pub fn pods_event_warnings(events: &[Event], pods: &[Pod]) -> Vec<WarningSummary> {
    let failing: Vec<&Pod> = pods.iter().filter(|p| !is_ready_or_succeeded(p)).collect();
    if failing.is_empty() || events.is_empty() {
        return Vec::new();
    }

    let uids: HashSet<&str> = failing
        .iter()
        .filter_map(|p| p.metadata.uid.as_deref())
        .collect();

    let mut seen_reasons = HashSet::new();
    events
        .iter()
        .filter(|e| effective_event_type(e) == EVENT_TYPE_WARNING)
        .filter(|e| {
            e.involved_object
                .uid
                .as_deref()
                .map(|uid| uids.contains(uid))
                .unwrap_or(false)
        })
        .filter(|e| seen_reasons.insert(e.reason.clone().unwrap_or_default()))
        .map(|e| WarningSummary {
            message: e.message.clone().unwrap_or_default(),
            reason: e.reason.clone().unwrap_or_default(),
            type_: EVENT_TYPE_WARNING.to_string(),
        })
        .collect()
}

/// Assigns a type to events the cluster left untyped: a failure-looking
/// reason makes it a warning, anything else is normal.
pub fn fill_events_type(events: Vec<Event>) -> Vec<Event> {
    events
        .into_iter()
        .map(|mut event| {
            if event.type_.as_deref().unwrap_or("").is_empty() {
                event.type_ = Some(effective_event_type(&event).to_string());
            }
            event
        })
        .collect()
}

/// Returns true if a pod is in state ready or succeeded.
pub fn is_ready_or_succeeded(pod: &Pod) -> bool {
    let phase = pod
        .status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .unwrap_or("");

    if phase == "Succeeded" {
        return true;
    }
    if phase == "Running" {
        let conditions = pod.status.as_ref().and_then(|s| s.conditions.as_ref());
        if let Some(conditions) = conditions {
            for c in conditions {
                if c.type_ == "Ready" && c.status == "False" {
                    return false;
                }
            }
        }
        return true;
    }

    false
}

/// Lists the cluster's warning-type events through the dispatcher.
pub async fn cluster_warning_events(
    client: &Client,
    scope: &NamespaceScope,
) -> Result<Vec<Event>, EngineError> {
    let params = ListParams::default().fields(&format!("type={}", EVENT_TYPE_WARNING));
    list_channel::<Event>(client, scope, params, "events")
        .recv()
        .await
}

/// Lists events involving the named object in the given namespace.
pub async fn resource_events(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<Vec<Event>, EngineError> {
    let scope = NamespaceScope::namespace(namespace);
    let params = ListParams::default().fields(&format!("involvedObject.name={}", name));
    let events = list_channel::<Event>(client, &scope, params, "events")
        .recv()
        .await?;
    debug!(
        "found {} events involving {} in {} namespace",
        events.len(),
        name,
        namespace
    );
    Ok(fill_events_type(events))
}

/// The event's declared type, or a classification by failure reason when
/// the cluster left it untyped.
fn effective_event_type(event: &Event) -> &str {
    match event.type_.as_deref() {
        Some(t) if !t.is_empty() => t,
        _ => {
            if is_failed_reason(event.reason.as_deref().unwrap_or("")) {
                EVENT_TYPE_WARNING
            } else {
                EVENT_TYPE_NORMAL
            }
        }
    }
}

fn is_failed_reason(reason: &str) -> bool {
    let reason = reason.to_lowercase();
    FAILED_REASON_PARTIALS
        .iter()
        .any(|partial| reason.contains(partial))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{ObjectReference, PodCondition, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn warning_event(uid: &str, reason: &str) -> Event {
        Event {
            involved_object: ObjectReference {
                uid: Some(uid.to_string()),
                ..Default::default()
            },
            reason: Some(reason.to_string()),
            message: Some(format!("{} happened", reason)),
            type_: Some("Warning".to_string()),
            ..Default::default()
        }
    }

    fn pod(uid: &str, phase: &str, ready: Option<&str>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(format!("pod-{}", uid)),
                uid: Some(uid.to_string()),
                ..Default::default()
            },
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                conditions: ready.map(|status| {
                    vec![PodCondition {
                        type_: "Ready".to_string(),
                        status: status.to_string(),
                        ..Default::default()
                    }]
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_warnings_deduplicated_by_reason_in_order() {
        let events = vec![
            warning_event("p1", "BackOff"),
            warning_event("p1", "BackOff"),
            warning_event("p1", "FailedMount"),
        ];
        let pods = vec![pod("p1", "Pending", None)];

        let warnings = pods_event_warnings(&events, &pods);
        let reasons: Vec<&str> = warnings.iter().map(|w| w.reason.as_str()).collect();
        assert_eq!(reasons, vec!["BackOff", "FailedMount"]);
    }

    #[test]
    fn test_events_on_healthy_pods_are_dropped() {
        let events = vec![warning_event("p2", "BackOff")];
        let pods = vec![pod("p2", "Running", Some("True"))];

        let warnings = pods_event_warnings(&events, &pods);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unready_running_pod_counts_as_failing() {
        let events = vec![warning_event("p3", "Unhealthy")];
        let pods = vec![pod("p3", "Running", Some("False"))];

        let warnings = pods_event_warnings(&events, &pods);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].reason, "Unhealthy");
        assert_eq!(warnings[0].type_, "Warning");
    }

    #[test]
    fn test_normal_events_are_filtered_out() {
        let mut scheduled = warning_event("p1", "Scheduled");
        scheduled.type_ = Some("Normal".to_string());
        let pods = vec![pod("p1", "Failed", None)];

        let warnings = pods_event_warnings(&[scheduled], &pods);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_events_for_unknown_uid_are_dropped() {
        let events = vec![warning_event("other", "BackOff")];
        let pods = vec![pod("p1", "Failed", None)];

        let warnings = pods_event_warnings(&events, &pods);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_untyped_event_with_failure_reason_is_a_warning() {
        let mut untyped = warning_event("p1", "FailedMount");
        untyped.type_ = None;
        let pods = vec![pod("p1", "Pending", None)];

        let warnings = pods_event_warnings(&[untyped], &pods);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].type_, "Warning");
    }

    #[test]
    fn test_succeeded_pod_is_healthy() {
        assert!(is_ready_or_succeeded(&pod("p1", "Succeeded", None)));
        assert!(is_ready_or_succeeded(&pod("p1", "Running", Some("True"))));
        assert!(!is_ready_or_succeeded(&pod("p1", "Running", Some("False"))));
        assert!(!is_ready_or_succeeded(&pod("p1", "Pending", None)));
        assert!(!is_ready_or_succeeded(&pod("p1", "Failed", None)));
    }

    #[test]
    fn test_fill_events_type_classifies_by_reason() {
        let mut untyped_failure = warning_event("p1", "FailedScheduling");
        untyped_failure.type_ = None;
        let mut untyped_ok = warning_event("p1", "Pulled");
        untyped_ok.type_ = Some(String::new());

        let filled = fill_events_type(vec![untyped_failure, untyped_ok]);
        assert_eq!(filled[0].type_.as_deref(), Some("Warning"));
        assert_eq!(filled[1].type_.as_deref(), Some("Normal"));
    }
}
