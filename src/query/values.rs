use chrono::{DateTime, SecondsFormat, Utc};
use std::cmp::Ordering;

/// Polymorphic property value supporting ordering and substring matching.
///
/// Comparisons across different variants are incomparable rather than a
/// panic; in practice a query only ever compares like-kind lists, so the
/// mismatch arm exists to keep the contract total.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparableValue {
    Str(String),
    Time(DateTime<Utc>),
    Quantity(i64),
}

impl ComparableValue {
    pub fn str(value: impl Into<String>) -> Self {
        ComparableValue::Str(value.into())
    }

    /// Total order within a variant; `None` across variants.
    pub fn compare(&self, other: &ComparableValue) -> Option<Ordering> {
        match (self, other) {
            (ComparableValue::Str(a), ComparableValue::Str(b)) => Some(a.cmp(b)),
            (ComparableValue::Time(a), ComparableValue::Time(b)) => Some(a.cmp(b)),
            (ComparableValue::Quantity(a), ComparableValue::Quantity(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Case-sensitive literal containment against the value's rendering.
    pub fn contains(&self, pattern: &str) -> bool {
        match self {
            ComparableValue::Str(s) => s.contains(pattern),
            ComparableValue::Time(t) => t
                .to_rfc3339_opts(SecondsFormat::Secs, true)
                .contains(pattern),
            ComparableValue::Quantity(q) => q.to_string().contains(pattern),
        }
    }
}

/// Capability that makes a resource instance queryable: expose named,
/// comparable properties. Unknown names return `None`, which the pipeline
/// treats as an always-false filter term and a no-effect sort key.
pub trait PropertyAccessor {
    fn property(&self, name: &str) -> Option<ComparableValue>;
}
