use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pod::{PodSpec, ResourceList};

// --- Declared resources ---

/// Explicitly declared per-pod resources for `replicas` identical pods.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomPodResource {
    #[serde(default = "default_replicas")]
    pub replicas: i32,
    #[serde(default)]
    pub requests: ResourceList,
    /// Falls back to `requests` when absent
    #[serde(default)]
    pub limits: Option<ResourceList>,
}

// --- Generic item ---

/// One pod-producing item wrapped by an AppWrapper.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct GenericItem {
    /// Number of pods stamped from `template`
    #[serde(default = "default_replicas")]
    pub replicas: i32,
    #[serde(default)]
    pub template: Option<PodSpec>,
    /// When non-empty, overrides the demand derived from `template`
    #[serde(default, alias = "customPodResources", alias = "custom-pod-resources")]
    pub custom_pod_resources: Vec<CustomPodResource>,
}

fn default_replicas() -> i32 {
    1
}

// --- AppWrapper ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppWrapperResources {
    #[serde(default, alias = "genericItems", alias = "generic-items")]
    pub generic_items: Vec<GenericItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppWrapperSpec {
    #[serde(default)]
    pub resources: AppWrapperResources,
}

/// A batch workload grouping several pod-producing items that are
/// admitted, or not, as a unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppWrapper {
    pub name: String,
    pub namespace: String,
    /// Higher is dispatched first
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub spec: AppWrapperSpec,
    #[serde(default = "Utc::now", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}
