use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::quantity::Quantity;

/// Name of a resource kind, e.g. `cpu`, `memory`, `nvidia.com/gpu`.
pub type ResourceName = String;

/// Resource kind → amount. Ordered so every derived list is deterministic.
pub type ResourceList = BTreeMap<ResourceName, Quantity>;

// --- Resource requirements ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ResourceRequirements {
    /// Amount the container is guaranteed
    #[serde(default)]
    pub requests: ResourceList,
    /// Amount the container may not exceed
    #[serde(default)]
    pub limits: ResourceList,
}

// --- Container spec ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub resources: ResourceRequirements,
}

// --- Pod spec ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
    /// Run one at a time, to completion, before `containers` start
    #[serde(default, alias = "initContainers", alias = "init-containers")]
    pub init_containers: Vec<ContainerSpec>,
    /// Per-pod cost of the sandbox, charged on top of the containers
    #[serde(default)]
    pub overhead: Option<ResourceList>,
}
