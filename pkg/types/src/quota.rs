use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pod::ResourceList;

/// Resource quota snapshot for a namespace.
///
/// Keys of `hard` and `used` may carry a `requests.` or `limits.` prefix;
/// a plain key constrains requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceQuota {
    pub name: String,
    pub namespace: String,
    /// Ceiling enforced by the quota
    #[serde(default)]
    pub hard: ResourceList,
    /// Consumption as last reported by the platform
    #[serde(default)]
    pub used: ResourceList,
    #[serde(default = "Utc::now", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}
