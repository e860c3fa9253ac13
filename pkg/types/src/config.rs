use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::appwrapper::AppWrapper;
use crate::pod::ResourceRequirements;
use crate::quota::ResourceQuota;

/// Dispatcher configuration file (YAML).
///
/// Example `config.yaml`:
/// ```yaml
/// snapshot: /var/lib/mcad/snapshot.yaml
/// log-format: json
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfigFile {
    #[serde(default)]
    pub snapshot: Option<String>,
    #[serde(default, alias = "log-format")]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Everything one dispatch cycle looks at.
///
/// Example `snapshot.yaml`:
/// ```yaml
/// quotas:
///   - name: compute
///     namespace: team-a
///     hard: { requests.cpu: "10", limits.memory: 64Gi }
///     used: { requests.cpu: "3" }
/// external-demand:
///   team-a:
///     requests: { cpu: "1" }
/// app-wrappers:
///   - name: train
///     namespace: team-a
///     spec:
///       resources:
///         generic-items:
///           - replicas: 2
///             custom-pod-resources:
///               - replicas: 2
///                 requests: { cpu: 500m }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchSnapshot {
    #[serde(default)]
    pub quotas: Vec<ResourceQuota>,
    /// Demand already dispatched but not yet reflected in quota `used`
    #[serde(default, alias = "external-demand")]
    pub external_demand: BTreeMap<String, ResourceRequirements>,
    /// Candidates for this cycle
    #[serde(default, alias = "app-wrappers")]
    pub app_wrappers: Vec<AppWrapper>,
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Load a dispatch snapshot. Unlike config, a missing snapshot is an error.
pub fn load_snapshot(path: &str) -> anyhow::Result<DispatchSnapshot> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading snapshot {}", path))?;
    serde_yaml::from_str(&content).with_context(|| format!("parsing snapshot {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;

    #[test]
    fn missing_config_is_default() {
        let cfg: DispatchConfigFile = load_config_file("/nonexistent/mcad/config.yaml").unwrap();
        assert!(cfg.snapshot.is_none());
        assert!(cfg.log_format.is_none());
    }

    #[test]
    fn config_accepts_kebab_case() {
        let cfg: DispatchConfigFile =
            serde_yaml::from_str("snapshot: /tmp/s.yaml\nlog-format: json\n").unwrap();
        assert_eq!(cfg.snapshot.as_deref(), Some("/tmp/s.yaml"));
        assert_eq!(cfg.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn snapshot_parses() {
        let yaml = r#"
quotas:
  - name: compute
    namespace: team-a
    hard: { requests.cpu: "10", limits.memory: 64Gi }
    used: { requests.cpu: 3 }
external-demand:
  team-a:
    requests: { cpu: 500m }
app-wrappers:
  - name: train
    namespace: team-a
    priority: 5
    spec:
      resources:
        generic-items:
          - replicas: 2
            custom-pod-resources:
              - replicas: 4
                requests: { cpu: 250m }
"#;
        let snap: DispatchSnapshot = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(snap.quotas.len(), 1);
        assert_eq!(snap.quotas[0].hard["limits.memory"], "64Gi".parse::<Quantity>().unwrap());
        assert_eq!(snap.quotas[0].used["requests.cpu"], Quantity::from(3));
        assert_eq!(
            snap.external_demand["team-a"].requests["cpu"],
            "0.5".parse::<Quantity>().unwrap()
        );
        let item = &snap.app_wrappers[0].spec.resources.generic_items[0];
        assert_eq!(snap.app_wrappers[0].priority, 5);
        assert_eq!(item.replicas, 2);
        assert_eq!(item.custom_pod_resources[0].replicas, 4);
        assert!(item.custom_pod_resources[0].limits.is_none());
    }
}
