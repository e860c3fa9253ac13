use anyhow::{Context, bail};
use pkg_quota::{QuotaTracker, WeightsPair, weights_pair_for_app_wrapper};
use pkg_types::appwrapper::AppWrapper;
use pkg_types::config::DispatchSnapshot;
use pkg_types::pod::{ResourceList, ResourceName};
use pkg_types::quota::ResourceQuota;
use pkg_types::validate::{validate_name, validate_resource_name};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::{info, warn};

/// Outcome of one AppWrapper in a dispatch cycle.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Decision {
    pub name: String,
    pub namespace: String,
    pub admitted: bool,
    /// Resource kinds whose quota could not absorb the demand
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub insufficient: Vec<ResourceName>,
    pub requests: ResourceList,
    pub limits: ResourceList,
}

/// Demand must never be negative: a negative ask passes every fit check
/// and, once allocated, inflates the remaining quota.
fn validate_demand(resources: &ResourceList) -> anyhow::Result<()> {
    for (name, quantity) in resources {
        validate_resource_name(name)?;
        if quantity.is_negative() {
            bail!("resource '{}' has negative amount {}", name, quantity);
        }
    }
    Ok(())
}

fn validate_app_wrapper(aw: &AppWrapper) -> anyhow::Result<()> {
    validate_name(&aw.namespace)?;
    for (i, item) in aw.spec.resources.generic_items.iter().enumerate() {
        if item.replicas < 0 {
            bail!("item {} has negative replicas {}", i, item.replicas);
        }
        for declared in &item.custom_pod_resources {
            if declared.replicas < 0 {
                bail!("item {} declares negative replicas {}", i, declared.replicas);
            }
            validate_demand(&declared.requests).with_context(|| format!("item {}", i))?;
            if let Some(limits) = &declared.limits {
                validate_demand(limits).with_context(|| format!("item {}", i))?;
            }
        }
        if let Some(template) = &item.template {
            let pod = template.containers.iter().chain(&template.init_containers);
            for container in pod {
                validate_demand(&container.resources.requests)
                    .and_then(|_| validate_demand(&container.resources.limits))
                    .with_context(|| format!("item {} container {}", i, container.name))?;
            }
            if let Some(overhead) = &template.overhead {
                validate_demand(overhead).with_context(|| format!("item {} overhead", i))?;
            }
        }
    }
    Ok(())
}

/// Reject snapshots with malformed namespaces or resource names, or with
/// negative demand, before anything is checked against them.
pub fn validate_snapshot(snapshot: &DispatchSnapshot) -> anyhow::Result<()> {
    for quota in &snapshot.quotas {
        validate_name(&quota.namespace)
            .with_context(|| format!("quota {}", quota.name))?;
        for name in quota.hard.keys().chain(quota.used.keys()) {
            validate_resource_name(name)
                .with_context(|| format!("quota {}/{}", quota.namespace, quota.name))?;
        }
    }
    for (namespace, demand) in &snapshot.external_demand {
        validate_name(namespace).context("external demand")?;
        validate_demand(&demand.requests)
            .and_then(|_| validate_demand(&demand.limits))
            .with_context(|| format!("external demand of {}", namespace))?;
    }
    for aw in &snapshot.app_wrappers {
        validate_app_wrapper(aw).with_context(|| format!("AppWrapper {}", aw.name))?;
    }
    Ok(())
}

/// Run one dispatch cycle over the snapshot.
///
/// AppWrappers are considered by descending priority, ties in snapshot
/// order. Each admitted AppWrapper is charged to its namespace before the
/// next one is checked.
pub fn run_cycle(snapshot: &DispatchSnapshot) -> Vec<Decision> {
    let mut tracker = QuotaTracker::new();
    tracker.init(
        snapshot
            .external_demand
            .iter()
            .map(|(ns, demand)| (ns.clone(), WeightsPair::from_requirements(demand)))
            .collect::<HashMap<_, _>>(),
    );

    let mut candidates: Vec<&AppWrapper> = snapshot.app_wrappers.iter().collect();
    candidates.sort_by_key(|aw| Reverse(aw.priority));

    info!(
        "Dispatch cycle: {} AppWrapper(s), {} quota(s)",
        candidates.len(),
        snapshot.quotas.len()
    );
    candidates
        .into_iter()
        .map(|aw| dispatch_one(&mut tracker, &snapshot.quotas, aw))
        .collect()
}

fn dispatch_one(tracker: &mut QuotaTracker, quotas: &[ResourceQuota], aw: &AppWrapper) -> Decision {
    let ask = weights_pair_for_app_wrapper(aw);
    let (admitted, insufficient) = match quotas.iter().find(|q| q.namespace == aw.namespace) {
        None => {
            info!("AppWrapper {}/{} admitted (no quota in namespace)", aw.namespace, aw.name);
            (true, Vec::new())
        }
        Some(quota) => {
            let (fits, insufficient) = tracker.satisfies(&ask, quota);
            if !fits {
                info!(
                    "AppWrapper {}/{} denied: insufficient quota for {}",
                    aw.namespace,
                    aw.name,
                    insufficient.join(", ")
                );
                (false, insufficient)
            } else if tracker.allocate(&aw.namespace, &ask) {
                info!("AppWrapper {}/{} admitted: {}", aw.namespace, aw.name, ask);
                (true, Vec::new())
            } else {
                warn!("AppWrapper {}/{} fit but could not be allocated", aw.namespace, aw.name);
                (false, Vec::new())
            }
        }
    };

    Decision {
        name: aw.name.clone(),
        namespace: aw.namespace.clone(),
        admitted,
        insufficient,
        requests: ask.requests().as_resources(),
        limits: ask.limits().as_resources(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pkg_types::appwrapper::{
        AppWrapperResources, AppWrapperSpec, CustomPodResource, GenericItem,
    };
    use pkg_types::pod::{ContainerSpec, PodSpec, ResourceRequirements};
    use std::collections::BTreeMap;

    fn make_list(entries: &[(&str, &str)]) -> ResourceList {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.parse().unwrap()))
            .collect()
    }

    fn make_quota(namespace: &str, hard: &[(&str, &str)], used: &[(&str, &str)]) -> ResourceQuota {
        ResourceQuota {
            name: "compute".to_string(),
            namespace: namespace.to_string(),
            hard: make_list(hard),
            used: make_list(used),
            created_at: Utc::now(),
        }
    }

    fn make_aw(name: &str, namespace: &str, priority: i32, cpu: &str) -> AppWrapper {
        AppWrapper {
            name: name.to_string(),
            namespace: namespace.to_string(),
            priority,
            spec: AppWrapperSpec {
                resources: AppWrapperResources {
                    generic_items: vec![GenericItem {
                        replicas: 1,
                        template: None,
                        custom_pod_resources: vec![CustomPodResource {
                            replicas: 1,
                            requests: make_list(&[("cpu", cpu)]),
                            limits: None,
                        }],
                    }],
                },
            },
            created_at: Utc::now(),
        }
    }

    fn admitted(decisions: &[Decision]) -> Vec<&str> {
        decisions
            .iter()
            .filter(|d| d.admitted)
            .map(|d| d.name.as_str())
            .collect()
    }

    #[test]
    fn test_cycle_admits_in_priority_order() {
        let snapshot = DispatchSnapshot {
            quotas: vec![make_quota("ns1", &[("cpu", "10")], &[("cpu", "3")])],
            external_demand: BTreeMap::new(),
            app_wrappers: vec![
                make_aw("low", "ns1", 0, "4"),
                make_aw("high", "ns1", 10, "5"),
                make_aw("small", "ns1", 0, "2"),
            ],
        };
        let decisions = run_cycle(&snapshot);

        let order: Vec<&str> = decisions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(order, vec!["high", "low", "small"]);
        assert_eq!(admitted(&decisions), vec!["high", "small"]);
        assert_eq!(decisions[1].insufficient, vec!["cpu".to_string()]);
        assert_eq!(decisions[0].requests["cpu"].to_string(), "5");
    }

    #[test]
    fn test_cycle_namespace_without_quota_admits() {
        let snapshot = DispatchSnapshot {
            quotas: vec![make_quota("ns1", &[("cpu", "1")], &[])],
            external_demand: BTreeMap::new(),
            app_wrappers: vec![make_aw("free", "ns2", 0, "100")],
        };
        assert_eq!(admitted(&run_cycle(&snapshot)), vec!["free"]);
    }

    #[test]
    fn test_cycle_charges_external_demand() {
        let snapshot = DispatchSnapshot {
            quotas: vec![make_quota("ns1", &[("requests.cpu", "4")], &[])],
            external_demand: BTreeMap::from([(
                "ns1".to_string(),
                ResourceRequirements {
                    requests: make_list(&[("cpu", "3")]),
                    limits: ResourceList::new(),
                },
            )]),
            app_wrappers: vec![make_aw("a", "ns1", 0, "2"), make_aw("b", "ns1", 0, "1")],
        };
        assert_eq!(admitted(&run_cycle(&snapshot)), vec!["b"]);
    }

    #[test]
    fn test_each_cycle_starts_fresh() {
        let snapshot = DispatchSnapshot {
            quotas: vec![make_quota("ns1", &[("cpu", "2")], &[])],
            external_demand: BTreeMap::new(),
            app_wrappers: vec![make_aw("a", "ns1", 0, "2")],
        };
        assert_eq!(admitted(&run_cycle(&snapshot)), vec!["a"]);
        assert_eq!(admitted(&run_cycle(&snapshot)), vec!["a"]);
    }

    #[test]
    fn test_validate_snapshot() {
        let mut snapshot = DispatchSnapshot {
            quotas: vec![make_quota("ns1", &[("limits.cpu", "2")], &[])],
            external_demand: BTreeMap::new(),
            app_wrappers: vec![make_aw("a", "ns1", 0, "1")],
        };
        assert!(validate_snapshot(&snapshot).is_ok());

        snapshot.quotas[0].hard = make_list(&[("limits.", "2")]);
        assert!(validate_snapshot(&snapshot).is_err());

        snapshot.quotas[0].hard = ResourceList::new();
        snapshot.app_wrappers[0].namespace = "Bad_NS".to_string();
        assert!(validate_snapshot(&snapshot).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_demand() {
        let mut neg = make_aw("neg", "ns1", 10, "1");
        neg.spec.resources.generic_items[0].custom_pod_resources[0].replicas = -100;
        let snapshot = DispatchSnapshot {
            quotas: vec![make_quota("ns1", &[("cpu", "4")], &[])],
            external_demand: BTreeMap::new(),
            app_wrappers: vec![neg, make_aw("big", "ns1", 0, "50")],
        };
        let err = validate_snapshot(&snapshot).unwrap_err();
        assert!(format!("{:#}", err).contains("negative replicas"));

        let mut snapshot = snapshot;
        snapshot.app_wrappers[0] = make_aw("neg", "ns1", 10, "-100");
        assert!(validate_snapshot(&snapshot).is_err());

        snapshot.app_wrappers[0] = make_aw("neg", "ns1", 10, "1");
        snapshot.app_wrappers[0].spec.resources.generic_items[0].replicas = -1;
        assert!(validate_snapshot(&snapshot).is_err());

        snapshot.app_wrappers[0].spec.resources.generic_items[0].replicas = 1;
        assert!(validate_snapshot(&snapshot).is_ok());
        // a 50-cpu workload never fits a 4-cpu quota
        assert_eq!(admitted(&run_cycle(&snapshot)), vec!["neg"]);
    }

    #[test]
    fn test_validate_rejects_negative_template_and_external_demand() {
        let mut aw = make_aw("a", "ns1", 0, "1");
        aw.spec.resources.generic_items[0] = GenericItem {
            replicas: 2,
            template: Some(PodSpec {
                containers: vec![ContainerSpec {
                    name: "app".to_string(),
                    image: "busybox:latest".to_string(),
                    resources: ResourceRequirements {
                        requests: make_list(&[("cpu", "1")]),
                        limits: make_list(&[("memory", "-1Gi")]),
                    },
                }],
                init_containers: vec![],
                overhead: None,
            }),
            custom_pod_resources: vec![],
        };
        let mut snapshot = DispatchSnapshot {
            quotas: vec![],
            external_demand: BTreeMap::new(),
            app_wrappers: vec![aw],
        };
        assert!(validate_snapshot(&snapshot).is_err());

        snapshot.app_wrappers.clear();
        snapshot.external_demand.insert(
            "ns1".to_string(),
            ResourceRequirements {
                requests: make_list(&[("cpu", "-3")]),
                limits: ResourceList::new(),
            },
        );
        assert!(validate_snapshot(&snapshot).is_err());
    }

    #[test]
    fn test_decision_json_omits_empty_insufficient() {
        let decision = Decision {
            name: "a".to_string(),
            namespace: "ns1".to_string(),
            admitted: true,
            insufficient: vec![],
            requests: make_list(&[("cpu", "1.5")]),
            limits: ResourceList::new(),
        };
        let json = serde_json::to_string(&decision).unwrap();
        assert_eq!(
            json,
            r#"{"name":"a","namespace":"ns1","admitted":true,"requests":{"cpu":"1500m"},"limits":{}}"#
        );
    }
}
