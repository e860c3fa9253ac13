use pkg_constants::resources::{LIMITS_PREFIX, REQUESTS_PREFIX};
use pkg_types::appwrapper::AppWrapper;
use pkg_types::pod::{PodSpec, ResourceList, ResourceRequirements};
use pkg_types::quota::ResourceQuota;

use crate::weights::{Weights, WeightsPair};

/// Effective demand of one pod along one dimension.
///
/// Containers run together, so their amounts add up; init containers run
/// one at a time before them, so only the largest counts against the sum.
fn pod_weights(pod: &PodSpec, select: fn(&ResourceRequirements) -> &ResourceList) -> Weights {
    let mut weights = Weights::new();
    for container in &pod.containers {
        weights.add(&Weights::from_resources(select(&container.resources)));
    }
    for init_container in &pod.init_containers {
        weights.max(&Weights::from_resources(select(&init_container.resources)));
    }
    weights
}

/// Converts the effective resource requests of a pod to weights.
/// Pod overhead is charged on top.
pub fn weights_for_pod(pod: &PodSpec) -> Weights {
    let mut weights = pod_weights(pod, |r| &r.requests);
    if let Some(overhead) = &pod.overhead {
        weights.add(&Weights::from_resources(overhead));
    }
    weights
}

/// Converts the effective resource limits of a pod to weights.
/// Overhead does not count against limits.
pub fn limits_weights_for_pod(pod: &PodSpec) -> Weights {
    pod_weights(pod, |r| &r.limits)
}

pub fn weights_pair_for_pod(pod: &PodSpec) -> WeightsPair {
    WeightsPair::new(weights_for_pod(pod), limits_weights_for_pod(pod))
}

/// Aggregate requests and limits over every item of an AppWrapper.
///
/// An item with declared `custom_pod_resources` is charged exactly those,
/// each for its own replica count; otherwise its pod template is charged
/// `replicas` times. An item with neither adds nothing.
pub fn weights_pair_for_app_wrapper(app_wrapper: &AppWrapper) -> WeightsPair {
    let mut requests = Weights::new();
    let mut limits = Weights::new();
    for item in &app_wrapper.spec.resources.generic_items {
        if !item.custom_pod_resources.is_empty() {
            for declared in &item.custom_pod_resources {
                let declared_requests = Weights::from_resources(&declared.requests);
                let declared_limits = match &declared.limits {
                    Some(l) => Weights::from_resources(l),
                    None => declared_requests.clone(),
                };
                requests.add_prod(declared.replicas, &declared_requests);
                limits.add_prod(declared.replicas, &declared_limits);
            }
        } else if let Some(template) = &item.template {
            requests.add_prod(item.replicas, &weights_for_pod(template));
            limits.add_prod(item.replicas, &limits_weights_for_pod(template));
        }
    }
    WeightsPair::new(requests, limits)
}

/// Split a quota resource list into requests and limits.
///
/// `limits.<name>` feeds limits, keeping the first value seen per name.
/// `requests.<name>` and a plain `<name>` both feed requests; when both
/// spellings are present the smaller amount wins.
pub fn weights_pair_for_resource_list(resources: &ResourceList) -> WeightsPair {
    let mut requests = Weights::new();
    let mut limits = Weights::new();
    for (key, quantity) in resources {
        let value = quantity.as_decimal();
        if let Some(name) = key.strip_prefix(LIMITS_PREFIX) {
            if limits.get(name).is_none() {
                limits.insert(name, value.clone());
            }
            continue;
        }
        let name = key.strip_prefix(REQUESTS_PREFIX).unwrap_or(key);
        if requests.get(name).is_none_or(|current| value < current) {
            requests.insert(name, value.clone());
        }
    }
    WeightsPair::new(requests, limits)
}

/// Quota ceiling and reported usage of a ResourceQuota, each as a pair.
pub fn quota_and_used_weights(quota: &ResourceQuota) -> (WeightsPair, WeightsPair) {
    (
        weights_pair_for_resource_list(&quota.hard),
        weights_pair_for_resource_list(&quota.used),
    )
}
