use pkg_types::pod::ResourceName;
use pkg_types::quota::ResourceQuota;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::aggregate::quota_and_used_weights;
use crate::weights::WeightsPair;

/// Total quota, reported usage, and what this cycle has allocated so far,
/// for one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaState {
    /// Ceiling enforced by the ResourceQuota object
    quota: WeightsPair,
    /// Usage in the status of the ResourceQuota object
    used: WeightsPair,
    /// Allocated to AppWrappers admitted in the current dispatch cycle
    allocated: WeightsPair,
}

impl QuotaState {
    pub fn from_resource_quota(resource_quota: &ResourceQuota) -> Self {
        let (quota, used) = quota_and_used_weights(resource_quota);
        Self {
            quota,
            used,
            allocated: WeightsPair::default(),
        }
    }

    pub fn quota(&self) -> &WeightsPair {
        &self.quota
    }

    pub fn used(&self) -> &WeightsPair {
        &self.used
    }

    pub fn allocated(&self) -> &WeightsPair {
        &self.allocated
    }

    /// Quota left after usage, this cycle's allocations, and any external
    /// demand. Kinds the quota does not declare stay undeclared.
    pub fn remaining(&self, external_demand: Option<&WeightsPair>) -> WeightsPair {
        let mut remaining = self.quota.clone();
        remaining.quota_sub(&self.used);
        remaining.quota_sub(&self.allocated);
        if let Some(external) = external_demand {
            remaining.quota_sub(external);
        }
        remaining
    }
}

/// Tracks quota allocated during one dispatch cycle, per namespace.
///
/// Build a fresh tracker for every cycle: allocations are never released,
/// so a tracker carried over would keep charging work from earlier cycles.
/// Candidates are expected one at a time, `satisfies` then, if admitted,
/// `allocate` before the next one is checked.
#[derive(Debug, Default)]
pub struct QuotaTracker {
    state: HashMap<String, QuotaState>,
    /// Demand of dispatched AppWrappers not yet reflected in the `used`
    /// status of their namespace's quota, e.g. pods still waiting on the
    /// platform's own quota admission.
    external_demand: HashMap<String, WeightsPair>,
}

impl QuotaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the external demand for this cycle, replacing whatever was
    /// installed before.
    pub fn init(&mut self, external_demand: HashMap<String, WeightsPair>) {
        debug!(
            "QuotaTracker init with external demand for {} namespace(s)",
            external_demand.len()
        );
        self.external_demand = external_demand;
    }

    /// Check whether an AppWrapper's demand fits a namespace's remaining
    /// quota without allocating it. Returns the kinds with insufficient quota.
    ///
    /// The first snapshot seen for a namespace is kept for the rest of the
    /// cycle; later snapshots for the same namespace are ignored.
    pub fn satisfies(
        &mut self,
        ask: &WeightsPair,
        resource_quota: &ResourceQuota,
    ) -> (bool, Vec<ResourceName>) {
        let namespace = resource_quota.namespace.as_str();
        let state = self
            .state
            .entry(namespace.to_string())
            .or_insert_with(|| QuotaState::from_resource_quota(resource_quota));

        let external = self.external_demand.get(namespace);
        let remaining = state.remaining(external);
        let (fits, insufficient) = ask.fits(&remaining);

        debug!(
            namespace,
            quota = %state.quota,
            used = %state.used,
            allocated = %state.allocated,
            external = %external.cloned().unwrap_or_default(),
            remaining = %remaining,
            ask = %ask,
            fits,
            "QuotaTracker satisfies"
        );
        (fits, insufficient)
    }

    /// Charge an AppWrapper's demand to a namespace's allocation.
    ///
    /// Fails without side effects if the namespace has not been seen by
    /// `satisfies` in this cycle.
    pub fn allocate(&mut self, namespace: &str, ask: &WeightsPair) -> bool {
        match self.state.get_mut(namespace) {
            Some(state) => {
                state.allocated.add(ask);
                debug!("Allocated {} in namespace {}", ask, namespace);
                true
            }
            None => {
                warn!("Cannot allocate in untracked namespace {}", namespace);
                false
            }
        }
    }

    /// State of a namespace, if it has been seen this cycle.
    pub fn state(&self, namespace: &str) -> Option<&QuotaState> {
        self.state.get(namespace)
    }
}
