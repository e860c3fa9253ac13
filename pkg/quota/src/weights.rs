use bigdecimal::BigDecimal;
use num_traits::{Signed, Zero};
use pkg_types::pod::{ResourceList, ResourceName, ResourceRequirements};
use pkg_types::quantity::Quantity;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::warn;

/// A sparse vector of exact resource amounts, keyed by resource kind.
///
/// An absent key means nothing is declared for that kind, which is not the
/// same as a zero amount: a quota with no `memory` key leaves memory
/// unconstrained. All arithmetic mutates the receiver in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Weights(BTreeMap<ResourceName, BigDecimal>);

impl Weights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a resource list to weights. Exact: quantities already hold
    /// arbitrary-precision decimals.
    pub fn from_resources(resources: &ResourceList) -> Self {
        Self(
            resources
                .iter()
                .map(|(name, quantity)| (name.clone(), quantity.as_decimal().clone()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&BigDecimal> {
        self.0.get(name)
    }

    /// Sets one kind outright. Crate-internal: outside callers build
    /// weights from resource lists and arithmetic only.
    pub(crate) fn insert(
        &mut self,
        name: impl Into<ResourceName>,
        value: BigDecimal,
    ) -> Option<BigDecimal> {
        self.0.insert(name.into(), value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceName, &BigDecimal)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Add weights to receiver.
    pub fn add(&mut self, other: &Weights) {
        for (name, value) in &other.0 {
            *self.0.entry(name.clone()).or_insert_with(BigDecimal::zero) += value;
        }
    }

    /// Subtract weights from receiver. Missing kinds start at zero, so the
    /// result may go negative.
    pub fn sub(&mut self, other: &Weights) {
        for (name, value) in &other.0 {
            *self.0.entry(name.clone()).or_insert_with(BigDecimal::zero) -= value;
        }
    }

    /// Subtract usage from a quota. Kinds the quota does not declare stay
    /// undeclared, and so stay unlimited.
    pub fn quota_sub(&mut self, other: &Weights) {
        for (name, value) in &other.0 {
            if let Some(current) = self.0.get_mut(name) {
                *current -= value;
            }
        }
    }

    /// Add `coefficient * other` to receiver.
    pub fn add_prod(&mut self, coefficient: i32, other: &Weights) {
        let factor = BigDecimal::from(coefficient);
        for (name, value) in &other.0 {
            let scaled = factor.clone() * value;
            *self.0.entry(name.clone()).or_insert_with(BigDecimal::zero) += scaled;
        }
    }

    /// Raise receiver to the per-kind maximum of receiver and `other`.
    pub fn max(&mut self, other: &Weights) {
        for (name, value) in &other.0 {
            let current = self.0.entry(name.clone()).or_insert_with(BigDecimal::zero);
            if *current < *value {
                *current = value.clone();
            }
        }
    }

    /// True if every positive amount in the receiver is matched by an equal
    /// or larger amount in `other`. A kind missing from `other` fails.
    /// Otherwise returns the kinds that fell short.
    pub fn fits(&self, other: &Weights) -> (bool, Vec<ResourceName>) {
        let mut insufficient = Vec::new();
        for (name, value) in &self.0 {
            if !value.is_positive() {
                continue;
            }
            match other.0.get(name) {
                Some(available) if value <= available => {}
                _ => insufficient.push(name.clone()),
            }
        }
        (insufficient.is_empty(), insufficient)
    }

    /// Like [`Weights::fits`], except a kind missing from `other` is
    /// unconstrained and never fails.
    pub fn quota_fits(&self, other: &Weights) -> (bool, Vec<ResourceName>) {
        let mut insufficient = Vec::new();
        for (name, value) in &self.0 {
            if !value.is_positive() {
                continue;
            }
            if let Some(available) = other.0.get(name)
                && value > available
            {
                insufficient.push(name.clone());
            }
        }
        (insufficient.is_empty(), insufficient)
    }

    /// Converts weights back to a resource list.
    ///
    /// Every amount is checked to render and re-parse to the same value; a
    /// mismatch is logged and the exact decimal is kept.
    pub fn as_resources(&self) -> ResourceList {
        self.0
            .iter()
            .map(|(name, value)| {
                let quantity = Quantity::from_decimal(value.clone());
                let text = quantity.to_string();
                match text.parse::<Quantity>() {
                    Ok(parsed) if parsed == quantity => {}
                    _ => warn!(
                        "Resource {} = {} does not survive rendering as '{}'",
                        name, value, text
                    ),
                }
                (name.clone(), quantity)
            })
            .collect()
    }
}

impl fmt::Display for Weights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, Quantity::from_decimal(value.clone()))?;
        }
        f.write_str("}")
    }
}

/// Requests and limits of one workload or one quota, compared independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightsPair {
    requests: Weights,
    limits: Weights,
}

impl WeightsPair {
    pub fn new(requests: Weights, limits: Weights) -> Self {
        Self { requests, limits }
    }

    pub fn from_requirements(resources: &ResourceRequirements) -> Self {
        Self::new(
            Weights::from_resources(&resources.requests),
            Weights::from_resources(&resources.limits),
        )
    }

    pub fn requests(&self) -> &Weights {
        &self.requests
    }

    pub fn limits(&self) -> &Weights {
        &self.limits
    }

    pub fn add(&mut self, other: &WeightsPair) {
        self.requests.add(&other.requests);
        self.limits.add(&other.limits);
    }

    pub fn quota_sub(&mut self, other: &WeightsPair) {
        self.requests.quota_sub(&other.requests);
        self.limits.quota_sub(&other.limits);
    }

    pub fn max(&mut self, other: &WeightsPair) {
        self.requests.max(&other.requests);
        self.limits.max(&other.limits);
    }

    /// True if both requests and limits fit the corresponding quota weights.
    /// Otherwise returns the de-duplicated kinds short on either side.
    pub fn fits(&self, quota: &WeightsPair) -> (bool, Vec<ResourceName>) {
        let (requests_fit, requests_insufficient) = self.requests.quota_fits(&quota.requests);
        let (limits_fit, limits_insufficient) = self.limits.quota_fits(&quota.limits);
        if requests_fit && limits_fit {
            return (true, Vec::new());
        }
        let mut insufficient = requests_insufficient;
        insufficient.extend(limits_insufficient);
        (false, remove_duplicate_resources(insufficient))
    }
}

impl fmt::Display for WeightsPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Requests: {}}}; {{Limits: {}}}", self.requests, self.limits)
    }
}

/// Drop repeated names, keeping the first occurrence of each.
pub fn remove_duplicate_resources(names: Vec<ResourceName>) -> Vec<ResourceName> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
