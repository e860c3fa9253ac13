//! Quota accounting for the AppWrapper dispatcher.
//!
//! [`Weights`] and [`WeightsPair`] model resource demand and capacity as
//! exact decimals; [`QuotaTracker`] checks AppWrapper demand against each
//! namespace's remaining quota and reserves it for the rest of a dispatch
//! cycle.

pub mod aggregate;
pub mod tracker;
pub mod weights;

pub use aggregate::{
    limits_weights_for_pod, quota_and_used_weights, weights_for_pod, weights_pair_for_app_wrapper,
    weights_pair_for_pod, weights_pair_for_resource_list,
};
pub use tracker::{QuotaState, QuotaTracker};
pub use weights::{Weights, WeightsPair, remove_duplicate_resources};
