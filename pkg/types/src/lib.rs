//! Shapes the quota accounting core consumes: quantities, resource lists,
//! pod specs, quota snapshots and AppWrappers.

pub mod appwrapper;
pub mod config;
pub mod pod;
pub mod quantity;
pub mod quota;
pub mod validate;
