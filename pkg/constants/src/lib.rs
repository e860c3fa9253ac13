//! Centralized constants for the mcad dispatcher.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod paths;
pub mod resources;
