//! Filesystem path constants.

/// Default config file path for the dispatcher.
pub const DEFAULT_DISPATCH_CONFIG: &str = "/etc/mcad/config.yaml";

/// Snapshot read when neither the CLI nor the config file names one.
pub const DEFAULT_SNAPSHOT: &str = "snapshot.yaml";
