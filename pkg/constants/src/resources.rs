//! Resource-name constants shared by the quota accounting code.

// ─── Quota key prefixes ───────────────────────────────────────────────────

/// Prefix of a quota key that constrains requests, e.g. `requests.cpu`.
/// A prefixed key is equivalent to its plain spelling (`cpu`).
pub const REQUESTS_PREFIX: &str = "requests.";

/// Prefix of a quota key that constrains limits, e.g. `limits.memory`.
pub const LIMITS_PREFIX: &str = "limits.";

// ─── Resource names ───────────────────────────────────────────────────────

/// Maximum length of a qualified resource-kind name
/// (e.g. `nvidia.com/gpu`).
pub const MAX_RESOURCE_NAME_LEN: usize = 253;
