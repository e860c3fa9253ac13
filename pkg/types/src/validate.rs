use anyhow::{Result, bail};
use pkg_constants::resources::{LIMITS_PREFIX, MAX_RESOURCE_NAME_LEN, REQUESTS_PREFIX};

/// Validate a Kubernetes-style resource name.
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, no leading/trailing hyphens.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("name must not be empty");
    }
    if name.len() > 63 {
        bail!("name '{}' exceeds 63 characters (got {})", name, name.len());
    }
    if name.starts_with('-') || name.ends_with('-') {
        bail!("name '{}' must not start or end with a hyphen", name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!(
            "name '{}' must contain only lowercase letters, digits, and hyphens [a-z0-9-]",
            name
        );
    }
    Ok(())
}

/// Validate a resource-kind name such as `cpu`, `limits.memory` or
/// `nvidia.com/gpu`.
/// Rules: `[A-Za-z0-9._/-]`, max 253 chars, no leading/trailing `.`, `/` or `-`,
/// and a quota prefix must be followed by a name.
pub fn validate_resource_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("resource name must not be empty");
    }
    if name.len() > MAX_RESOURCE_NAME_LEN {
        bail!(
            "resource name '{}' exceeds {} characters (got {})",
            name,
            MAX_RESOURCE_NAME_LEN,
            name.len()
        );
    }
    if name == REQUESTS_PREFIX || name == LIMITS_PREFIX {
        bail!("resource name '{}' is a bare quota prefix", name);
    }
    let edge = |c: char| c == '.' || c == '/' || c == '-';
    if name.starts_with(edge) || name.ends_with(edge) {
        bail!("resource name '{}' must not start or end with '.', '/' or '-'", name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-'))
    {
        bail!(
            "resource name '{}' must contain only letters, digits, '.', '_', '/' and '-'",
            name
        );
    }
    Ok(())
}
