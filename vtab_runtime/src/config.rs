//! Registry configuration parameters.

/// Configuration for a [`RegistryBuilder`](crate::RegistryBuilder).
///
/// # Example
///
/// ```
/// use vtab_runtime::RegistryConfig;
///
/// // Walk the ancestor graph on every call instead of precomputing tables.
/// let config = RegistryConfig {
///     eager_vtables: false,
///     ..Default::default()
/// };
/// assert_eq!(config.max_direct_bases, 8);
/// ```
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Precompute every type's final-overrider table when the registry is
    /// built.
    ///
    /// When disabled, each resolution walks the ancestor graph. Results are
    /// the same either way.
    ///
    /// Default: true
    pub eager_vtables: bool,

    /// Maximum number of direct bases a type may list.
    ///
    /// Default: 8
    pub max_direct_bases: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            eager_vtables: true,
            max_direct_bases: 8,
        }
    }
}

impl RegistryConfig {
    /// Start from defaults and apply `VTAB_EAGER_VTABLES` and
    /// `VTAB_MAX_BASES`. Unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(eager) = lookup("VTAB_EAGER_VTABLES").and_then(|v| parse_bool(&v)) {
            config.eager_vtables = eager;
        }
        if let Some(max) = lookup("VTAB_MAX_BASES").and_then(|v| v.trim().parse().ok()) {
            config.max_direct_bases = max;
        }
        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
