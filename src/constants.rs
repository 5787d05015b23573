// -
// Key hashing

/// Prefix of every reactive query key hash
pub const REACTIVE_HASH_PREFIX: &str = "convex-query|";

/// Separator between the function identity and the canonical arguments
pub(crate) const REACTIVE_HASH_SEPARATOR: char = '-';

// -
// Configuration

/// Environment variable prefix, e.g. `BRIDGE__FETCH__RETRY=2`
pub(crate) const CONFIG_ENV_PREFIX: &str = "BRIDGE";
pub(crate) const CONFIG_ENV_SEPARATOR: &str = "__";

/// Optional path of a TOML file merged over the defaults
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
