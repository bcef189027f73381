use std::env;

/// Return the first non-empty value among several accepted env var names.
/// Tokens and IDs travel under different names across hosting platforms.
pub fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|n| env::var(n).ok())
        .find(|v| !v.is_empty())
}

pub fn sync_interval_secs() -> u64 {
    env::var("SYNC_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(900)
}
