//! Environment lookups shared by the binaries.

/// Returns the first of `names` that is set to a non-blank value.
///
/// Deployments carry both server-side names (`SUPABASE_URL`) and the
/// front-end build names (`VITE_SUPABASE_URL`), so callers list them in
/// order of preference.
pub fn first_env(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| non_blank(std::env::var(name).ok()))
}

pub fn env_or(name: &str, default: &str) -> String {
    non_blank(std::env::var(name).ok()).unwrap_or_else(|| default.to_string())
}

/// Parses a boolean flag; accepts `1/0`, `true/false`, `yes/no`, `on/off`.
pub fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => parse_flag(&value).unwrap_or(default),
        Err(_) => default,
    }
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
