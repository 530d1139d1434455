//! Central registry of probe targets.
//!
//! A small static mapping from target name to profile base URL; anything
//! that already looks like a URL is taken literally.

/// Get the base URL for a named target (lowercase).
///
/// Returned URL ends with `/`; the candidate is appended as the last path segment.
pub fn target_base_url(name: &str) -> Option<&'static str> {
    match name {
        "github" => Some("https://github.com/"),
        "gitlab" => Some("https://gitlab.com/"),
        "codeberg" => Some("https://codeberg.org/"),
        _ => None,
    }
}

/// Resolve a target name or literal URL into a base URL ending with `/`.
pub fn resolve_target(target: &str) -> Option<String> {
    let target = target.trim();
    if target.starts_with("http://") || target.starts_with("https://") {
        let mut base = target.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        return Some(base);
    }

    target_base_url(&target.to_lowercase()).map(|s| s.to_string())
}

/// Names accepted by [`target_base_url`]
pub fn target_names() -> Vec<&'static str> {
    vec!["github", "gitlab", "codeberg"]
}
