//! Shared User-Agent strings for metadata and content requests.
//!
//! Image hosts behind CDNs commonly reject unknown agents, so the default is a
//! browser-style string. A configured agent replaces it for every request.

/// Browser-style User-Agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Returns the configured agent when it is non-blank, otherwise the default.
#[must_use]
pub fn resolve_user_agent(configured: Option<&str>) -> String {
    configured
        .map(str::trim)
        .filter(|ua| !ua.is_empty())
        .map_or_else(|| DEFAULT_USER_AGENT.to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_user_agent_defaults_to_browser_agent() {
        assert_eq!(resolve_user_agent(None), DEFAULT_USER_AGENT);
        assert!(DEFAULT_USER_AGENT.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_resolve_user_agent_blank_override_falls_back() {
        assert_eq!(resolve_user_agent(Some("   ")), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_resolve_user_agent_uses_trimmed_override() {
        assert_eq!(
            resolve_user_agent(Some("  harvester/0.1 ")),
            "harvester/0.1"
        );
    }
}
