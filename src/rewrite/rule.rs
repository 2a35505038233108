//! Rewrite rule parsing.
//!
//! # Responsibilities
//! - Split `"<from> -> <to>"` strings into `Route` records
//! - Classify a destination as remote (absolute URL with host) or local
//!
//! # Design Decisions
//! - Parsing never fails: a malformed rule yields a route without a destination
//! - A rule with an empty pattern is malformed
//! - Whitespace around either side is ignored

use serde::Serialize;
use url::Url;

/// Separator between the `from` and `to` halves of a rule.
pub const RULE_SEPARATOR: &str = "->";

/// A from-pattern to destination mapping derived from one rule string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    /// Path pattern matched against the request path.
    pub from: String,

    /// Destination path or absolute URL. `None` when the rule was malformed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

/// Where a route sends matching requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Another host, reached over the network.
    Remote(Url),
    /// Another path served by the same process.
    Local(String),
}

impl Route {
    /// Parse a single rule string.
    pub fn parse(rule: &str) -> Self {
        match rule.split_once(RULE_SEPARATOR) {
            Some((from, to)) => {
                let from = from.trim();
                let to = to.trim();
                // More than one separator is as ambiguous as none. An empty
                // pattern would match every path.
                let to = if from.is_empty() || to.is_empty() || to.contains(RULE_SEPARATOR) {
                    None
                } else {
                    Some(to.to_string())
                };
                Self {
                    from: from.to_string(),
                    to,
                }
            }
            None => Self {
                from: rule.trim().to_string(),
                to: None,
            },
        }
    }

    /// Returns true if the rule carried a usable destination.
    pub fn has_destination(&self) -> bool {
        self.to.is_some()
    }

    /// Classify the destination.
    ///
    /// A destination is remote when it parses as an absolute URL with a
    /// network host; anything else is treated as a local path.
    pub fn target(&self) -> Option<Target> {
        let to = self.to.as_deref()?;
        match Url::parse(to) {
            Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => Some(Target::Remote(url)),
            _ => Some(Target::Local(to.to_string())),
        }
    }
}

/// Parse a list of rule strings, preserving their order.
pub fn parse_rules<I, S>(rules: I) -> Vec<Route>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    rules.into_iter().map(|r| Route::parse(r.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let route = Route::parse("   /from   ->\t/to  ");
        assert_eq!(route.from, "/from");
        assert_eq!(route.to.as_deref(), Some("/to"));

        let route = Route::parse("/a->/b");
        assert_eq!(route.from, "/a");
        assert_eq!(route.to.as_deref(), Some("/b"));
    }

    #[test]
    fn test_parse_without_separator() {
        let route = Route::parse("/from /to");
        assert_eq!(route.from, "/from /to");
        assert!(route.to.is_none());
        assert!(!route.has_destination());
        assert!(route.target().is_none());
    }

    #[test]
    fn test_parse_empty_destination() {
        let route = Route::parse("/from ->   ");
        assert_eq!(route.from, "/from");
        assert!(route.to.is_none());
    }

    #[test]
    fn test_parse_empty_pattern() {
        let route = Route::parse("  -> /x");
        assert_eq!(route.from, "");
        assert!(route.to.is_none());
        assert!(route.target().is_none());
    }

    #[test]
    fn test_parse_double_separator() {
        let route = Route::parse("/a -> /b -> /c");
        assert!(route.to.is_none());
    }

    #[test]
    fn test_target_classification() {
        let remote = Route::parse("/api -> http://example.com/x");
        match remote.target() {
            Some(Target::Remote(url)) => assert_eq!(url.host_str(), Some("example.com")),
            other => panic!("expected remote target, got {:?}", other),
        }

        let local = Route::parse("/api -> /local/x");
        assert_eq!(local.target(), Some(Target::Local("/local/x".to_string())));

        // Scheme without a host is not a network destination.
        let no_host = Route::parse("/mail -> mailto:someone");
        assert_eq!(no_host.target(), Some(Target::Local("mailto:someone".to_string())));
    }

    #[test]
    fn test_parse_rules_keeps_order() {
        let routes = parse_rules(["/from -> /to", "/api -> http://upstream.test/api", "broken"]);
        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0].from, "/from");
        assert_eq!(routes[1].to.as_deref(), Some("http://upstream.test/api"));
        assert!(routes[2].to.is_none());
    }

    #[test]
    fn test_route_serializes_without_missing_destination() {
        let json = serde_json::to_value(Route::parse("/only")).unwrap();
        assert_eq!(json, serde_json::json!({ "from": "/only" }));
    }
}
