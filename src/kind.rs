//! Kind identifiers and the kind-matching rule.
//!
//! A kind is written `namespace/name[:version]`, optionally prefixed with a
//! scheme (`kapeta://`). Kinds select the template set to render and are
//! matched against the `kind` of consumer and provider resources.
//!
//! # Examples
//!
//! ```
//! use kapeta_codegen::kind::{KindQuery, KindUri};
//!
//! let uri: KindUri = "kapeta://Kapeta/MySQL:1.0.0".parse().unwrap();
//! assert_eq!(uri.full_name(), "kapeta/mysql");
//! assert_eq!(uri.version(), Some("1.0.0"));
//!
//! assert!(KindQuery::new("kapeta/mysql*").matches("kapeta/mysql:1.0.0"));
//! assert!(!KindQuery::new("kapeta/postgres*").matches("kapeta/mysql:1.0.0"));
//! ```

use std::fmt;
use std::str::FromStr;

use serde_json::Value as JsonValue;

const SCHEME: &str = "kapeta";
const SCHEME_SEPARATOR: &str = "://";

fn strip_scheme(value: &str) -> &str {
    match value.find(SCHEME_SEPARATOR) {
        Some(index) => &value[index + SCHEME_SEPARATOR.len()..],
        None => value,
    }
}

/// Parsed kind identifier. All parts are lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KindUri {
    handle: String,
    name: String,
    version: Option<String>,
}

impl KindUri {
    /// Namespace (handle) part, empty when the kind has no `/`
    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// `namespace/name`, the part used for directory resolution
    pub fn full_name(&self) -> String {
        if self.handle.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.handle, self.name)
        }
    }

    /// Scheme, full name and version; the form compared by versioned queries
    pub fn normalized(&self) -> String {
        match &self.version {
            Some(version) => format!(
                "{SCHEME}{SCHEME_SEPARATOR}{}:{version}",
                self.full_name()
            ),
            None => format!("{SCHEME}{SCHEME_SEPARATOR}{}", self.full_name()),
        }
    }
}

impl FromStr for KindUri {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let body = strip_scheme(&lowered);

        let (path, version) = match body.rsplit_once(':') {
            Some((path, version)) if !version.is_empty() => (path, Some(version.to_string())),
            Some((path, _)) => (path, None),
            None => (body, None),
        };

        let (handle, name) = match path.split_once('/') {
            Some((handle, name)) => (handle.to_string(), name.to_string()),
            None => (String::new(), path.to_string()),
        };

        if name.is_empty() {
            return Err(format!("Invalid kind: {s}"));
        }

        Ok(Self {
            handle,
            name,
            version,
        })
    }
}

impl fmt::Display for KindUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized())
    }
}

/// A requested kind, compiled once and tested against many resources.
///
/// - trailing `*`: prefix match on the full name
/// - explicit version: exact match on the normalized identifier
/// - otherwise: match on the full name only
#[derive(Debug, Clone)]
pub struct KindQuery {
    prefix: Option<String>,
    uri: Option<KindUri>,
}

impl KindQuery {
    pub fn new(requested: &str) -> Self {
        let lowered = requested.trim().to_lowercase();
        match lowered.strip_suffix('*') {
            Some(prefix) => Self {
                prefix: Some(strip_scheme(prefix).to_string()),
                uri: None,
            },
            None => Self {
                prefix: None,
                uri: lowered.parse().ok(),
            },
        }
    }

    /// Test a raw kind string
    pub fn matches(&self, kind: &str) -> bool {
        let Ok(candidate) = kind.parse::<KindUri>() else {
            return false;
        };

        if let Some(prefix) = &self.prefix {
            return candidate.full_name().starts_with(prefix.as_str());
        }

        match &self.uri {
            Some(uri) if uri.version().is_some() => uri.normalized() == candidate.normalized(),
            Some(uri) => uri.full_name() == candidate.full_name(),
            None => false,
        }
    }

    /// Test a resource object by its `kind` field
    pub fn matches_resource(&self, resource: &JsonValue) -> bool {
        resource
            .get("kind")
            .and_then(JsonValue::as_str)
            .is_some_and(|kind| self.matches(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_with_scheme_and_version() {
        let uri = KindUri::from_str("kapeta://kapeta/test:local").unwrap();
        assert_eq!(uri.handle(), "kapeta");
        assert_eq!(uri.name(), "test");
        assert_eq!(uri.version(), Some("local"));
        assert_eq!(uri.full_name(), "kapeta/test");
        assert_eq!(uri.normalized(), "kapeta://kapeta/test:local");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let uri = KindUri::from_str("Kapeta/Block-Type-Service").unwrap();
        assert_eq!(uri.full_name(), "kapeta/block-type-service");
        assert_eq!(uri.version(), None);
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(KindUri::from_str("").is_err());
        assert!(KindUri::from_str("kapeta/").is_err());
    }

    #[test]
    fn test_wildcard_query() {
        let query = KindQuery::new("kapeta/mysql*");
        assert!(query.matches("kapeta/mysql:1.0.0"));
        assert!(query.matches("KAPETA/MySQL"));
        assert!(!query.matches("kapeta/postgres:1.0.0"));
        assert!(!KindQuery::new("kapeta/postgres*").matches("kapeta/mysql:1.0.0"));
    }

    #[test]
    fn test_versioned_query() {
        let query = KindQuery::new("kapeta/mysql:1.0.0");
        assert!(query.matches("kapeta/mysql:1.0.0"));
        assert!(query.matches("kapeta://kapeta/mysql:1.0.0"));
        assert!(!query.matches("kapeta/mysql:2.0.0"));
        assert!(!query.matches("kapeta/mysql"));
    }

    #[test]
    fn test_unversioned_query_ignores_version() {
        let query = KindQuery::new("Kapeta/MySQL");
        assert!(query.matches("kapeta/mysql:1.0.0"));
        assert!(query.matches("kapeta/mysql"));
        assert!(!query.matches("kapeta/mysql-extra:1.0.0"));
    }

    #[test]
    fn test_matches_resource() {
        let query = KindQuery::new("kapeta/resource-type-rest-client*");
        assert!(query.matches_resource(&json!({"kind": "kapeta/resource-type-rest-client:0.0.4"})));
        assert!(!query.matches_resource(&json!({"name": "no-kind"})));
        assert!(!query.matches_resource(&json!(null)));
    }
}
