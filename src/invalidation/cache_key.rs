/// Identifier of a cached query, as an ordered list of segments.
///
/// The first segment is the prefix shared by every query of a resource
/// domain; further segments narrow it (for example a parent document id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(vec![prefix.into()])
    }

    pub fn with_param(prefix: impl Into<String>, param: impl Into<String>) -> Self {
        Self(vec![prefix.into(), param.into()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn prefix(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// The application's query cache, seen from the channel.
///
/// Implementations mark every query whose key starts with `key` as stale.
/// Called once per resolved target; must not block.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, key: &CacheKey);
}
