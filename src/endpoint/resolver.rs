use super::PageLocation;
use crate::types::constants::{
    API_PATH, BACKEND_PORTS, CHANNEL_SUFFIX, DEFAULT_CHANNEL_PATH, DEV_SERVER_PORTS, ENV_API_URL,
    ENV_WS_URL,
};
use crate::types::{RealtimeError, Result};
use url::Url;

/// A normalized `ws`/`wss` URL believed to host the channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(Url);

impl Endpoint {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn is_secure(&self) -> bool {
        self.0.scheme() == "wss"
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Explicit endpoint overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Fully-qualified channel URL, trusted as-is
    pub ws_url: Option<String>,
    /// Base URL of the HTTP API; the channel path is derived from it
    pub api_url: Option<String>,
}

impl EndpointConfig {
    /// Reads `REALTIME_WS_URL` and `REALTIME_API_URL`. Blank values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            ws_url: read(ENV_WS_URL),
            api_url: read(ENV_API_URL),
        }
    }
}

/// Whether the path of a normalized URL may be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRewrite {
    /// Keep the given path; only an empty path gets the default channel path
    Preserve,
    /// Make sure the path ends in the channel suffix
    ChannelSuffix,
}

/// Normalizes one raw endpoint string against the page location.
///
/// Accepted shapes: absolute URLs (`http`/`https` mapped to `ws`/`wss`),
/// protocol-relative `//host/path`, absolute paths `/path`, and bare
/// `host[:port][/path]`.
pub fn normalize_endpoint(raw: &str, location: &PageLocation, rewrite: PathRewrite) -> Result<Endpoint> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RealtimeError::Resolution("empty endpoint".into()));
    }

    let absolute = if let Some((scheme, rest)) = raw.split_once("://") {
        format!("{}://{}", realtime_scheme(scheme)?, rest)
    } else if let Some(rest) = raw.strip_prefix("//") {
        format!("{}://{}", location.ws_scheme(), rest)
    } else if raw.starts_with('/') {
        format!("{}://{}{}", location.ws_scheme(), location.authority(), raw)
    } else {
        format!("{}://{}", location.ws_scheme(), raw)
    };

    let mut url = Url::parse(&absolute)?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(RealtimeError::Resolution(format!("'{}' has no host", raw)));
    }
    url.set_fragment(None);

    match rewrite {
        PathRewrite::Preserve => {
            if url.path().is_empty() || url.path() == "/" {
                url.set_path(DEFAULT_CHANNEL_PATH);
            }
        }
        PathRewrite::ChannelSuffix => {
            let path = with_channel_suffix(url.path());
            url.set_path(&path);
        }
    }

    Ok(Endpoint(url))
}

/// Builds the ordered, de-duplicated candidate list for one connect cycle.
///
/// Inputs that fail to normalize are logged and skipped; an empty result
/// means nothing usable was configured or derivable.
pub fn resolve_candidates(config: &EndpointConfig, location: &PageLocation) -> Vec<Endpoint> {
    let mut candidates = Vec::new();

    if let Some(ws_url) = &config.ws_url {
        push_unique(
            &mut candidates,
            normalize_endpoint(ws_url, location, PathRewrite::Preserve),
            "configured channel URL",
        );
    }

    if let Some(api_url) = &config.api_url {
        push_unique(
            &mut candidates,
            normalize_endpoint(api_url, location, PathRewrite::ChannelSuffix),
            "configured API URL",
        );
    }

    push_unique(
        &mut candidates,
        normalize_endpoint(&location.authority(), location, PathRewrite::ChannelSuffix),
        "page origin",
    );

    if let Some(port) = location.port()
        && DEV_SERVER_PORTS.contains(&port)
    {
        for backend_port in BACKEND_PORTS {
            let authority = format!("{}:{}", location.host(), backend_port);
            push_unique(
                &mut candidates,
                normalize_endpoint(&authority, location, PathRewrite::ChannelSuffix),
                "dev backend port",
            );
        }
    }

    push_unique(
        &mut candidates,
        normalize_endpoint(location.host(), location, PathRewrite::ChannelSuffix),
        "page hostname",
    );

    tracing::debug!(
        "Resolved {} endpoint candidates: [{}]",
        candidates.len(),
        candidates
            .iter()
            .map(Endpoint::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    candidates
}

fn push_unique(candidates: &mut Vec<Endpoint>, endpoint: Result<Endpoint>, source: &str) {
    match endpoint {
        Ok(endpoint) => {
            if !candidates.contains(&endpoint) {
                candidates.push(endpoint);
            }
        }
        Err(e) => tracing::warn!("Skipping {}: {}", source, e),
    }
}

fn realtime_scheme(scheme: &str) -> Result<&'static str> {
    match scheme.to_ascii_lowercase().as_str() {
        "http" | "ws" => Ok("ws"),
        "https" | "wss" => Ok("wss"),
        other => Err(RealtimeError::Resolution(format!(
            "unsupported scheme '{}'",
            other
        ))),
    }
}

fn with_channel_suffix(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.ends_with(DEFAULT_CHANNEL_PATH) {
        trimmed.to_string()
    } else if trimmed.ends_with(API_PATH) {
        format!("{}{}", trimmed, CHANNEL_SUFFIX)
    } else {
        format!("{}{}", trimmed, DEFAULT_CHANNEL_PATH)
    }
}
