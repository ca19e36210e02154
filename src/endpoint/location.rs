use crate::types::{RealtimeError, Result};
use url::Url;

/// Where the host application is being served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    secure: bool,
    host: String,
    port: Option<u16>,
}

impl PageLocation {
    pub fn new(secure: bool, host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            secure,
            host: host.into(),
            port,
        }
    }

    /// Parses an origin such as `https://shop.example.com` or `http://localhost:5173`.
    pub fn parse(origin: &str) -> Result<Self> {
        let url = Url::parse(origin)?;
        let secure = match url.scheme() {
            "https" | "wss" => true,
            "http" | "ws" => false,
            other => {
                return Err(RealtimeError::Resolution(format!(
                    "unsupported page scheme '{}'",
                    other
                )));
            }
        };
        let host = url
            .host_str()
            .ok_or_else(|| RealtimeError::Resolution(format!("origin '{}' has no host", origin)))?;

        Ok(Self::new(secure, host, url.port()))
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// `wss` on secure pages, `ws` otherwise
    pub fn ws_scheme(&self) -> &'static str {
        if self.secure { "wss" } else { "ws" }
    }

    /// `host[:port]`
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    pub fn origin(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.authority())
    }
}

/// Supplies the current page location at resolution time.
pub trait LocationSource: Send + Sync {
    fn location(&self) -> PageLocation;
}

impl LocationSource for PageLocation {
    fn location(&self) -> PageLocation {
        self.clone()
    }
}
