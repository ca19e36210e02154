// Endpoint resolution - pure functions from configuration and page location to URLs
mod location;
mod resolver;

pub use location::{LocationSource, PageLocation};
pub use resolver::{
    Endpoint, EndpointConfig, PathRewrite, normalize_endpoint, resolve_candidates,
};
