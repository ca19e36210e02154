/// Wire `type` tags
pub mod message_types {
    pub const AUTH: &str = "auth";
    pub const CONNECTED: &str = "connected";
    pub const AUTH_SUCCESS: &str = "auth_success";
    pub const DATA_UPDATE: &str = "data_update";
}

/// `data_update` action verbs
pub mod actions {
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
}

/// Path prefix shared by the HTTP API and the channel
pub const API_PATH: &str = "/api";

/// Segment appended to the API path to reach the channel
pub const CHANNEL_SUFFIX: &str = "/ws";

/// Full default channel path
pub const DEFAULT_CHANNEL_PATH: &str = "/api/ws";

/// Ports typically used by frontend dev servers (vite, vite preview, CRA fallback)
pub const DEV_SERVER_PORTS: [u16; 4] = [5173, 5174, 4173, 3001];

/// Ports the backend conventionally listens on, in priority order
pub const BACKEND_PORTS: [u16; 2] = [3000, 5000];

/// Environment variable holding an explicit channel URL
pub const ENV_WS_URL: &str = "REALTIME_WS_URL";

/// Environment variable holding the base API URL
pub const ENV_API_URL: &str = "REALTIME_API_URL";

/// Default attempts per endpoint before moving to the next candidate
pub const DEFAULT_MAX_ATTEMPTS_PER_ENDPOINT: u32 = 3;

/// Default delay between reconnect attempts (milliseconds)
pub const DEFAULT_RECONNECT_DELAY: u64 = 3000;

/// Default connect timeout (milliseconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10000;

/// Default heartbeat interval (milliseconds)
pub const HEARTBEAT_INTERVAL: u64 = 25000;

/// Default window during which identical update notifications are suppressed (milliseconds)
pub const DEFAULT_NOTIFICATION_THROTTLE: u64 = 2000;

/// WebSocket close codes
pub const WS_CLOSE_NORMAL: u16 = 1000;
