/// Application name
pub const APP_NAME: &str = "Murmur";

/// Typing entries older than this are purged by the sweep (millis)
pub const TYPING_TTL_MS: u64 = 5_000;

/// Period of the typing sweep (millis)
pub const TYPING_SWEEP_INTERVAL_MS: u64 = 1_000;

/// Minimum gap between outbound typing signals per compose session (millis)
pub const TYPING_THROTTLE_MS: u64 = 3_000;

/// A send still pending after this long is marked failed (millis)
pub const SEND_TIMEOUT_MS: u64 = 60_000;

/// Error attached to a post whose send timed out
pub const SEND_TIMEOUT_ERROR: &str = "Send timed out";

/// Error attached to a post when the host reports a failure without detail
pub const SEND_FAILED_ERROR: &str = "Failed to send message";

/// Error attached to a post the host never accepted for sending
pub const SEND_NOT_ISSUED_ERROR: &str = "Could not hand message to the server";

/// Message retained when a fetch fails without detail
pub const FETCH_FAILED_ERROR: &str = "Failed to load";

/// Capacity of the inbound, command and outbound channels of the bridge
pub const DEFAULT_EVENT_BUFFER: usize = 256;
