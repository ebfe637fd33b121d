use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a string-backed identifier assigned by the remote service.
macro_rules! server_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

server_id!(
    /// Remote user identifier.
    UserId
);
server_id!(
    /// Remote team identifier.
    TeamId
);
server_id!(
    /// Remote channel identifier.
    ChannelId
);
server_id!(
    /// Post identifier. Server-assigned for settled posts, locally derived
    /// from the correlation id for optimistic ones.
    PostId
);

/// Client-generated identifier that ties a send request to the
/// confirmation or failure event the host reports for it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Local post id used for the optimistic post until the server id is known.
    pub fn to_local_post_id(&self) -> PostId {
        PostId(format!("pending:{}", self.0))
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TeamKind {
    #[default]
    Open,
    Invite,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    #[default]
    Public,
    Private,
    Direct,
    Group,
}

impl ChannelKind {
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct | Self::Group)
    }
}

/// Presence status reported for a user.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Online,
    Away,
    Dnd,
    #[default]
    Offline,
    #[serde(other)]
    Unknown,
}

/// Transport health as last reported by the host.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionState {
    pub connected: bool,
    pub reconnect_attempts: u32,
}

impl ConnectionState {
    /// Disconnected after at least one reconnect attempt.
    pub fn is_reconnecting(&self) -> bool {
        !self.connected && self.reconnect_attempts > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_ids_are_unique() {
        let a = CorrelationId::new();
        let b = CorrelationId::new();
        assert_ne!(a, b);
        assert_ne!(a.to_local_post_id(), b.to_local_post_id());
    }

    #[test]
    fn test_unknown_status_tolerated() {
        let status: UserStatus = serde_json::from_str("\"out_of_office\"").unwrap();
        assert_eq!(status, UserStatus::Unknown);
        let status: UserStatus = serde_json::from_str("\"dnd\"").unwrap();
        assert_eq!(status, UserStatus::Dnd);
    }

    #[test]
    fn test_server_id_is_transparent() {
        let id: ChannelId = serde_json::from_str("\"C1\"").unwrap();
        assert_eq!(id, ChannelId::from("C1"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"C1\"");
    }
}
