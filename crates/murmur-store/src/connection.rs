use serde::Serialize;

use murmur_shared::types::ConnectionState;

/// Last transport status reported by the host. Observational only.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ConnectionSignal {
    state: ConnectionState,
}

impl ConnectionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the state wholesale.
    pub fn set_status(&mut self, state: ConnectionState) {
        self.state = state;
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.state = ConnectionState {
            connected,
            reconnect_attempts: if connected { 0 } else { self.state.reconnect_attempts },
        };
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected
    }
}
