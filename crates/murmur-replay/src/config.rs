//! Replay configuration loaded from the command line and environment.
//!
//! Engine settings come from [`EngineConfig::from_env`]; the rest has
//! defaults so a script can be replayed with no setup.

use std::path::PathBuf;

use murmur_client::EngineConfig;

/// Replay configuration.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Script to replay. Reads stdin when absent.
    /// Arg: first positional argument
    pub script: Option<PathBuf>,

    /// Id of the signed-in user the script is replayed as.
    /// Env: `MURMUR_USER_ID`
    /// Default: `me`
    pub user_id: String,

    /// Display name used on optimistic posts.
    /// Env: `MURMUR_DISPLAY_NAME`
    /// Default: same as the user id
    pub display_name: String,

    /// Pretty-print the final report.
    /// Env: `MURMUR_PRETTY` (true/false)
    /// Default: `true`
    pub pretty: bool,

    pub engine: EngineConfig,
}

impl ReplayConfig {
    pub fn from_env() -> Self {
        Self::from_parts(
            std::env::args().skip(1),
            |key| std::env::var(key).ok(),
            EngineConfig::from_env(),
        )
    }

    fn from_parts(
        mut args: impl Iterator<Item = String>,
        lookup: impl Fn(&str) -> Option<String>,
        engine: EngineConfig,
    ) -> Self {
        let script = args
            .next()
            .filter(|arg| arg != "-")
            .map(PathBuf::from);

        let user_id = lookup("MURMUR_USER_ID")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "me".to_string());

        let display_name = lookup("MURMUR_DISPLAY_NAME")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| user_id.clone());

        let pretty = lookup("MURMUR_PRETTY")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self {
            script,
            user_id,
            display_name,
            pretty,
            engine,
        }
    }
}
