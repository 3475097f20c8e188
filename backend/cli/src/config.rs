use std::path::PathBuf;

use serde::Deserialize;

use tandem_core::DEFAULT_HUB_BUFFER;

/// tandem runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Log level, overridden by `RUST_LOG` filters
    pub log_level: String,
    /// Directory for rolling NDJSON logs; console only when unset
    pub log_dir: Option<PathBuf>,
    /// Path the signaling WebSocket is served on
    pub ws_path: String,
    /// Send `partner-left` to the surviving side of a pairing
    pub notify_partner_on_leave: bool,
    /// Depth of the hub command queue
    pub hub_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_dir: None,
            ws_path: "/ws".to_string(),
            notify_partner_on_leave: false,
            hub_buffer: DEFAULT_HUB_BUFFER,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset or unparsable values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_address: lookup("TANDEM_BIND").unwrap_or(defaults.bind_address),
            port: lookup("TANDEM_PORT")
                .or_else(|| lookup("PORT"))
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_dir: lookup("TANDEM_LOG_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            ws_path: lookup("TANDEM_WS_PATH")
                .map(|path| normalize_ws_path(&path))
                .unwrap_or(defaults.ws_path),
            notify_partner_on_leave: lookup("TANDEM_NOTIFY_PARTNER_LEFT")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.notify_partner_on_leave),
            hub_buffer: lookup("TANDEM_HUB_BUFFER")
                .and_then(|v| v.trim().parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.hub_buffer),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Routes must be absolute; `signal` becomes `/signal`.
fn normalize_ws_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        "/ws".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
