use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

/// Top-level server configuration, loaded from `dogfight.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub web_root: String,
    pub game: GameConfig,
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            web_root: "public".to_string(),
            game: GameConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Rules of a match.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// How long players get to place before shooting is forced.
    pub placement_timeout_ms: u64,
    /// Head cells every submitted board must contain.
    pub required_heads: usize,
    /// Random draws tried before giving up on a fresh room code.
    pub room_code_attempts: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            placement_timeout_ms: 30_000,
            required_heads: 3,
            room_code_attempts: 64,
        }
    }
}

impl GameConfig {
    pub fn placement_timeout(&self) -> Duration {
        Duration::from_millis(self.placement_timeout_ms)
    }
}

/// Infrastructure limits (connection caps, buffer sizes, rate limits).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_ws_connections: usize,
    pub ws_rate_limit_per_sec: f64,
    pub player_message_buffer: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ws_connections: 500,
            ws_rate_limit_per_sec: 20.0,
            player_message_buffer: 64,
        }
    }
}

impl ServerConfig {
    /// Collect every configuration problem. Empty means valid.
    pub fn problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            problems.push("listen_addr is not a valid socket address");
        }
        if self.game.placement_timeout_ms == 0 {
            problems.push("game.placement_timeout_ms must be > 0");
        }
        if self.game.required_heads == 0 {
            problems.push("game.required_heads must be > 0");
        }
        if self.game.room_code_attempts == 0 {
            problems.push("game.room_code_attempts must be > 0");
        }
        if self.limits.max_ws_connections == 0 {
            problems.push("limits.max_ws_connections must be > 0");
        }
        if self.limits.ws_rate_limit_per_sec < 1.0 {
            problems.push("limits.ws_rate_limit_per_sec must be at least 1");
        }
        if self.limits.player_message_buffer == 0 {
            problems.push("limits.player_message_buffer must be > 0");
        }
        problems
    }

    /// Validate configuration, logging each problem and exiting if any exist.
    pub fn validate(&self) {
        let problems = self.problems();
        for problem in &problems {
            tracing::error!(addr = %self.listen_addr, "{problem}");
        }
        if !problems.is_empty() {
            std::process::exit(1);
        }
        if self.game.required_heads != 3 {
            tracing::warn!(
                required_heads = self.game.required_heads,
                "Non-standard head count; stock clients place exactly 3 planes"
            );
        }
    }

    /// Load config from `dogfight.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("dogfight.toml") {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from dogfight.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse dogfight.toml: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No dogfight.toml found, using defaults");
                ServerConfig::default()
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = var("DOGFIGHT_LISTEN_ADDR")
            && !addr.is_empty()
        {
            self.listen_addr = addr;
        }
        // Hosting platforms hand out a bare port.
        if let Some(port) = var("PORT")
            && let Ok(port) = port.parse::<u16>()
            && let Ok(mut addr) = self.listen_addr.parse::<SocketAddr>()
        {
            addr.set_port(port);
            self.listen_addr = addr.to_string();
        }
        if let Some(root) = var("DOGFIGHT_WEB_ROOT")
            && !root.is_empty()
        {
            self.web_root = root;
        }
        if let Some(val) = var("DOGFIGHT_PLACEMENT_TIMEOUT_MS")
            && let Ok(n) = val.parse::<u64>()
        {
            self.game.placement_timeout_ms = n;
        }
        if let Some(val) = var("DOGFIGHT_MAX_WS_CONNECTIONS")
            && let Ok(n) = val.parse::<usize>()
        {
            self.limits.max_ws_connections = n;
        }
        if let Some(val) = var("DOGFIGHT_WS_RATE_LIMIT")
            && let Ok(n) = val.parse::<f64>()
        {
            self.limits.ws_rate_limit_per_sec = n;
        }
    }
}
