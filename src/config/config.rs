//! # Server Configuration
//!
//! Environment-driven configuration for the capture streaming server. Every
//! field has a documented default; `ServerConfig::from_env` overlays
//! environment variables on top of those defaults and `validate` rejects
//! out-of-range values before the server binds a socket or accepts a stdio
//! connection.
//!
//! ## Configuration Parameters
//!
//! | Variable | Type | Default | Description |
//! |---|---|---|---|
//! | `HOST` | `String` | `0.0.0.0` | Bind address for the HTTP listener |
//! | `PORT` | `u16` | `8000` | Bind port for the HTTP listener |
//! | `MAX_CONCURRENT_STREAMS` | `usize` | `25` | Global cap on live streams |
//! | `DEFAULT_STREAM_FPS` | `u32` | `10` | `create_stream` default fps |
//! | `MAX_STREAM_FPS` | `u32` | `120` | Highest fps a stream may request |
//! | `DEFAULT_STREAM_QUALITY` | `u32` | `80` | `create_stream` default quality |
//! | `MAX_STREAM_QUALITY` | `u32` | `100` | Highest quality a stream may request |
//! | `MAX_FRAME_SIZE` | `usize` | `2097152` | Max encoded frame size (bytes) |
//! | `CACHE_CAPACITY` | `usize` | `120` | ResourceCache entry capacity |
//! | `KEEP_ALIVE_TIMEOUT` | `u64` | `30` | SSE keepalive ping interval (s) |
//! | `LOG_LEVEL` | `String` | `info` | `tracing_subscriber::EnvFilter` directive |
//! | `STREAM_BUFFER_SIZE` | `usize` | `10` | SSE per-subscriber queue depth |

use crate::error::{CaptureError, CaptureResult};
use std::env;

/// Server-wide configuration, loaded from environment variables with
/// documented fallback defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// HTTP bind address.
    pub host: String,
    /// HTTP bind port.
    pub port: u16,
    /// Maximum number of simultaneously Running streams.
    pub max_concurrent_streams: usize,
    /// Default fps used by `create_stream` when the caller omits it.
    pub default_stream_fps: u32,
    /// Highest fps a stream may request.
    pub max_stream_fps: u32,
    /// Default quality used by `create_stream` when the caller omits it.
    pub default_stream_quality: u32,
    /// Highest quality a stream may request.
    pub max_stream_quality: u32,
    /// Lowest quality a stream may request or drift to under adaptive control.
    pub min_stream_quality: u32,
    /// Per-subscriber SSE queue depth before the slowest subscriber is dropped.
    pub sse_queue_size: usize,
    /// Per-subscriber WebSocket queue depth before the slowest subscriber is dropped.
    pub ws_queue_size: usize,
    /// Maximum encoded frame size accepted into the ResourceCache, in bytes.
    pub max_frame_size: usize,
    /// ResourceCache entry capacity.
    pub cache_capacity: usize,
    /// SSE keepalive ping interval, in seconds.
    pub keep_alive_timeout_secs: u64,
    /// Deadline for a single blocking tool call before it returns `Timeout`.
    pub request_timeout_secs: u64,
    /// Interval between StreamManager cleanup sweeps, in seconds.
    pub cleanup_interval_secs: u64,
    /// Grace window a stopped session's producer task has to release resources.
    pub shutdown_window_ms: u64,
    /// `tracing_subscriber::EnvFilter` directive string.
    pub log_level: String,
    /// CORS allowed origins for the HTTP router.
    pub cors_origins: Vec<String>,
    /// Name reported in the `initialize` handshake.
    pub server_name: String,
    /// Version reported in the `initialize` handshake.
    pub server_version: String,
    /// MCP protocol version reported in the `initialize` handshake.
    pub protocol_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_concurrent_streams: 25,
            default_stream_fps: 10,
            max_stream_fps: 120,
            default_stream_quality: 80,
            max_stream_quality: 100,
            min_stream_quality: 1,
            sse_queue_size: 10,
            ws_queue_size: 5,
            max_frame_size: 2 * 1024 * 1024,
            cache_capacity: 120,
            keep_alive_timeout_secs: 30,
            request_timeout_secs: 30,
            cleanup_interval_secs: 60,
            shutdown_window_ms: 2000,
            log_level: "info".to_string(),
            cors_origins: vec!["*".to_string()],
            server_name: "cap-mcp".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: "2024-11-05".to_string(),
        }
    }
}

impl ServerConfig {
    /// Build a configuration by overlaying recognized environment variables
    /// on top of [`ServerConfig::default`].
    pub fn from_env() -> CaptureResult<Self> {
        let mut config = Self::default();

        if let Ok(v) = env::var("HOST") {
            config.host = v;
        }
        if let Some(v) = parse_env("PORT")? {
            config.port = v;
        }
        if let Some(v) = parse_env("MAX_CONCURRENT_STREAMS")? {
            config.max_concurrent_streams = v;
        }
        if let Some(v) = parse_env("DEFAULT_STREAM_FPS")? {
            config.default_stream_fps = v;
        }
        if let Some(v) = parse_env("MAX_STREAM_FPS")? {
            config.max_stream_fps = v;
        }
        if let Some(v) = parse_env("DEFAULT_STREAM_QUALITY")? {
            config.default_stream_quality = v;
        }
        if let Some(v) = parse_env("MAX_STREAM_QUALITY")? {
            config.max_stream_quality = v;
        }
        if let Some(v) = parse_env("MAX_FRAME_SIZE")? {
            config.max_frame_size = v;
        }
        if let Some(v) = parse_env("CACHE_CAPACITY")? {
            config.cache_capacity = v;
        }
        if let Some(v) = parse_env("KEEP_ALIVE_TIMEOUT")? {
            config.keep_alive_timeout_secs = v;
        }
        if let Some(v) = parse_env("STREAM_BUFFER_SIZE")? {
            config.sse_queue_size = v;
        }
        if let Ok(v) = env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field invariants that a naive per-field parse can't catch.
    pub fn validate(&self) -> CaptureResult<()> {
        if self.max_stream_fps == 0 || self.max_stream_fps > 120 {
            return Err(CaptureError::config(
                "max_stream_fps",
                self.max_stream_fps.to_string(),
                "must be in 1..=120",
            ));
        }
        if self.default_stream_fps == 0 || self.default_stream_fps > self.max_stream_fps {
            return Err(CaptureError::config(
                "default_stream_fps",
                self.default_stream_fps.to_string(),
                "must be in 1..=max_stream_fps",
            ));
        }
        if self.min_stream_quality == 0 || self.min_stream_quality > self.max_stream_quality {
            return Err(CaptureError::config(
                "min_stream_quality",
                self.min_stream_quality.to_string(),
                "must be in 1..=max_stream_quality",
            ));
        }
        if self.max_stream_quality > 100 {
            return Err(CaptureError::config(
                "max_stream_quality",
                self.max_stream_quality.to_string(),
                "must be <= 100",
            ));
        }
        if self.max_concurrent_streams == 0 {
            return Err(CaptureError::config(
                "max_concurrent_streams",
                "0",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> CaptureResult<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| CaptureError::config(key, raw, "failed to parse")),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(CaptureError::config(key, "<non-utf8>", "not valid unicode"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_concurrent_streams, 25);
        assert_eq!(config.default_stream_fps, 10);
        assert_eq!(config.max_stream_fps, 120);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServerConfig::default();
        assert!(config.validate().is_ok());

        config.max_stream_fps = 0;
        assert!(config.validate().is_err());
        config.max_stream_fps = 200;
        assert!(config.validate().is_err());
        config.max_stream_fps = 120;

        config.default_stream_fps = 130;
        assert!(config.validate().is_err());
        config.default_stream_fps = 10;

        config.max_concurrent_streams = 0;
        assert!(config.validate().is_err());
        config.max_concurrent_streams = 25;

        assert!(config.validate().is_ok());
    }
}
