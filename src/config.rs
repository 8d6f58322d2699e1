//! Configuration loading.
//!
//! Loads `./sentinel.toml` (or `$SENTINEL_CONFIG_PATH`). Environment
//! variables override file values; file values override defaults. A
//! missing file is not an error.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::bridge::{BridgeOptions, DEFAULT_COMMAND_BUFFER};
use crate::camera::DEFAULT_QUEUE_DEPTH;
use crate::platform::{CaptureConfig, CaptureMode, LensFacing};

/// Default config file name in the working directory.
const DEFAULT_CONFIG_FILE: &str = "sentinel.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    /// UI bridge settings.
    pub bridge: BridgeConfig,
    /// Camera session settings.
    pub camera: CameraConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
    /// Simulated platform used by the host binary.
    pub simulation: SimulationConfig,
}

impl SentinelConfig {
    /// Load with precedence: env vars > TOML file > defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path_with(|key| std::env::var(key).ok());
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a TOML file, falling back to defaults if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("failed to parse config at {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config at {}: {e}",
                path.display()
            )),
        }
    }

    /// Parse a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML or unknown enum values.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).context("failed to parse config TOML")
    }

    /// Apply environment overrides through `env`.
    ///
    /// Takes a resolver so tests need not touch the process environment.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("SENTINEL_LOG_LEVEL") {
            self.bridge.log_level = v;
        }
        if let Some(v) = env("SENTINEL_LOGS_DIR") {
            self.logging.logs_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = env("SENTINEL_COMMAND_BUFFER") {
            match v.parse() {
                Ok(n) => self.bridge.command_buffer = n,
                Err(_) => tracing::warn!(
                    var = "SENTINEL_COMMAND_BUFFER",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("SENTINEL_GRANT_CAMERA") {
            match parse_flag(&v) {
                Some(flag) => self.simulation.grant_camera = flag,
                None => tracing::warn!(
                    var = "SENTINEL_GRANT_CAMERA",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("SENTINEL_GRANT_TELEPHONY") {
            match parse_flag(&v) {
                Some(flag) => self.simulation.grant_telephony = flag,
                None => tracing::warn!(
                    var = "SENTINEL_GRANT_TELEPHONY",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }

    /// Bridge sizing and capture parameters.
    pub fn bridge_options(&self) -> BridgeOptions {
        BridgeOptions {
            command_buffer: self.bridge.command_buffer,
            capture_queue_depth: self.camera.capture_queue_depth,
            capture: CaptureConfig {
                mode: self.camera.capture_mode,
                lens: self.camera.lens,
            },
        }
    }

    /// Resolved logs directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the home
    /// directory cannot be determined.
    pub fn logs_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.logging.logs_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(config_dir()?.join("logs")),
        }
    }
}

/// Resolve the config file path using a custom env resolver.
pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    env("SENTINEL_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Resolve the default state directory (`~/.sentinel/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".sentinel"))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ── Bridge ──────────────────────────────────────────────────────

/// UI bridge settings (`[bridge]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name the command object is exposed under in the UI layer.
    pub interface_name: String,
    /// Page the UI layer loads.
    pub page_url: String,
    /// Inbound command channel capacity.
    pub command_buffer: usize,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            interface_name: "AndroidInterface".to_owned(),
            page_url: "file:///android_asset/chat.html".to_owned(),
            command_buffer: DEFAULT_COMMAND_BUFFER,
            log_level: "info".to_owned(),
        }
    }
}

// ── Camera ──────────────────────────────────────────────────────

/// Camera session settings (`[camera]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Sensor to bind.
    pub lens: LensFacing,
    /// Capture mode.
    pub capture_mode: CaptureMode,
    /// Captures that may wait behind the one in flight.
    pub capture_queue_depth: usize,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            lens: LensFacing::Back,
            capture_mode: CaptureMode::MinimizeLatency,
            capture_queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

// ── Logging ─────────────────────────────────────────────────────

/// Log output settings (`[logging]`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rotated JSON logs. Defaults to `~/.sentinel/logs`.
    pub logs_dir: Option<PathBuf>,
}

// ── Simulation ──────────────────────────────────────────────────

/// Simulated platform settings (`[simulation]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Whether the simulated OS starts with camera access granted.
    pub grant_camera: bool,
    /// Whether the simulated OS starts with telephony granted.
    pub grant_telephony: bool,
    /// Synthetic frame width.
    pub frame_width: u32,
    /// Synthetic frame height.
    pub frame_height: u32,
    /// Simulated provider acquisition latency.
    pub acquire_delay_ms: u64,
    /// Simulated capture latency.
    pub capture_delay_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grant_camera: true,
            grant_telephony: true,
            frame_width: 64,
            frame_height: 48,
            acquire_delay_ms: 50,
            capture_delay_ms: 20,
        }
    }
}
