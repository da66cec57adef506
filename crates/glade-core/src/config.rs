//! Configuration loading and typed config structures for the Glade runtime.
//!
//! The canonical configuration lives in `glade-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file and applies
//! environment overrides.

use std::collections::BTreeMap;
use std::path::Path;

use glade_types::Position;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level runtime configuration.
///
/// Mirrors the structure of `glade-config.yaml`. All fields have defaults
/// matching the documented runtime surface, so an absent file yields a
/// usable 10x10 world with one-second ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GladeConfig {
    /// Grid dimensions.
    #[serde(default)]
    pub grid: GridConfig,

    /// Tick cadence and intent deadline.
    #[serde(default)]
    pub tick: TickConfig,

    /// Lease TTL.
    #[serde(default)]
    pub lease: LeaseConfig,

    /// Observation radii.
    #[serde(default)]
    pub observation: ObservationConfig,

    /// Broadcast queue sizing.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Initial world contents.
    #[serde(default)]
    pub initial: InitialConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Gateway bind address.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Run boundary parameters.
    #[serde(default)]
    pub run: RunConfig,
}

impl GladeConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The environment variable `GLADE_GATEWAY_PORT` overrides
    /// `gateway.port` so deployments can remap the listen port without
    /// editing the file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.gateway.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.gateway.apply_env_overrides();
        Ok(config)
    }

    /// The effective hearing radius: the configured value, or the
    /// observation radius when unset.
    pub const fn hearing_radius(&self) -> u32 {
        match self.observation.hearing_radius {
            Some(radius) => radius,
            None => self.observation.radius,
        }
    }
}

/// Grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    /// World width in tiles.
    #[serde(default = "default_grid_side")]
    pub width: u32,

    /// World height in tiles.
    #[serde(default = "default_grid_side")]
    pub height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: default_grid_side(),
            height: default_grid_side(),
        }
    }
}

/// Tick cadence settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TickConfig {
    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_duration_ms")]
    pub duration_ms: u64,

    /// Intent deadline offset from tick start, in milliseconds.
    #[serde(default = "default_tick_deadline_ms")]
    pub deadline_ms: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_tick_duration_ms(),
            deadline_ms: default_tick_deadline_ms(),
        }
    }
}

/// Lease settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LeaseConfig {
    /// Lease time-to-live in milliseconds.
    #[serde(default = "default_lease_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_lease_ttl_ms(),
        }
    }
}

/// Observation radii.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ObservationConfig {
    /// Chebyshev visibility radius.
    #[serde(default = "default_observation_radius")]
    pub radius: u32,

    /// Utterance hearing radius; defaults to the visibility radius.
    #[serde(default)]
    pub hearing_radius: Option<u32>,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            radius: default_observation_radius(),
            hearing_radius: None,
        }
    }
}

/// Broadcast queue sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BroadcastConfig {
    /// Per-subscriber bounded queue depth. When a subscriber falls this
    /// far behind, its oldest pending messages are dropped.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            queue_depth: default_queue_depth(),
        }
    }
}

/// An entity present at world start.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitialEntity {
    /// Globally unique entity id.
    pub entity_id: String,

    /// Spawn position.
    pub position: Position,

    /// Entity type tag.
    #[serde(default = "default_entity_type")]
    pub entity_type: String,

    /// Spawn-time tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A sparse tile override applied at world start.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitialTile {
    /// The overridden position.
    pub position: Position,

    /// Whether the tile is walkable.
    #[serde(default = "default_true")]
    pub walkable: bool,

    /// Whether the tile blocks sight.
    #[serde(default)]
    pub opaque: bool,

    /// Floor tag.
    #[serde(default = "default_floor_type")]
    pub floor_type: String,
}

/// An object present at world start.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitialObject {
    /// Globally unique object id.
    pub object_id: String,

    /// The object's position.
    pub position: Position,

    /// Object type tag.
    pub object_type: String,

    /// String-encoded initial state fields.
    #[serde(default)]
    pub state: BTreeMap<String, String>,

    /// Whether entities may stand on the object's tile.
    #[serde(default = "default_true")]
    pub walkable: bool,

    /// Whether the object blocks sight.
    #[serde(default)]
    pub opaque: bool,
}

/// Initial world contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InitialConfig {
    /// Entities spawned at tick 0.
    #[serde(default)]
    pub entities: Vec<InitialEntity>,

    /// Sparse tile overrides.
    #[serde(default)]
    pub tiles: Vec<InitialTile>,

    /// Objects placed at tick 0.
    #[serde(default)]
    pub objects: Vec<InitialObject>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Gateway bind address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayConfig {
    /// The host address to bind to.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

impl GatewayConfig {
    /// Override the listen port with `GLADE_GATEWAY_PORT` when set.
    ///
    /// Unparseable values are ignored with a warning rather than failing
    /// startup.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("GLADE_GATEWAY_PORT") {
            match raw.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => {
                    tracing::warn!(value = raw, "ignoring unparseable GLADE_GATEWAY_PORT");
                }
            }
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

/// Run boundary parameters.
///
/// A `max_ticks` of 0 means unlimited; the scheduler then runs until it
/// receives a shutdown signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Maximum number of ticks before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_grid_side() -> u32 {
    10
}

const fn default_tick_duration_ms() -> u64 {
    1_000
}

const fn default_tick_deadline_ms() -> u64 {
    500
}

const fn default_lease_ttl_ms() -> u64 {
    30_000
}

const fn default_observation_radius() -> u32 {
    5
}

const fn default_queue_depth() -> usize {
    128
}

fn default_entity_type() -> String {
    "walker".to_owned()
}

fn default_floor_type() -> String {
    "ground".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_gateway_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_gateway_port() -> u16 {
    8080
}

const fn default_true() -> bool {
    true
}
