use crate::domains::floor::FloorSettings;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub run: RunConfig,
    pub source: SourceConfig,
    pub logging: LoggingConfig,
    pub store: StoreConfig,
}

/// Clock and scheduler cadence of the floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub quantum_ms: u64,
    pub motion_resolution_ms: u64,
    pub winder_resolution_ms: u64,
    pub scheduler_period_ms: u64,
    pub sync_period_ms: u64,
    pub collision_margin_mm: i64,
    pub auto_start_winders: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Pace ticks against the wall clock instead of running flat out.
    pub realtime: bool,
    /// Simulated horizon; none means run until interrupted.
    pub run_for_ms: Option<u64>,
    pub report_every_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON floor models; the seeded demo floor when absent.
    pub models_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<String>,
    pub buffer_capacity: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
    Postgres,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
    pub postgres: PostgresConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_connections: u32,
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Defaults, then the optional TOML file, then `WINDING__SECTION__KEY`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        let layered = builder
            .add_source(
                ::config::Environment::with_prefix("WINDING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(layered.try_deserialize()?)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let floor = FloorSettings::default();
        Self {
            quantum_ms: floor.quantum_ms,
            motion_resolution_ms: floor.motion_resolution_ms,
            winder_resolution_ms: floor.winder_resolution_ms,
            scheduler_period_ms: floor.scheduler_period_ms,
            sync_period_ms: floor.sync_period_ms,
            collision_margin_mm: floor.collision_margin_mm,
            auto_start_winders: floor.auto_start_winders,
        }
    }
}

impl From<&SimulationConfig> for FloorSettings {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            quantum_ms: config.quantum_ms.max(1),
            motion_resolution_ms: config.motion_resolution_ms.max(1),
            winder_resolution_ms: config.winder_resolution_ms.max(1),
            scheduler_period_ms: config.scheduler_period_ms.max(1),
            sync_period_ms: config.sync_period_ms.max(1),
            collision_margin_mm: config.collision_margin_mm,
            auto_start_winders: config.auto_start_winders,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            realtime: false,
            run_for_ms: None,
            report_every_ms: 10_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            buffer_capacity: 1024,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: PathBuf::from("snapshots.jsonl"),
            postgres: PostgresConfig::default(),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "winding_floor".to_string(),
            username: "postgres".to_string(),
            password: "password".to_string(),
            max_connections: 10,
        }
    }
}
