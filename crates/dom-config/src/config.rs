//! Top-level configuration file

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use dom_core::EventType;
use dom_runtime::{RuntimeBuilder, RuntimeSettings, SchedulerSettings};
use dom_supervisor::SupervisorSettings;
use serde::Deserialize;
use tracing::{debug, info};

use crate::blocks::BlockConfig;
use crate::error::{ConfigError, ConfigResult};

fn default_tick_period_ms() -> u64 {
    SchedulerSettings::default().tick_period_ms
}

fn default_scheduler_join_ms() -> u64 {
    SchedulerSettings::default().join_timeout_ms
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("DomoticOutputStates.json")
}

/// `runtime:` section
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
    #[serde(flatten)]
    pub settings: RuntimeSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            settings: RuntimeSettings::default(),
        }
    }
}

/// `supervisor:` section
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SupervisorConfig {
    /// How long a stopping tick loop may take before it is abandoned
    #[serde(default = "default_scheduler_join_ms")]
    pub scheduler_join_ms: u64,
    #[serde(flatten)]
    pub settings: SupervisorSettings,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            scheduler_join_ms: default_scheduler_join_ms(),
            settings: SupervisorSettings::default(),
        }
    }
}

/// `snapshot:` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

/// One connector: when `src` emits `event`, deliver `action` to `target`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WireConfig {
    pub src: String,
    pub event: EventType,
    pub target: String,
    pub action: EventType,
    #[serde(default)]
    pub label: Option<String>,
}

impl WireConfig {
    fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            format!("{}.{} -> {}.{}", self.src, self.event, self.target, self.action)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DomoticConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub blocks: Vec<BlockConfig>,
    #[serde(default)]
    pub wiring: Vec<WireConfig>,
}

impl DomoticConfig {
    /// Parse YAML read from `source`; the path only labels errors
    pub fn from_yaml(content: &str, source: &Path) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that need the whole file; block-level checks happen while building
    pub fn validate(&self) -> ConfigResult<()> {
        if self.runtime.tick_period_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "runtime.tick_period_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.runtime.settings.notify_every == 0 {
            return Err(ConfigError::InvalidValue {
                key: "runtime.notify_every".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.supervisor.settings.monitoring_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "supervisor.monitoring_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            tick_period_ms: self.runtime.tick_period_ms,
            join_timeout_ms: self.supervisor.scheduler_join_ms,
        }
    }

    /// Register every block and wire every connector, in file order
    pub fn runtime_builder(&self) -> ConfigResult<RuntimeBuilder> {
        let mut builder = RuntimeBuilder::with_settings(self.runtime.settings);
        for block in &self.blocks {
            builder.register(block.build()?)?;
        }
        for wire in &self.wiring {
            builder.connect(&wire.src, wire.event, &wire.target, wire.action, wire.label())?;
        }
        info!(
            blocks = self.blocks.len(),
            connectors = self.wiring.len(),
            "Block graph configured"
        );
        Ok(builder)
    }
}

impl FromStr for DomoticConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_yaml(s, Path::new("<inline>"))
    }
}

/// Read and parse the configuration file at `path`
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<DomoticConfig> {
    let path = path.as_ref();
    debug!("Loading configuration file: {:?}", path);
    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    DomoticConfig::from_yaml(&content, path)
}
