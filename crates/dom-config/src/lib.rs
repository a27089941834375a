//! Domotic configuration
//!
//! A single YAML file describes the blocks, the connectors between them,
//! and the runtime and supervisor tuning:
//!
//! ```yaml
//! runtime:
//!   tick_period_ms: 50
//! supervisor:
//!   driver_path: /usr/local/bin/domotic-driver
//! blocks:
//!   - type: switch
//!     name: hallSwitch
//!     channel: 0
//!   - type: lamp
//!     name: hall
//!     channel: 10
//! wiring:
//!   - { src: hallSwitch, event: SingleClick, target: hall, action: toggle }
//! ```

mod blocks;
mod config;
mod error;

pub use blocks::{BlockConfig, BlockKind, ChannelRef};
pub use config::{
    load_config, DomoticConfig, RuntimeConfig, SnapshotConfig, SupervisorConfig, WireConfig,
};
pub use error::{ConfigError, ConfigResult};
