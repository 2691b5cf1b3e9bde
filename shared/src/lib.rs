pub mod config;
pub mod legacy;
pub mod mqtt;
pub mod types;
pub mod utils;

pub use config::{
    load_config, validate_config, ClientConfig, MqttConfig, PluginConfig, ServerConfig,
};
pub use legacy::{LegacyDeviceConfig, LegacySubDeviceConfig, VersionedDevice};
pub use mqtt::{
    topic_matches, PayloadError, QoS, StatusPayload, DEVICE_STATUS_TOPIC, STATUS_OFFLINE,
    STATUS_ONLINE,
};
pub use types::*;
pub use utils::*;
