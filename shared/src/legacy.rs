//! 旧版平台接口的数据结构适配
//!
//! 平台早期的设备配置接口返回 PascalCase 字段（`Id`、`AccessToken`、`DeviceConfig` 等）。
//! SDK 内部只使用 [`Device`] 一种规范结构，旧结构在这里转换。

use serde::{Deserialize, Serialize};

use crate::types::{ConfigMap, Device, SubDevice};

// 旧版子设备配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LegacySubDeviceConfig {
    #[serde(rename = "AccessToken", default)]
    pub access_token: String,
    #[serde(rename = "DeviceId", default)]
    pub device_id: String,
    #[serde(rename = "SubDeviceAddr", default)]
    pub sub_device_addr: String,
    #[serde(rename = "Config", default)]
    pub config: ConfigMap,
}

// 旧版设备配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LegacyDeviceConfig {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "ProtocolType", default)]
    pub protocol_type: String,
    #[serde(rename = "AccessToken", default)]
    pub access_token: String,
    #[serde(rename = "DeviceType", default)]
    pub device_type: String,
    #[serde(rename = "DeviceConfig", default, skip_serializing_if = "Option::is_none")]
    pub device_config: Option<ConfigMap>,
    #[serde(rename = "SubDevices", default, skip_serializing_if = "Vec::is_empty")]
    pub sub_devices: Vec<LegacySubDeviceConfig>,
}

impl From<LegacySubDeviceConfig> for SubDevice {
    fn from(legacy: LegacySubDeviceConfig) -> Self {
        SubDevice {
            device_id: legacy.device_id,
            voucher: legacy.access_token,
            device_number: String::new(),
            sub_device_addr: legacy.sub_device_addr,
            config: legacy.config,
            protocol_config_template: None,
        }
    }
}

impl From<LegacyDeviceConfig> for Device {
    fn from(legacy: LegacyDeviceConfig) -> Self {
        Device {
            id: legacy.id,
            voucher: legacy.access_token,
            device_number: String::new(),
            device_type: legacy.device_type,
            protocol_type: legacy.protocol_type,
            sub_devices: legacy.sub_devices.into_iter().map(SubDevice::from).collect(),
            config: legacy.device_config.unwrap_or_default(),
            protocol_config_template: None,
        }
    }
}

/// 平台可能下发的任意一种设备结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum VersionedDevice {
    Current(Device),
    Legacy(LegacyDeviceConfig),
}

impl VersionedDevice {
    pub fn into_device(self) -> Device {
        match self {
            VersionedDevice::Current(device) => device,
            VersionedDevice::Legacy(legacy) => legacy.into(),
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, VersionedDevice::Legacy(_))
    }
}

impl Default for VersionedDevice {
    fn default() -> Self {
        VersionedDevice::Current(Device::default())
    }
}

impl From<VersionedDevice> for Device {
    fn from(versioned: VersionedDevice) -> Self {
        versioned.into_device()
    }
}
