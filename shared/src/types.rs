use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 设备类型：直连设备
pub const DEVICE_TYPE_DIRECT: &str = "1";
/// 设备类型：网关
pub const DEVICE_TYPE_GATEWAY: &str = "2";
/// 设备类型：子设备
pub const DEVICE_TYPE_SUB_DEVICE: &str = "3";

/// 表单配置数据，平台下发的任意 JSON 对象
pub type ConfigMap = Map<String, Value>;

// 设备信息
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub voucher: String,
    #[serde(default)]
    pub device_number: String,
    #[serde(default)]
    pub device_type: String,
    // 旧版接口使用 "Protocol_type"
    #[serde(default, alias = "Protocol_type")]
    pub protocol_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_devices: Vec<SubDevice>,
    #[serde(default)]
    pub config: ConfigMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_config_template: Option<ConfigMap>,
}

impl Device {
    pub fn is_gateway(&self) -> bool {
        self.device_type == DEVICE_TYPE_GATEWAY
    }

    /// 子设备只属于网关，其他类型的设备即使平台带了子设备也视为空
    pub fn sub_devices(&self) -> &[SubDevice] {
        if self.is_gateway() {
            &self.sub_devices
        } else {
            &[]
        }
    }

    /// 凭证通常是一个 JSON 字符串，例如 {"reg_pkg":"x"}
    pub fn voucher_json(&self) -> Option<Value> {
        serde_json::from_str(&self.voucher).ok()
    }
}

// 子设备信息
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubDevice {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub voucher: String,
    #[serde(default)]
    pub device_number: String,
    #[serde(default)]
    pub sub_device_addr: String,
    #[serde(default)]
    pub config: ConfigMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_config_template: Option<ConfigMap>,
}

// 服务接入信息
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceAccess {
    #[serde(default)]
    pub service_access_id: String,
    #[serde(default)]
    pub service_identifier: String,
    #[serde(default)]
    pub voucher: String,
    #[serde(default)]
    pub service_access_config_template: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub devices: Vec<Device>,
}

// 设备动态认证结果
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceDynamicAuthData {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub voucher: String,
}

// 平台通用响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn new(code: i32, message: impl Into<String>, data: T) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiEnvelope<U> {
        ApiEnvelope {
            code: self.code,
            message: self.message,
            data: f(self.data),
        }
    }
}

// 插件回调：设备列表项
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceItem {
    pub device_name: String,
    pub description: String,
    pub device_number: String,
}

// 插件回调：设备列表数据
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceListData {
    pub list: Vec<DeviceItem>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_device_decodes_with_missing_fields() {
        let device: Device = serde_json::from_value(json!({
            "id": "d1",
            "device_type": "1"
        }))
        .unwrap();

        assert_eq!(device.id, "d1");
        assert_eq!(device.device_type, DEVICE_TYPE_DIRECT);
        assert!(device.sub_devices.is_empty());
        assert!(device.config.is_empty());
        assert!(device.protocol_config_template.is_none());
    }

    #[test]
    fn test_device_accepts_drifted_protocol_key() {
        let device: Device = serde_json::from_value(json!({
            "id": "d1",
            "Protocol_type": "MODBUS_TCP"
        }))
        .unwrap();

        assert_eq!(device.protocol_type, "MODBUS_TCP");

        // 输出统一使用规范字段名
        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(value["protocol_type"], "MODBUS_TCP");
        assert!(value.get("Protocol_type").is_none());
        assert!(value.get("sub_devices").is_none());
    }

    #[test]
    fn test_sub_devices_only_for_gateway() {
        let mut device = Device {
            id: "gw".to_string(),
            device_type: DEVICE_TYPE_GATEWAY.to_string(),
            sub_devices: vec![SubDevice {
                device_id: "s1".to_string(),
                sub_device_addr: "0x01".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(device.is_gateway());
        assert_eq!(device.sub_devices().len(), 1);

        device.device_type = DEVICE_TYPE_DIRECT.to_string();
        assert!(device.sub_devices().is_empty());
    }

    #[test]
    fn test_voucher_json() {
        let device = Device {
            id: "d1".to_string(),
            voucher: r#"{"reg_pkg":"x"}"#.to_string(),
            ..Default::default()
        };
        assert_eq!(device.voucher_json(), Some(json!({"reg_pkg": "x"})));

        let opaque = Device {
            voucher: "plain-token".to_string(),
            ..device
        };
        assert!(opaque.voucher_json().is_none());
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: ApiEnvelope<Value> =
            serde_json::from_str(r#"{"code":200,"message":"ok"}"#).unwrap();
        assert_eq!(envelope.code, 200);
        assert_eq!(envelope.data, Value::Null);

        let mapped = ApiEnvelope::new(200, "ok", 2).map(|n| n * 2);
        assert_eq!(mapped.data, 4);
    }

    #[test]
    fn test_service_access_owns_devices() {
        let access: ServiceAccess = serde_json::from_value(json!({
            "service_access_id": "sa1",
            "service_identifier": "svc",
            "voucher": "{\"key\":\"v\"}",
            "devices": [{"id": "d1"}, {"id": "d2", "device_type": "2"}]
        }))
        .unwrap();

        assert_eq!(access.devices.len(), 2);
        assert!(access.devices[1].is_gateway());
        assert!(access.remark.is_empty());
    }
}
