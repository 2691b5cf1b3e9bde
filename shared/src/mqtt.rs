use serde::{Deserialize, Serialize};

/// 设备在线/离线状态上报主题
pub const DEVICE_STATUS_TOPIC: &str = "device/status";

/// 在线
pub const STATUS_ONLINE: &str = "1";
/// 离线
pub const STATUS_OFFLINE: &str = "0";

mod qos_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use super::QoS;

    pub fn serialize<S>(qos: &QoS, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(*qos as u8)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<QoS, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        QoS::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid QoS value: {}", value)))
    }
}

// MQTT 消息质量等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QoS {
    AtMostOnce = 0,
    #[default]
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl QoS {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(QoS::AtMostOnce),
            1 => Some(QoS::AtLeastOnce),
            2 => Some(QoS::ExactlyOnce),
            _ => None,
        }
    }
}

impl Serialize for QoS {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        qos_serde::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for QoS {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        qos_serde::deserialize(deserializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("accessToken must not be empty")]
    EmptyAccessToken,

    #[error("status must be \"1\" (online) or \"0\" (offline), got {0:?}")]
    InvalidStatus(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusValues {
    pub status: String,
}

/// 设备在线/离线上报消息 {"accessToken":"..","values":{"status":"1"}}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusPayload {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    pub values: StatusValues,
}

impl StatusPayload {
    pub fn new(access_token: &str, status: &str) -> Result<Self, PayloadError> {
        if access_token.is_empty() {
            return Err(PayloadError::EmptyAccessToken);
        }
        if status != STATUS_ONLINE && status != STATUS_OFFLINE {
            return Err(PayloadError::InvalidStatus(status.to_string()));
        }

        Ok(Self {
            access_token: access_token.to_string(),
            values: StatusValues {
                status: status.to_string(),
            },
        })
    }

    pub fn is_online(&self) -> bool {
        self.values.status == STATUS_ONLINE
    }
}

/// 判断主题是否匹配订阅过滤器，支持 `+` 和 `#` 通配符
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    // 以 $ 开头的系统主题不参与通配
    if topic.starts_with('$') && (filter.starts_with('+') || filter.starts_with('#')) {
        return false;
    }

    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => continue,
            (Some(f), Some(t)) if f == t => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_payload_wire_format() {
        let payload = StatusPayload::new("token-1", STATUS_ONLINE).unwrap();
        assert!(payload.is_online());
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"accessToken":"token-1","values":{"status":"1"}}"#
        );
    }

    #[test]
    fn test_status_payload_validation() {
        assert_eq!(
            StatusPayload::new("", STATUS_OFFLINE),
            Err(PayloadError::EmptyAccessToken)
        );
        assert_eq!(
            StatusPayload::new("token", "2"),
            Err(PayloadError::InvalidStatus("2".to_string()))
        );
        assert!(StatusPayload::new("token", "online").is_err());
        assert!(StatusPayload::new("token", STATUS_OFFLINE).is_ok());
    }

    #[test]
    fn test_qos_serde() {
        assert_eq!(serde_json::to_string(&QoS::ExactlyOnce).unwrap(), "2");
        assert_eq!(serde_json::from_str::<QoS>("0").unwrap(), QoS::AtMostOnce);
        assert!(serde_json::from_str::<QoS>("3").is_err());
        assert_eq!(QoS::default(), QoS::AtLeastOnce);
    }

    #[test]
    fn test_topic_matches() {
        assert!(topic_matches("device/status", "device/status"));
        assert!(topic_matches("plugin/example/+", "plugin/example/a"));
        assert!(!topic_matches("plugin/example/+", "plugin/example/a/b"));
        assert!(topic_matches("plugin/#", "plugin/example/a/b"));
        assert!(topic_matches("plugin/#", "plugin"));
        assert!(topic_matches("+/status", "device/status"));
        assert!(!topic_matches("device/status", "device/status/extra"));
        assert!(!topic_matches("device/+/status", "device/status"));
        assert!(!topic_matches("#", "$SYS/broker/uptime"));
    }
}
