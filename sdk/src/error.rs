use tp_shared::PayloadError;

// 平台 HTTP 接口错误
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request failed with HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response body: {source}; body: {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("{endpoint} failed: {source}")]
    Endpoint {
        endpoint: &'static str,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    pub(crate) fn endpoint(endpoint: &'static str) -> impl FnOnce(ApiError) -> ApiError {
        move |source| ApiError::Endpoint {
            endpoint,
            source: Box::new(source),
        }
    }

    /// 非 200 响应时返回 HTTP 状态码
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Endpoint { source, .. } => source.status_code(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.is_timeout(),
            ApiError::Endpoint { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

// MQTT 客户端错误
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    #[error("Invalid MQTT broker address {broker:?}: {reason}")]
    InvalidBroker { broker: String, reason: String },

    #[error("MQTT client is not connected")]
    NotConnected,

    #[error("Invalid MQTT payload: {0}")]
    Validation(#[from] PayloadError),

    #[error("Failed to connect to MQTT broker after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("MQTT client request failed: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("Failed to serialize MQTT payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

// SDK 客户端错误
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    #[error("MQTT error: {0}")]
    Mqtt(#[from] MqttError),
}
