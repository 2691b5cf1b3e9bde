//! ThingsPanel 协议插件 SDK
//!
//! - [`api`]: 调用平台 HTTP 接口（设备配置、凭证认证、服务接入、心跳）
//! - [`mqtt_client`]: 连接平台 MQTT，发布设备上下线状态
//! - [`handler`]: 接收平台回调的 HTTP 服务
//! - [`client`]: 聚合以上客户端的 [`TpClient`]

pub mod api;
pub mod client;
pub mod error;
pub mod handler;
pub mod mqtt_client;

pub use api::{ApiClient, DeviceApi, ServiceApi};
pub use client::TpClient;
pub use error::{ApiError, ClientError, MqttError};
pub use handler::{CallbackResponse, Handler};
pub use mqtt_client::{parse_broker, ConnectionState, MessageHandler, MqttClient};

pub use tp_shared as shared;
