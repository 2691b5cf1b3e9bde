use std::sync::Arc;
use tp_shared::ClientConfig;
use tracing::info;

use crate::api::{ApiClient, DeviceApi, ServiceApi};
use crate::error::ClientError;
use crate::mqtt_client::MqttClient;

/// ThingsPanel 插件客户端
///
/// 由一份 [`ClientConfig`] 构建，聚合平台 HTTP 接口与 MQTT 客户端。
/// HTTP 部分构造后即可使用，MQTT 需要调用 [`TpClient::connect`]。
#[derive(Debug, Clone)]
pub struct TpClient {
    api: Arc<ApiClient>,
    device: DeviceApi,
    service: ServiceApi,
    mqtt: Arc<MqttClient>,
}

impl TpClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let api = Arc::new(ApiClient::new(config.base_url.clone(), config.api_timeout())?);
        let mqtt = Arc::new(MqttClient::new(config.mqtt)?);

        info!(
            "ThingsPanel client created: base_url={}, mqtt_client_id={}",
            api.base_url(),
            mqtt.client_id()
        );

        Ok(Self {
            device: DeviceApi::new(api.clone()),
            service: ServiceApi::new(api.clone()),
            api,
            mqtt,
        })
    }

    // 连接MQTT服务器
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.mqtt.connect().await?;
        Ok(())
    }

    // 关闭客户端，断线重连期间事件循环仍在运行，无论当前状态如何都要断开
    pub async fn close(&self) {
        self.mqtt.disconnect().await;
        info!("ThingsPanel client closed");
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn device(&self) -> &DeviceApi {
        &self.device
    }

    pub fn service(&self) -> &ServiceApi {
        &self.service
    }

    pub fn mqtt(&self) -> &Arc<MqttClient> {
        &self.mqtt
    }
}
