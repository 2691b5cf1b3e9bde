use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tp_shared::{ApiEnvelope, ServiceAccess};
use tracing::{error, info};

use super::ApiClient;
use crate::error::ApiError;

pub const SERVICE_ACCESS_PATH: &str = "/api/v1/plugin/service/access";
pub const SERVICE_ACCESS_LIST_PATH: &str = "/api/v1/plugin/service/access/list";
pub const HEARTBEAT_PATH: &str = "/api/v1/plugin/heartbeat";

// 获取服务接入点请求
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceAccessRequest {
    pub service_access_id: String,
    pub service_identifier: String,
}

pub type ServiceAccessResponse = ApiEnvelope<ServiceAccess>;

// 获取服务接入点列表请求
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceAccessListRequest {
    pub service_identifier: String,
}

pub type ServiceAccessListResponse = ApiEnvelope<Vec<ServiceAccess>>;

// 心跳请求
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HeartbeatRequest {
    pub service_identifier: String,
}

pub type HeartbeatResponse = ApiEnvelope<Value>;

// 服务接入相关API封装
#[derive(Debug, Clone)]
pub struct ServiceApi {
    client: Arc<ApiClient>,
}

impl ServiceApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    // 获取服务接入点信息
    pub async fn get_service_access(
        &self,
        request: &ServiceAccessRequest,
    ) -> Result<ServiceAccessResponse, ApiError> {
        info!("Fetching service access: service_access_id={}", request.service_access_id);

        let response: ServiceAccessResponse = self
            .client
            .post(SERVICE_ACCESS_PATH, request)
            .await
            .map_err(|e| {
                error!("Failed to fetch service access: {}", e);
                ApiError::endpoint("get service access")(e)
            })?;

        info!(
            "Fetched service access: service_identifier={}, devices={}",
            response.data.service_identifier,
            response.data.devices.len()
        );
        Ok(response)
    }

    // 获取服务接入点列表
    pub async fn get_service_access_list(
        &self,
        request: &ServiceAccessListRequest,
    ) -> Result<ServiceAccessListResponse, ApiError> {
        info!("Fetching service access list: service_identifier={}", request.service_identifier);

        let response: ServiceAccessListResponse = self
            .client
            .post(SERVICE_ACCESS_LIST_PATH, request)
            .await
            .map_err(|e| {
                error!("Failed to fetch service access list: {}", e);
                ApiError::endpoint("get service access list")(e)
            })?;

        info!("Fetched {} service access points", response.data.len());
        Ok(response)
    }

    // 发送服务心跳
    pub async fn send_heartbeat(
        &self,
        request: &HeartbeatRequest,
    ) -> Result<HeartbeatResponse, ApiError> {
        let response: HeartbeatResponse = self
            .client
            .post(HEARTBEAT_PATH, request)
            .await
            .map_err(|e| {
                error!("Failed to send heartbeat: {}", e);
                ApiError::endpoint("send heartbeat")(e)
            })?;

        info!("Heartbeat sent: service_identifier={}", request.service_identifier);
        Ok(response)
    }
}
