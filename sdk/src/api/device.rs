use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tp_shared::{ApiEnvelope, Device, DeviceDynamicAuthData, VersionedDevice};
use tracing::{error, info};

use super::ApiClient;
use crate::error::ApiError;

pub const DEVICE_CONFIG_PATH: &str = "/api/v1/plugin/device/config";
pub const DEVICE_CONFIG_LIST_PATH: &str = "/api/v1/plugin/all_device/config";
pub const DEVICE_AUTH_PATH: &str = "/api/v1/device/auth";
pub const DEVICE_LIST_PATH: &str = "/api/v1/plugin/devices";

// 获取设备配置请求（设备ID或设备凭证二选一）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfigRequest {
    pub device_id: String,
    pub voucher: String,
    pub device_number: String,
}

pub type DeviceConfigResponse = ApiEnvelope<Device>;

// 按协议类型获取全部设备配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfigListRequest {
    pub protocol_type: String,
    pub device_type: String,
}

pub type DeviceConfigListResponse = ApiEnvelope<Vec<Device>>;

// 设备动态认证请求
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceDynamicAuthRequest {
    pub template_secret: String,
    pub device_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_device_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_device_number: Option<String>,
}

pub type DeviceDynamicAuthResponse = ApiEnvelope<DeviceDynamicAuthData>;

// 按服务标识符分页获取设备
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceListRequest {
    pub service_identifier: String,
    pub device_type: String,
    pub page: i64,
    pub page_size: i64,
}

// 该接口把设备列表放在顶层 list 字段
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceListResponse {
    pub code: i32,
    pub message: String,
    #[serde(default, alias = "data")]
    pub list: Vec<Device>,
}

// 设备相关API封装
#[derive(Debug, Clone)]
pub struct DeviceApi {
    client: Arc<ApiClient>,
}

impl DeviceApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    // 获取设备配置信息
    pub async fn get_device_config(
        &self,
        request: &DeviceConfigRequest,
    ) -> Result<DeviceConfigResponse, ApiError> {
        info!(
            "Fetching device config: device_id={}, device_number={}",
            request.device_id, request.device_number
        );

        let response: DeviceConfigResponse = self
            .client
            .post(DEVICE_CONFIG_PATH, request)
            .await
            .map_err(|e| {
                error!("Failed to fetch device config: {}", e);
                ApiError::endpoint("get device config")(e)
            })?;

        info!(
            "Fetched device config: id={}, device_type={}",
            response.data.id, response.data.device_type
        );
        Ok(response)
    }

    // 获取某协议下的全部设备配置，兼容旧版字段格式
    pub async fn get_device_config_list(
        &self,
        request: &DeviceConfigListRequest,
    ) -> Result<DeviceConfigListResponse, ApiError> {
        info!(
            "Fetching device config list: protocol_type={}, device_type={}",
            request.protocol_type, request.device_type
        );

        let response: ApiEnvelope<Vec<VersionedDevice>> = self
            .client
            .post(DEVICE_CONFIG_LIST_PATH, request)
            .await
            .map_err(|e| {
                error!("Failed to fetch device config list: {}", e);
                ApiError::endpoint("get device config list")(e)
            })?;

        let response =
            response.map(|devices| devices.into_iter().map(Device::from).collect::<Vec<_>>());
        info!("Fetched {} device configs", response.data.len());
        Ok(response)
    }

    // 设备动态认证
    pub async fn device_dynamic_auth(
        &self,
        request: &DeviceDynamicAuthRequest,
    ) -> Result<DeviceDynamicAuthResponse, ApiError> {
        info!("Device dynamic auth: device_number={}", request.device_number);

        let response: DeviceDynamicAuthResponse = self
            .client
            .post(DEVICE_AUTH_PATH, request)
            .await
            .map_err(|e| {
                error!("Device dynamic auth failed: {}", e);
                ApiError::endpoint("device dynamic auth")(e)
            })?;

        info!("Device dynamic auth succeeded: device_id={}", response.data.device_id);
        Ok(response)
    }

    // 根据服务标识符获取设备信息（带配置），分页参数原样透传
    pub async fn list_devices(
        &self,
        request: &DeviceListRequest,
    ) -> Result<DeviceListResponse, ApiError> {
        let response: DeviceListResponse = self
            .client
            .post(DEVICE_LIST_PATH, request)
            .await
            .map_err(|e| {
                error!("Failed to list devices: {}", e);
                ApiError::endpoint("list devices")(e)
            })?;

        info!("Listed {} devices", response.list.len());
        Ok(response)
    }
}
