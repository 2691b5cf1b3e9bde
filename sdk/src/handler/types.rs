use serde::{Deserialize, Serialize};

// 获取表单配置请求
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GetFormConfigRequest {
    pub protocol_type: String, // 协议/服务标识符
    pub device_type: String,   // 1-设备 2-网关 3-子设备
    pub form_type: String,     // CFG-配置表单 VCR-凭证表单 SVCR-服务凭证表单
}

// 设备断开连接请求
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceDisconnectRequest {
    #[serde(default)]
    pub device_id: String,
}

// 通知请求
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationRequest {
    #[serde(default)]
    pub message_type: String, // 1-服务配置修改
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// 获取设备列表请求
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GetDeviceListRequest {
    pub voucher: String,
    pub service_identifier: String,
    pub page_size: i64,
    pub page: i64,
}

// 回调通用响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallbackResponse<T> {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("missing required query parameters: {}", .0.join(", "))]
    MissingParams(Vec<&'static str>),

    #[error("invalid {0}")]
    InvalidNumber(&'static str),

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

fn require(value: Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            missing.push(name);
            String::new()
        }
    }
}

// 表单配置查询参数，原始字符串形式
#[derive(Debug, Default, Deserialize)]
pub struct FormConfigQuery {
    pub protocol_type: Option<String>,
    pub device_type: Option<String>,
    pub form_type: Option<String>,
}

impl TryFrom<FormConfigQuery> for GetFormConfigRequest {
    type Error = BindError;

    fn try_from(query: FormConfigQuery) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        let request = GetFormConfigRequest {
            protocol_type: require(query.protocol_type, "protocol_type", &mut missing),
            device_type: require(query.device_type, "device_type", &mut missing),
            form_type: require(query.form_type, "form_type", &mut missing),
        };

        if missing.is_empty() {
            Ok(request)
        } else {
            Err(BindError::MissingParams(missing))
        }
    }
}

// 设备列表查询参数，原始字符串形式
#[derive(Debug, Default, Deserialize)]
pub struct DeviceListQuery {
    pub voucher: Option<String>,
    pub service_identifier: Option<String>,
    pub page_size: Option<String>,
    pub page: Option<String>,
}

impl TryFrom<DeviceListQuery> for GetDeviceListRequest {
    type Error = BindError;

    fn try_from(query: DeviceListQuery) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        let voucher = require(query.voucher, "voucher", &mut missing);
        let service_identifier =
            require(query.service_identifier, "service_identifier", &mut missing);
        let page_size = require(query.page_size, "page_size", &mut missing);
        let page = require(query.page, "page", &mut missing);

        if !missing.is_empty() {
            return Err(BindError::MissingParams(missing));
        }

        Ok(GetDeviceListRequest {
            voucher,
            service_identifier,
            page_size: page_size.parse().map_err(|_| BindError::InvalidNumber("page_size"))?,
            page: page.parse().map_err(|_| BindError::InvalidNumber("page"))?,
        })
    }
}

impl DeviceDisconnectRequest {
    pub fn validate(&self) -> Result<(), BindError> {
        if self.device_id.is_empty() {
            return Err(BindError::MissingField("device_id"));
        }
        Ok(())
    }
}

impl NotificationRequest {
    pub fn validate(&self) -> Result<(), BindError> {
        if self.message_type.is_empty() {
            return Err(BindError::MissingField("message_type"));
        }
        Ok(())
    }
}
