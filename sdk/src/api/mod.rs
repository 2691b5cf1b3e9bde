//! 平台 HTTP 接口
//!
//! [`ApiClient`] 负责请求的序列化、发送、状态码检查和响应解析，
//! [`DeviceApi`] / [`ServiceApi`] 在其上按接口路径做一层类型封装。
//!
//! 取消：丢弃返回的 future 即中止请求；整体超时由构造时的 `timeout` 控制。

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tp_shared::{join_url, truncate_string};
use tracing::{debug, error, info, warn};

use crate::error::ApiError;

pub mod device;
pub mod service;

pub use device::*;
pub use service::*;

const LOG_BODY_LIMIT: usize = 1024;

// TP平台API客户端
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        info!("API client initialized: base_url={}, timeout={:?}", base_url, timeout);

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // 执行GET请求
    pub async fn get<Resp>(&self, path: &str) -> Result<Resp, ApiError>
    where
        Resp: DeserializeOwned,
    {
        self.do_request::<(), Resp>(Method::GET, path, None).await
    }

    // 执行POST请求
    pub async fn post<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, ApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        self.do_request(Method::POST, path, Some(request)).await
    }

    // 执行HTTP请求并处理响应
    async fn do_request<Req, Resp>(
        &self,
        method: Method,
        path: &str,
        request: Option<&Req>,
    ) -> Result<Resp, ApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = join_url(&self.base_url, path);

        let mut builder = self
            .http_client
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json");

        // 序列化请求体
        let mut body_log = String::new();
        if let Some(request) = request {
            let body = serde_json::to_vec(request).map_err(|e| {
                error!("Failed to serialize request body for {} {}: {}", method, url, e);
                ApiError::Serialize(e)
            })?;
            body_log = truncate_string(&String::from_utf8_lossy(&body), LOG_BODY_LIMIT);
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let start = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    method = %method,
                    url = %url,
                    body = %body_log,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "HTTP request failed: {}", e
                );
                return Err(ApiError::Transport(e));
            }
        };

        let status = response.status();
        info!(
            method = %method,
            url = %url,
            body = %body_log,
            elapsed_ms = start.elapsed().as_millis() as u64,
            status = status.as_u16(),
            "HTTP request completed"
        );

        let text = response.text().await?;

        // 检查状态码
        if status != StatusCode::OK {
            warn!(
                "Non-200 response from {}: status={}, body={}",
                url,
                status.as_u16(),
                truncate_string(&text, LOG_BODY_LIMIT)
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        // 解析响应体
        match serde_json::from_str(&text) {
            Ok(decoded) => {
                debug!("Response decoded from {}", url);
                Ok(decoded)
            }
            Err(source) => {
                error!(
                    "Failed to decode response from {}: {}, body={}",
                    url,
                    source,
                    truncate_string(&text, LOG_BODY_LIMIT)
                );
                Err(ApiError::Decode { source, body: text })
            }
        }
    }
}
