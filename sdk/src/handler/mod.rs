//! 平台回调处理器
//!
//! 协议插件启动一个 HTTP 服务，平台通过固定路径调用插件：查询表单配置、
//! 通知设备断开、推送通知事件、查询设备列表，以及旧版的设备配置增删改推送。
//! 每个路径只接受一种 HTTP 方法，用户通过 `set_*_handler` 注册回调。
//!
//! 响应统一为 `{code, message, data}`，HTTP 状态码与 `code` 一致：
//! 参数错误 400，方法错误 405，回调返回错误或未注册回调 500。

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::{middleware as axum_middleware, Json, Router};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tp_shared::{Device, DeviceListData, VersionedDevice};
use tracing::{error, info, warn};

pub mod middleware;
pub mod types;

pub use types::*;

use middleware::request_logging;

pub const FORM_CONFIG_PATH: &str = "/api/v1/form/config";
pub const FORM_CONFIG_V2_PATH: &str = "/api/v2/form/config";
pub const LEGACY_FORM_CONFIG_PATH: &str = "/api/form/config";
pub const DEVICE_DISCONNECT_PATH: &str = "/api/v1/device/disconnect";
pub const NOTIFICATION_PATH: &str = "/api/v1/plugin/notification";
pub const NOTIFY_EVENT_PATH: &str = "/api/v1/notify/event";
pub const DEVICE_LIST_PATH: &str = "/api/v1/plugin/device/list";
pub const DEVICE_CONFIG_ADD_PATH: &str = "/api/device/config/add";
pub const DEVICE_CONFIG_UPDATE_PATH: &str = "/api/device/config/update";
pub const DEVICE_CONFIG_DELETE_PATH: &str = "/api/device/config/delete";

type Callback<Req, Resp> =
    Arc<dyn Fn(Req) -> BoxFuture<'static, anyhow::Result<Resp>> + Send + Sync>;

fn boxed<Req, Resp, F, Fut>(f: F) -> Callback<Req, Resp>
where
    Req: 'static,
    Resp: 'static,
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Resp>> + Send + 'static,
{
    Arc::new(move |req| f(req).boxed())
}

#[derive(Clone, Default)]
struct Callbacks {
    form_config: Option<Callback<GetFormConfigRequest, Value>>,
    device_disconnect: Option<Callback<DeviceDisconnectRequest, ()>>,
    notification: Option<Callback<NotificationRequest, ()>>,
    device_list: Option<Callback<GetDeviceListRequest, DeviceListData>>,
    create_device: Option<Callback<Device, ()>>,
    update_device: Option<Callback<Device, ()>>,
    delete_device: Option<Callback<Device, ()>>,
}

type SharedCallbacks = Arc<Callbacks>;

// 回调处理器
#[derive(Clone, Default)]
pub struct Handler {
    callbacks: Callbacks,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    // 设置表单配置处理函数
    pub fn set_form_config_handler<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(GetFormConfigRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.callbacks.form_config = Some(boxed(handler));
        self
    }

    // 设置设备断开处理函数
    pub fn set_device_disconnect_handler<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(DeviceDisconnectRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.callbacks.device_disconnect = Some(boxed(handler));
        self
    }

    // 设置通知处理函数
    pub fn set_notification_handler<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(NotificationRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.callbacks.notification = Some(boxed(handler));
        self
    }

    // 设置获取设备列表处理函数
    pub fn set_get_device_list_handler<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(GetDeviceListRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<DeviceListData>> + Send + 'static,
    {
        self.callbacks.device_list = Some(boxed(handler));
        self
    }

    // 旧版：新增设备
    pub fn set_create_device_handler<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Device) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.callbacks.create_device = Some(boxed(handler));
        self
    }

    // 旧版：更新设备
    pub fn set_update_device_handler<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Device) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.callbacks.update_device = Some(boxed(handler));
        self
    }

    // 旧版：删除设备
    pub fn set_delete_device_handler<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Device) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.callbacks.delete_device = Some(boxed(handler));
        self
    }

    /// 构建路由表，可以直接嵌入到其他 axum 应用中
    pub fn router(&self) -> Router {
        let callbacks: SharedCallbacks = Arc::new(self.callbacks.clone());

        Router::new()
            .route(FORM_CONFIG_PATH, only(get(handle_form_config)))
            .route(FORM_CONFIG_V2_PATH, only(get(handle_form_config)))
            .route(LEGACY_FORM_CONFIG_PATH, only(get(handle_form_config)))
            .route(DEVICE_DISCONNECT_PATH, only(post(handle_device_disconnect)))
            .route(NOTIFICATION_PATH, only(post(handle_notification)))
            .route(NOTIFY_EVENT_PATH, only(post(handle_notification)))
            .route(DEVICE_LIST_PATH, only(get(handle_get_device_list)))
            .route(DEVICE_CONFIG_ADD_PATH, only(post(handle_create_device)))
            .route(DEVICE_CONFIG_UPDATE_PATH, only(post(handle_update_device)))
            .route(DEVICE_CONFIG_DELETE_PATH, only(post(handle_delete_device)))
            .fallback(not_found)
            .with_state(callbacks)
            .layer(axum_middleware::from_fn(request_logging))
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(handle_panic))
    }

    // 启动HTTP服务
    pub async fn start(&self, addr: &str) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind callback server on {}", addr))?;
        self.serve(listener).await
    }

    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        self.serve_with_shutdown(listener, std::future::pending()).await
    }

    pub async fn serve_with_shutdown<S>(
        &self,
        listener: TcpListener,
        shutdown: S,
    ) -> anyhow::Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        info!("Callback server listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("Callback server terminated")?;
        info!("Callback server stopped");
        Ok(())
    }
}

// 路由只接受一种方法，其余方法返回 405
fn only(route: MethodRouter<SharedCallbacks>) -> MethodRouter<SharedCallbacks> {
    route.fallback(method_not_allowed)
}

fn reply<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: Option<T>,
) -> Response {
    let body = CallbackResponse {
        code: status.as_u16(),
        message: message.into(),
        data,
    };
    (status, Json(body)).into_response()
}

fn reply_error(status: StatusCode, message: impl Into<String>) -> Response {
    reply::<()>(status, message, None)
}

async fn method_not_allowed() -> Response {
    reply_error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}

async fn not_found() -> Response {
    reply_error(StatusCode::NOT_FOUND, "not found")
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Callback panicked: {}", detail);
    reply_error(StatusCode::INTERNAL_SERVER_ERROR, "callback panicked")
}

// 调用用户回调，未注册或返回错误时生成 500 响应
async fn invoke<Req, Resp>(
    callback: Option<&Callback<Req, Resp>>,
    name: &str,
    request: Req,
) -> Result<Resp, Response> {
    let Some(callback) = callback else {
        error!("No {} handler configured", name);
        return Err(reply_error(StatusCode::INTERNAL_SERVER_ERROR, "handler not configured"));
    };

    callback(request).await.map_err(|e| {
        warn!("{} handler returned error: {:#}", name, e);
        reply_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

// 平台推送不一定带 Content-Type，直接按 JSON 解析请求体
fn bad_request(err: BindError) -> Response {
    reply_error(StatusCode::BAD_REQUEST, err.to_string())
}

fn json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|e| {
        warn!("Invalid callback request body: {}", e);
        reply_error(StatusCode::BAD_REQUEST, "invalid request body")
    })
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, Response> {
    query.map(|Query(value)| value).map_err(|rejection| {
        reply_error(StatusCode::BAD_REQUEST, rejection.body_text())
    })
}

async fn handle_form_config(
    State(callbacks): State<SharedCallbacks>,
    query: Result<Query<FormConfigQuery>, QueryRejection>,
) -> Response {
    let request = match query_params(query).and_then(|q| {
        GetFormConfigRequest::try_from(q).map_err(bad_request)
    }) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(
        "Form config requested: protocol_type={}, device_type={}, form_type={}",
        request.protocol_type, request.device_type, request.form_type
    );

    match invoke(callbacks.form_config.as_ref(), "form config", request).await {
        Ok(data) => reply(StatusCode::OK, "success", Some(data)),
        Err(response) => response,
    }
}

async fn handle_device_disconnect(
    State(callbacks): State<SharedCallbacks>,
    body: Bytes,
) -> Response {
    let request = match json_body(&body).and_then(|req: DeviceDisconnectRequest| {
        req.validate()
            .map(|_| req)
            .map_err(|e| reply_error(StatusCode::BAD_REQUEST, e.to_string()))
    }) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!("Device disconnect requested: device_id={}", request.device_id);

    match invoke(callbacks.device_disconnect.as_ref(), "device disconnect", request).await {
        Ok(()) => reply::<()>(StatusCode::OK, "success", None),
        Err(response) => response,
    }
}

async fn handle_notification(State(callbacks): State<SharedCallbacks>, body: Bytes) -> Response {
    let request = match json_body(&body).and_then(|req: NotificationRequest| {
        req.validate()
            .map(|_| req)
            .map_err(|e| reply_error(StatusCode::BAD_REQUEST, e.to_string()))
    }) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!("Notification received: message_type={}", request.message_type);

    match invoke(callbacks.notification.as_ref(), "notification", request).await {
        Ok(()) => reply::<()>(StatusCode::OK, "success", None),
        Err(response) => response,
    }
}

async fn handle_get_device_list(
    State(callbacks): State<SharedCallbacks>,
    query: Result<Query<DeviceListQuery>, QueryRejection>,
) -> Response {
    let request = match query_params(query).and_then(|q| {
        GetDeviceListRequest::try_from(q).map_err(bad_request)
    }) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(
        "Device list requested: service_identifier={}, page={}, page_size={}",
        request.service_identifier, request.page, request.page_size
    );

    match invoke(callbacks.device_list.as_ref(), "device list", request).await {
        Ok(data) => reply(StatusCode::OK, "success", Some(data)),
        Err(response) => response,
    }
}

async fn dispatch_device_config(
    callback: Option<&Callback<Device, ()>>,
    name: &str,
    body: Bytes,
) -> Response {
    let device = match json_body::<VersionedDevice>(&body) {
        Ok(versioned) => versioned.into_device(),
        Err(response) => return response,
    };
    if device.id.is_empty() {
        return reply_error(StatusCode::BAD_REQUEST, "missing required field: id");
    }

    info!("{} pushed: device_id={}", name, device.id);

    match invoke(callback, name, device).await {
        Ok(()) => reply::<()>(StatusCode::OK, "success", None),
        Err(response) => response,
    }
}

async fn handle_create_device(State(callbacks): State<SharedCallbacks>, body: Bytes) -> Response {
    dispatch_device_config(callbacks.create_device.as_ref(), "create device", body).await
}

async fn handle_update_device(State(callbacks): State<SharedCallbacks>, body: Bytes) -> Response {
    dispatch_device_config(callbacks.update_device.as_ref(), "update device", body).await
}

async fn handle_delete_device(State(callbacks): State<SharedCallbacks>, body: Bytes) -> Response {
    dispatch_device_config(callbacks.delete_device.as_ref(), "delete device", body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::json;
    use std::sync::Mutex;
    use tower::ServiceExt;
    use tp_shared::DeviceItem;

    async fn call(
        router: Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn configured_handler() -> Handler {
        let mut handler = Handler::new();
        handler
            .set_form_config_handler(|req| async move {
                Ok(json!({
                    "form_type": req.form_type,
                    "fields": [{"name": "host", "type": "string"}]
                }))
            })
            .set_device_disconnect_handler(|req| async move {
                if req.device_id == "broken" {
                    anyhow::bail!("device {} is busy", req.device_id);
                }
                Ok(())
            })
            .set_get_device_list_handler(|req| async move {
                Ok(DeviceListData {
                    list: vec![DeviceItem {
                        device_name: "设备1".to_string(),
                        description: req.voucher,
                        device_number: "DEV001".to_string(),
                    }],
                    total: req.page * req.page_size,
                })
            });
        handler
    }

    #[tokio::test]
    async fn test_form_config_success() {
        let router = configured_handler().router();
        let (status, body) = call(
            router,
            Method::GET,
            "/api/v1/form/config?protocol_type=modbus&device_type=1&form_type=CFG",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 200);
        assert_eq!(body["message"], "success");
        assert_eq!(body["data"]["form_type"], "CFG");
    }

    #[tokio::test]
    async fn test_form_config_rejects_post() {
        let router = configured_handler().router();
        let (status, body) = call(
            router,
            Method::POST,
            "/api/v1/form/config?protocol_type=modbus&device_type=1&form_type=CFG",
            Some(json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["code"], 405);
        assert_eq!(body["message"], "method not allowed");
    }

    #[tokio::test]
    async fn test_form_config_missing_params() {
        let router = configured_handler().router();
        let uri = "/api/v1/form/config?protocol_type=modbus";
        let (status, body) = call(router, Method::GET, uri, None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
        assert!(body["message"].as_str().unwrap().contains("form_type"));
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_legacy_form_config_routes() {
        for path in [FORM_CONFIG_V2_PATH, LEGACY_FORM_CONFIG_PATH] {
            let router = configured_handler().router();
            let uri = format!("{}?protocol_type=modbus&device_type=2&form_type=VCR", path);
            let (status, body) = call(router, Method::GET, &uri, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["form_type"], "VCR");
        }
    }

    #[tokio::test]
    async fn test_device_disconnect() {
        let handler = configured_handler();

        let (status, body) = call(
            handler.router(),
            Method::POST,
            DEVICE_DISCONNECT_PATH,
            Some(json!({"device_id": "device-001"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"code": 200, "message": "success"}));

        let (status, body) = call(
            handler.router(),
            Method::POST,
            DEVICE_DISCONNECT_PATH,
            Some(json!({"device_id": "broken"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "device broken is busy");

        let (status, _) =
            call(handler.router(), Method::POST, DEVICE_DISCONNECT_PATH, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(handler.router(), Method::GET, DEVICE_DISCONNECT_PATH, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let router = configured_handler().router();
        let request = Request::builder()
            .method(Method::POST)
            .uri(DEVICE_DISCONNECT_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "invalid request body");
    }

    #[tokio::test]
    async fn test_body_without_content_type() {
        let router = configured_handler().router();
        let request = Request::builder()
            .method(Method::POST)
            .uri(DEVICE_DISCONNECT_PATH)
            .body(Body::from(r#"{"device_id":"device-001"}"#))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unset_handler_responds_500() {
        let router = Handler::new().router();
        let (status, body) = call(
            router,
            Method::POST,
            NOTIFICATION_PATH,
            Some(json!({"message_type": "1", "message": "config changed"})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "handler not configured");
    }

    #[tokio::test]
    async fn test_notification_routes_share_callback() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let mut handler = Handler::new();
        let sink = received.clone();
        handler.set_notification_handler(move |req| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(req.message_type);
                Ok(())
            }
        });

        for path in [NOTIFICATION_PATH, NOTIFY_EVENT_PATH] {
            let body = json!({"message_type": "1"});
            let (status, _) = call(handler.router(), Method::POST, path, Some(body)).await;
            assert_eq!(status, StatusCode::OK);
        }
        let body = json!({"message": "x"});
        let (status, _) = call(handler.router(), Method::POST, NOTIFICATION_PATH, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(*received.lock().unwrap(), vec!["1".to_string(), "1".to_string()]);
    }

    #[tokio::test]
    async fn test_get_device_list() {
        let handler = configured_handler();

        let (status, body) = call(
            handler.router(),
            Method::GET,
            "/api/v1/plugin/device/list?voucher=v1&service_identifier=svc&page_size=10&page=2",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 20);
        assert_eq!(body["data"]["list"][0]["device_number"], "DEV001");
        assert_eq!(body["data"]["list"][0]["description"], "v1");

        let (status, body) = call(
            handler.router(),
            Method::GET,
            "/api/v1/plugin/device/list?voucher=v1&service_identifier=svc&page_size=x&page=2",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "invalid page_size");

        let (status, _) = call(
            handler.router(),
            Method::GET,
            "/api/v1/plugin/device/list?voucher=v1",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_legacy_device_config_push() {
        let received = Arc::new(Mutex::new(Vec::<Device>::new()));
        let mut handler = Handler::new();
        let sink = received.clone();
        handler.set_create_device_handler(move |device| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(device);
                Ok(())
            }
        });

        let (status, _) = call(
            handler.router(),
            Method::POST,
            DEVICE_CONFIG_ADD_PATH,
            Some(json!({"Id": "d9", "AccessToken": "tok", "DeviceType": "1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(
            handler.router(),
            Method::POST,
            DEVICE_CONFIG_DELETE_PATH,
            Some(json!({"id": "d9"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "handler not configured");

        let devices = received.lock().unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, "d9");
        assert_eq!(devices[0].voucher, "tok");
    }

    #[tokio::test]
    async fn test_panicking_callback_becomes_500() {
        let mut handler = Handler::new();
        handler.set_device_disconnect_handler(|req| async move {
            if req.device_id == "d1" {
                panic!("callback exploded");
            }
            Ok(())
        });

        let (status, body) = call(
            handler.router(),
            Method::POST,
            DEVICE_DISCONNECT_PATH,
            Some(json!({"device_id": "d1"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "callback panicked");
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let router = configured_handler().router();
        let (status, body) = call(router, Method::GET, "/api/v1/unknown", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 404);
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handler = configured_handler();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            handler
                .serve_with_shutdown(listener, async {
                    let _ = rx.await;
                })
                .await
        });

        let body: Value = reqwest::Client::new()
            .get(format!(
                "http://{}{}?protocol_type=modbus&device_type=1&form_type=CFG",
                addr, FORM_CONFIG_PATH
            ))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["code"], 200);

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
