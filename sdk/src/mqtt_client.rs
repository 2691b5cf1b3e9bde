use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS as RumqttQoS, SubscribeFilter,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tp_shared::{
    generate_client_id, topic_matches, MqttConfig, QoS, StatusPayload, DEVICE_STATUS_TOPIC,
};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::MqttError;

const DEFAULT_MQTT_PORT: u16 = 1883;
const REQUEST_CHANNEL_CAPACITY: usize = 10;
const DISCONNECT_QUIESCE: Duration = Duration::from_millis(250);

/// 收到消息时的回调，参数为主题和原始负载
pub type MessageHandler = Arc<dyn Fn(&str, &[u8]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Clone)]
struct Subscription {
    qos: QoS,
    handler: MessageHandler,
}

type Subscriptions = Arc<RwLock<HashMap<String, Subscription>>>;

// 一次成功连接对应的客户端句柄和事件循环任务
struct Session {
    client: AsyncClient,
    event_task: JoinHandle<()>,
}

// MQTT客户端封装
pub struct MqttClient {
    config: MqttConfig,
    client_id: String,
    host: String,
    port: u16,
    state: Arc<watch::Sender<ConnectionState>>,
    session: Mutex<Option<Session>>,
    subscriptions: Subscriptions,
}

impl fmt::Debug for MqttClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttClient")
            .field("client_id", &self.client_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state())
            .finish()
    }
}

fn to_rumqtt_qos(qos: QoS) -> RumqttQoS {
    match qos {
        QoS::AtMostOnce => RumqttQoS::AtMostOnce,
        QoS::AtLeastOnce => RumqttQoS::AtLeastOnce,
        QoS::ExactlyOnce => RumqttQoS::ExactlyOnce,
    }
}

/// 解析 broker 地址，支持 mqtt://host:port、tcp://host:port、host:port 和 host
pub fn parse_broker(broker: &str) -> Result<(String, u16), MqttError> {
    let invalid = |reason: &str| MqttError::InvalidBroker {
        broker: broker.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = broker.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty address"));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("mqtt://{}", trimmed)
    };

    let url = Url::parse(&with_scheme).map_err(|e| invalid(&e.to_string()))?;
    match url.scheme() {
        "mqtt" | "tcp" => {}
        other => return Err(invalid(&format!("unsupported scheme {}", other))),
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("missing host"))?;

    Ok((host.to_string(), url.port().unwrap_or(DEFAULT_MQTT_PORT)))
}

impl MqttClient {
    pub fn new(config: MqttConfig) -> Result<Self, MqttError> {
        let (host, port) = parse_broker(&config.broker)?;
        let client_id = if config.client_id.is_empty() {
            generate_client_id()
        } else {
            config.client_id.clone()
        };

        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Ok(Self {
            config,
            client_id,
            host,
            port,
            state: Arc::new(state),
            session: Mutex::new(None),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    // 检查连接状态
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// 订阅连接状态变化
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    fn mqtt_options(&self) -> MqttOptions {
        let mut mqtt_options =
            MqttOptions::new(self.client_id.clone(), self.host.clone(), self.port);

        // 设置认证信息
        if !self.config.username.is_empty() {
            mqtt_options
                .set_credentials(self.config.username.clone(), self.config.password.clone());
        }

        // 设置保持连接
        mqtt_options.set_keep_alive(self.config.keep_alive());
        mqtt_options.set_clean_session(true);
        mqtt_options
    }

    /// 连接到MQTT服务器，失败时按配置的次数和间隔重试
    pub async fn connect(&self) -> Result<(), MqttError> {
        let mut session = self.session.lock().await;
        if session.is_some() && self.is_connected() {
            return Ok(());
        }
        // 上一次的事件循环已经失效
        if let Some(stale) = session.take() {
            stale.event_task.abort();
        }

        info!(
            "Connecting to MQTT broker: {}:{}, client_id={}",
            self.host, self.port, self.client_id
        );
        self.state.send_replace(ConnectionState::Connecting);

        let (client, mut event_loop) =
            AsyncClient::new(self.mqtt_options(), REQUEST_CHANNEL_CAPACITY);
        let attempts = self.config.connect_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.try_connect(&mut event_loop).await {
                Ok(()) => {
                    info!("MQTT connection established after {} attempt(s)", attempt);
                    self.state.send_replace(ConnectionState::Connected);

                    let event_task = tokio::spawn(run_event_loop(
                        event_loop,
                        client.clone(),
                        self.state.clone(),
                        self.subscriptions.clone(),
                        self.config.retry_delay(),
                    ));
                    // CONNACK 已被 try_connect 消费，这里补做一次重新订阅
                    resubscribe(client.clone(), self.subscriptions.clone()).await;
                    *session = Some(Session { client, event_task });
                    return Ok(());
                }
                Err(e) => {
                    warn!("MQTT connect attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e;
                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry_delay()).await;
                    }
                }
            }
        }

        self.state.send_replace(ConnectionState::Disconnected);
        error!("Giving up on MQTT broker after {} attempts", attempts);
        Err(MqttError::RetriesExhausted { attempts, last_error })
    }

    // 单次连接尝试：轮询事件循环直到收到 CONNACK
    async fn try_connect(&self, event_loop: &mut EventLoop) -> Result<(), String> {
        let wait_for_connack = async {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
                    Ok(event) => debug!("MQTT event before CONNACK: {:?}", event),
                    Err(e) => return Err(e.to_string()),
                }
            }
        };

        match tokio::time::timeout(self.config.connect_timeout(), wait_for_connack).await {
            Ok(result) => result,
            Err(_) => Err(format!(
                "timed out after {:?} waiting for CONNACK",
                self.config.connect_timeout()
            )),
        }
    }

    async fn connected_client(&self) -> Result<AsyncClient, MqttError> {
        if !self.is_connected() {
            return Err(MqttError::NotConnected);
        }
        let session = self.session.lock().await;
        session
            .as_ref()
            .map(|s| s.client.clone())
            .ok_or(MqttError::NotConnected)
    }

    // 发布消息
    pub async fn publish(
        &self,
        topic: &str,
        qos: QoS,
        payload: impl Into<Vec<u8>>,
    ) -> Result<(), MqttError> {
        let client = self.connected_client().await?;

        debug!("Publishing MQTT message: topic={}, qos={:?}", topic, qos);
        client
            .publish(topic, to_rumqtt_qos(qos), false, payload)
            .await
            .map_err(|e| {
                error!("Failed to publish MQTT message to {}: {}", topic, e);
                MqttError::Client(e)
            })?;

        debug!("Published MQTT message to topic: {}", topic);
        Ok(())
    }

    // 订阅主题，收到的消息交给 handler 处理
    pub async fn subscribe<F>(&self, topic: &str, qos: QoS, handler: F) -> Result<(), MqttError>
    where
        F: Fn(&str, &[u8]) + Send + Sync + 'static,
    {
        let client = self.connected_client().await?;

        client
            .subscribe(topic, to_rumqtt_qos(qos))
            .await
            .map_err(|e| {
                error!("Failed to subscribe to {}: {}", topic, e);
                MqttError::Client(e)
            })?;

        self.subscriptions.write().await.insert(
            topic.to_string(),
            Subscription {
                qos,
                handler: Arc::new(handler),
            },
        );

        info!("Subscribed to MQTT topic: {}", topic);
        Ok(())
    }

    // 取消订阅
    pub async fn unsubscribe(&self, topic: &str) -> Result<(), MqttError> {
        let client = self.connected_client().await?;

        client.unsubscribe(topic).await?;
        self.subscriptions.write().await.remove(topic);

        info!("Unsubscribed from MQTT topic: {}", topic);
        Ok(())
    }

    /// 发送设备在线/离线消息，status 只能是 "1"（在线）或 "0"（离线）
    pub async fn send_status(&self, access_token: &str, status: &str) -> Result<(), MqttError> {
        let payload = StatusPayload::new(access_token, status)?;
        let body = serde_json::to_vec(&payload)?;

        self.publish(DEVICE_STATUS_TOPIC, QoS::AtLeastOnce, body).await?;
        info!(
            "Device status sent: online={}, topic={}",
            payload.is_online(),
            DEVICE_STATUS_TOPIC
        );
        Ok(())
    }

    // 断开MQTT连接
    pub async fn disconnect(&self) {
        let Some(session) = self.session.lock().await.take() else {
            self.state.send_replace(ConnectionState::Disconnected);
            return;
        };

        info!("Disconnecting from MQTT broker");
        if self.is_connected() {
            if let Err(e) = session.client.disconnect().await {
                warn!("Failed to send MQTT DISCONNECT: {}", e);
            }
        }

        let mut event_task = session.event_task;
        if tokio::time::timeout(DISCONNECT_QUIESCE, &mut event_task).await.is_err() {
            event_task.abort();
        }

        self.state.send_replace(ConnectionState::Disconnected);
        info!("MQTT connection closed");
    }
}

// 事件循环：分发消息，断线后由 rumqttc 在下一次 poll 时重连
async fn run_event_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    state: Arc<watch::Sender<ConnectionState>>,
    subscriptions: Subscriptions,
    reconnect_delay: Duration,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                debug!("Received MQTT message on topic: {}", publish.topic);
                dispatch_message(&subscriptions, &publish.topic, &publish.payload).await;
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("MQTT connection re-established");
                state.send_replace(ConnectionState::Connected);
                // 请求通道只能由本循环腾出空位，订阅请求放到单独的任务里发送
                tokio::spawn(resubscribe(client.clone(), subscriptions.clone()));
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("MQTT DISCONNECT sent, stopping event loop");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                if *state.borrow() == ConnectionState::Connected {
                    warn!("MQTT connection lost: {}", e);
                } else {
                    debug!("MQTT reconnect failed: {}", e);
                }
                state.send_replace(ConnectionState::Disconnected);
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }
}

async fn dispatch_message(subscriptions: &Subscriptions, topic: &str, payload: &[u8]) {
    let handlers: Vec<MessageHandler> = subscriptions
        .read()
        .await
        .iter()
        .filter(|(filter, _)| topic_matches(filter, topic))
        .map(|(_, sub)| sub.handler.clone())
        .collect();

    if handlers.is_empty() {
        debug!("No handler for MQTT topic: {}", topic);
    }
    for handler in handlers {
        handler(topic, payload);
    }
}

// clean session 重连后需要重新订阅，所有主题合并为一个 SUBSCRIBE
async fn resubscribe(client: AsyncClient, subscriptions: Subscriptions) {
    let filters: Vec<SubscribeFilter> = subscriptions
        .read()
        .await
        .iter()
        .map(|(topic, sub)| SubscribeFilter::new(topic.clone(), to_rumqtt_qos(sub.qos)))
        .collect();

    if filters.is_empty() {
        return;
    }

    let count = filters.len();
    match client.subscribe_many(filters).await {
        Ok(()) => info!("Resubscribed to {} MQTT topic(s)", count),
        Err(e) => error!("Failed to resubscribe MQTT topics: {}", e),
    }
}
