use anyhow::Result;
use config::{Config, Environment, File};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

// SDK 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_timeout_secs: u64,
    pub mqtt: MqttConfig,
}

impl ClientConfig {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9999".to_string(),
            api_timeout_secs: 30,
            mqtt: MqttConfig::default(),
        }
    }
}

// MQTT 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// mqtt://host:port、tcp://host:port 或 host:port
    pub broker: String,
    /// 为空时自动生成
    pub client_id: String,
    pub username: String,
    pub password: String,
    pub keep_alive_secs: u64,
    pub connect_retries: u32,
    pub retry_delay_ms: u64,
    pub connect_timeout_secs: u64,
}

impl MqttConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: "mqtt://127.0.0.1:1883".to_string(),
            client_id: String::new(),
            username: String::new(),
            password: String::new(),
            keep_alive_secs: 30,
            connect_retries: 100,
            retry_delay_ms: 6000,
            connect_timeout_secs: 30,
        }
    }
}

// 回调服务监听配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

// 协议插件整体配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub client: ClientConfig,
    pub server: ServerConfig,
    pub service_identifier: String,
    pub heartbeat_interval_secs: u64,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            server: ServerConfig::default(),
            service_identifier: "tp-plugin".to_string(),
            heartbeat_interval_secs: 30,
        }
    }
}

pub fn load_config() -> Result<PluginConfig> {
    // 加载 .env 文件
    dotenv().ok();

    let env_name = env::var("ENV").unwrap_or_else(|_| "development".to_string());

    let settings = Config::builder()
        // 添加默认配置文件
        .add_source(File::with_name("config/default").required(false))
        // 添加环境特定配置文件
        .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
        // 添加环境变量，使用 TP__ 前缀，例如 TP__CLIENT__MQTT__BROKER
        .add_source(Environment::with_prefix("TP").prefix_separator("__").separator("__"))
        .build()?;

    let config: PluginConfig = settings.try_deserialize()?;

    // 验证必要配置
    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &PluginConfig) -> Result<()> {
    if config.client.base_url.is_empty() {
        return Err(anyhow::anyhow!("Platform base URL cannot be empty"));
    }

    if config.client.mqtt.broker.is_empty() {
        return Err(anyhow::anyhow!("MQTT broker cannot be empty"));
    }

    if config.client.mqtt.connect_retries == 0 {
        return Err(anyhow::anyhow!("MQTT connect retries must be at least 1"));
    }

    if config.service_identifier.is_empty() {
        return Err(anyhow::anyhow!("Service identifier cannot be empty"));
    }

    Ok(())
}
