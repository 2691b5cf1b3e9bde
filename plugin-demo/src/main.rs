use anyhow::Result;
use serde_json::json;
use std::time::Duration;
use tp_protocol_sdk::api::HeartbeatRequest;
use tp_protocol_sdk::{Handler, TpClient};
use tp_shared::{load_config, DeviceItem, DeviceListData, QoS, STATUS_OFFLINE};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志，默认 info，可通过 RUST_LOG 覆盖
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // 加载配置
    let config = load_config()?;
    info!("Configuration loaded successfully");

    let client = TpClient::new(config.client.clone())?;

    // 后台连接 MQTT，连接成功后订阅插件主题
    let mqtt_client = client.clone();
    tokio::spawn(async move {
        match mqtt_client.connect().await {
            Ok(()) => {
                let subscribed = mqtt_client
                    .mqtt()
                    .subscribe("plugin/example/+", QoS::AtLeastOnce, |topic, payload| {
                        let payload = String::from_utf8_lossy(payload);
                        info!("Received message: topic={}, payload={}", topic, payload);
                    })
                    .await;
                if let Err(e) = subscribed {
                    warn!("Failed to subscribe plugin topic: {}", e);
                }
            }
            Err(e) => error!("Failed to connect MQTT: {}", e),
        }
    });

    // 定时发送心跳
    let heartbeat_client = client.clone();
    let service_identifier = config.service_identifier.clone();
    let interval = Duration::from_secs(config.heartbeat_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let request = HeartbeatRequest {
                service_identifier: service_identifier.clone(),
            };
            if let Err(e) = heartbeat_client.service().send_heartbeat(&request).await {
                warn!("Heartbeat failed: {}", e);
            }
        }
    });

    let handler = build_handler(client.clone());

    let listener = tokio::net::TcpListener::bind(config.server.addr()).await?;
    handler
        .serve_with_shutdown(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        })
        .await?;

    client.close().await;
    Ok(())
}

fn build_handler(client: TpClient) -> Handler {
    let mut handler = Handler::new();

    handler
        .set_form_config_handler(|req| async move {
            info!("Form config requested: form_type={}", req.form_type);
            // 示例表单，实际插件按 protocol_type / form_type 返回不同表单
            let form = match req.form_type.as_str() {
                "CFG" => json!([
                    {"dataKey": "host", "label": "服务器地址", "type": "input", "validate": {"required": true}},
                    {"dataKey": "port", "label": "端口", "type": "input", "validate": {"type": "number"}}
                ]),
                "VCR" => json!([
                    {"dataKey": "username", "label": "用户名", "type": "input"},
                    {"dataKey": "password", "label": "密码", "type": "input"}
                ]),
                _ => json!([]),
            };
            Ok(form)
        })
        .set_device_disconnect_handler(move |req| {
            let client = client.clone();
            async move {
                info!("Disconnecting device: {}", req.device_id);
                if client.mqtt().is_connected() {
                    client.mqtt().send_status(&req.device_id, STATUS_OFFLINE).await?;
                }
                Ok(())
            }
        })
        .set_notification_handler(|req| async move {
            info!(
                "Notification received: message_type={}, message={}",
                req.message_type,
                req.message.unwrap_or_default()
            );
            Ok(())
        })
        .set_get_device_list_handler(|req| async move {
            let list: Vec<DeviceItem> = (1..=3)
                .map(|i| DeviceItem {
                    device_name: format!("示例设备{}", i),
                    description: format!("voucher {}", req.voucher),
                    device_number: format!("DEV{:03}", i),
                })
                .collect();
            Ok(DeviceListData {
                total: list.len() as i64,
                list,
            })
        })
        .set_create_device_handler(|device| async move {
            info!("Device created: id={}, sub_devices={}", device.id, device.sub_devices().len());
            Ok(())
        })
        .set_update_device_handler(|device| async move {
            info!("Device updated: id={}", device.id);
            Ok(())
        })
        .set_delete_device_handler(|device| async move {
            info!("Device deleted: id={}", device.id);
            Ok(())
        });

    handler
}
