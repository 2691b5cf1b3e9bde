use uuid::Uuid;

// UUID 生成工具函数
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

// MQTT 客户端ID
pub fn generate_client_id() -> String {
    format!("tp-plugin-{}", generate_uuid())
}

// 字符串工具函数，用于日志中截断过长的请求/响应体
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let mut end = max_len.saturating_sub(3);
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

// URL 拼接，避免出现双斜杠
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
