//! WebSocket Echo
//!
//! A long-lived connection where every inbound text message is a repeated
//! admission check. Allowed messages are echoed back; denied ones get a JSON
//! error frame and the connection stays open.

use std::net::SocketAddr;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::{HeaderMap, Uri},
    response::Response,
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::ratelimit::{CallerContext, RateLimiter, Verdict};

/// Sub-context used when a message carries no `type` field.
pub const DEFAULT_SUB_CONTEXT: &str = "message";

/// Handler for GET /api/v1/ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(limiter): State<RateLimiter>,
    headers: HeaderMap,
    uri: Uri,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Response {
    let ctx = CallerContext::new(uri.path())
        .with_headers(&headers)
        .with_client_addr(connect_info.map(|ConnectInfo(addr)| addr.ip()));

    ws.on_upgrade(move |socket| run_socket(socket, limiter, ctx))
}

async fn run_socket(mut socket: WebSocket, limiter: RateLimiter, ctx: CallerContext) {
    info!("WebSocket connected: client={}", ctx.client_host());

    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(err) => {
                warn!("WebSocket receive failed: client={}, {}", ctx.client_host(), err);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                let reply = reply_to(&limiter, &ctx, &text);
                if socket.send(Message::Text(reply)).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!("WebSocket disconnected: client={}", ctx.client_host());
}

/// The frame sent back for one inbound text message.
pub fn reply_to(limiter: &RateLimiter, ctx: &CallerContext, text: &str) -> String {
    match limiter.check_message(ctx, &sub_context(text)) {
        Ok(Verdict::Allowed) => text.to_string(),
        Ok(Verdict::Denied(rejection)) => rejection.to_json().to_string(),
        Err(err) => {
            error!("WebSocket rate limit check failed: {}", err);
            json!({ "error": "Internal server error" }).to_string()
        }
    }
}

/// The `type` field of a JSON object message, else [`DEFAULT_SUB_CONTEXT`].
pub fn sub_context(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|value| value.get("type").and_then(Value::as_str).map(str::to_string))
        .filter(|kind| !kind.is_empty())
        .unwrap_or_else(|| DEFAULT_SUB_CONTEXT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{AdmissionConfig, AdmissionSettings};
    use crate::cache::{CacheStore, EvictionPolicy};
    use crate::ratelimit::RateLimitRule;
    use std::sync::Arc;

    fn limiter(times: u32) -> (RateLimiter, Arc<AdmissionConfig>) {
        let store = Arc::new(CacheStore::new(100, EvictionPolicy::CapacityOnly).unwrap());
        let admission = Arc::new(AdmissionConfig::new());
        admission.init(AdmissionSettings::default());
        let limiter = RateLimiter::new(
            RateLimitRule::new(times).minutes(1),
            store,
            admission.clone(),
        );
        (limiter, admission)
    }

    #[test]
    fn test_sub_context() {
        assert_eq!(sub_context("hello"), "message");
        assert_eq!(sub_context(r#"{"type": "chat", "body": "hi"}"#), "chat");
        assert_eq!(sub_context(r#"{"type": 3}"#), "message");
        assert_eq!(sub_context(r#"{"type": ""}"#), "message");
        assert_eq!(sub_context("[1, 2]"), "message");
    }

    #[test]
    fn test_reply_echoes_until_limited() {
        let (limiter, _admission) = limiter(2);
        let ctx = CallerContext::new("/api/v1/ws");

        assert_eq!(reply_to(&limiter, &ctx, "one"), "one");
        assert_eq!(reply_to(&limiter, &ctx, "two"), "two");

        let denied: Value = serde_json::from_str(&reply_to(&limiter, &ctx, "three")).unwrap();
        assert_eq!(denied["error"], "Too Many Requests");
        assert_eq!(denied["retry_after"], 60);
    }

    #[test]
    fn test_reply_counts_message_types_separately() {
        let (limiter, _admission) = limiter(1);
        let ctx = CallerContext::new("/api/v1/ws");
        let chat = r#"{"type": "chat"}"#;
        let ping = r#"{"type": "ping"}"#;

        assert_eq!(reply_to(&limiter, &ctx, chat), chat);
        assert_eq!(reply_to(&limiter, &ctx, ping), ping);
        assert_ne!(reply_to(&limiter, &ctx, chat), chat);
    }

    #[test]
    fn test_reply_after_close_is_error_frame() {
        let (limiter, admission) = limiter(5);
        let ctx = CallerContext::new("/api/v1/ws");
        admission.close();

        let reply: Value = serde_json::from_str(&reply_to(&limiter, &ctx, "hi")).unwrap();
        assert_eq!(reply["error"], "Internal server error");
    }
}
