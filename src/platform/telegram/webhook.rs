use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tracing::{error, info};

use crate::config::WebhookConfig;
use crate::error::Result;
use crate::platform::telegram::engine::TelegramEngine;

/// Router accepting Telegram updates on `POST {path}`
pub fn router(engine: Arc<TelegramEngine>, path: &str) -> Router {
    Router::new()
        .route(path, post(receive_update))
        .with_state(engine)
}

/// Always acknowledges: a non-2xx answer makes Telegram redeliver the update
async fn receive_update(
    State(engine): State<Arc<TelegramEngine>>,
    Json(update): Json<Value>,
) -> StatusCode {
    if let Err(e) = engine.message_handler(&update).await {
        error!("Failed to handle webhook update: {}", e);
    }
    StatusCode::OK
}

/// Serve the webhook endpoint until the listener fails
pub async fn serve(engine: Arc<TelegramEngine>, config: &WebhookConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("Webhook listening on http://{}{}", config.listen, config.path);

    axum::serve(listener, router(engine, &config.path)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::telegram::api::TelegramApi;
    use crate::platform::telegram::engine::Responder;
    use crate::platform::Message;
    use async_trait::async_trait;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Echo;

    #[async_trait]
    impl Responder for Echo {
        async fn respond(&self, message: &Message) -> Option<String> {
            Some(message.text.clone())
        }
    }

    async fn spawn_webhook(engine: TelegramEngine) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Arc::new(engine), "/telegram");
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/telegram", addr)
    }

    #[tokio::test]
    async fn test_webhook_update_is_answered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bottoken/sendMessage"))
            .and(body_json(json!({"chat_id": 7, "text": "hi there"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let engine = TelegramEngine::with_api(TelegramApi::with_base_url("token", server.uri()))
            .with_responder(Arc::new(Echo));
        let url = spawn_webhook(engine).await;

        let response = reqwest::Client::new()
            .post(&url)
            .json(&json!({
                "update_id": 10,
                "message": {
                    "message_id": 3,
                    "from": {"id": 7, "first_name": "Andrew"},
                    "chat": {"id": 7, "type": "private"},
                    "date": 1506805222,
                    "text": "hi there"
                }
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_webhook_acknowledges_malformed_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bottoken/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(0)
            .mount(&server)
            .await;

        let engine = TelegramEngine::with_api(TelegramApi::with_base_url("token", server.uri()))
            .with_responder(Arc::new(Echo));
        let url = spawn_webhook(engine).await;

        let response = reqwest::Client::new()
            .post(&url)
            .json(&json!({"update_id": 11, "message": {"text": "no sender"}}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }
}
