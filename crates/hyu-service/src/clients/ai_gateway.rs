//! HTTP client for the external AI service.

use async_trait::async_trait;
use hyu_config::AiConfig;
use hyu_core::{HyuError, HyuResult, Interface};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use shaku::Component;
use tracing::{debug, warn};

const SERVICE: &str = "ai";
const API_KEY_HEADER: &str = "X-API-Key";

/// Outbound calls to the AI service. Responses are passed through as JSON.
#[async_trait]
pub trait AiGateway: Interface + Send + Sync {
    /// `POST {base}/v1/chat`.
    async fn chat(&self, message: String, session_id: Option<String>, user_id: i64) -> HyuResult<Value>;

    /// `POST {base}/v1/analyze`.
    async fn analyze(&self, text: String, session_id: Option<String>, user_id: i64) -> HyuResult<Value>;
}

#[derive(Debug, Serialize)]
struct ChatBody {
    message: String,
    session_id: Option<String>,
    user_id: i64,
}

#[derive(Debug, Serialize)]
struct AnalyzeBody {
    text: String,
    session_id: Option<String>,
    user_id: i64,
}

/// `reqwest` implementation of [`AiGateway`].
#[derive(Component)]
#[shaku(interface = AiGateway)]
pub struct HttpAiGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpAiGateway {
    /// # Errors
    ///
    /// `Configuration` when the HTTP client cannot be built.
    pub fn new(config: &AiConfig) -> HyuResult<Self> {
        let params = Self::parameters(config)?;
        Ok(Self {
            client: params.client,
            base_url: params.base_url,
            api_key: params.api_key,
        })
    }

    /// Shaku parameters equivalent to [`HttpAiGateway::new`].
    ///
    /// # Errors
    ///
    /// `Configuration` when the HTTP client cannot be built.
    pub fn parameters(config: &AiConfig) -> HyuResult<HttpAiGatewayParameters> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| HyuError::Configuration(format!("Failed to create AI HTTP client: {e}")))?;
        Ok(HttpAiGatewayParameters {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> HyuResult<Value> {
        let url = self.url(path);
        debug!("AI request: POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("AI request to {} failed: {}", url, e);
                HyuError::external(SERVICE, e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("AI service answered {} for {}: {}", status, url, text);
            return Err(HyuError::external(SERVICE, format!("upstream status {status}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| HyuError::external(SERVICE, format!("invalid upstream body: {e}")))
    }
}

impl std::fmt::Debug for HttpAiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAiGateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AiGateway for HttpAiGateway {
    async fn chat(&self, message: String, session_id: Option<String>, user_id: i64) -> HyuResult<Value> {
        let body = ChatBody {
            message,
            session_id,
            user_id,
        };
        self.post("/v1/chat", &body).await
    }

    async fn analyze(&self, text: String, session_id: Option<String>, user_id: i64) -> HyuResult<Value> {
        let body = AnalyzeBody {
            text,
            session_id,
            user_id,
        };
        self.post("/v1/analyze", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> HttpAiGateway {
        HttpAiGateway::new(&AiConfig {
            base_url: format!("{}/", server.uri()),
            api_key: "secret-key".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_chat_forwards_body_and_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .and(header("X-API-Key", "secret-key"))
            .and(body_json(json!({"message": "hi", "session_id": "s-1", "user_id": 7})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "hello"})))
            .expect(1)
            .mount(&server)
            .await;

        let value = gateway(&server)
            .chat("hi".to_string(), Some("s-1".to_string()), 7)
            .await
            .unwrap();
        assert_eq!(value["reply"], "hello");
    }

    #[tokio::test]
    async fn test_analyze_posts_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/analyze"))
            .and(body_json(json!({"text": "tired", "session_id": null, "user_id": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"level": "mild"})))
            .mount(&server)
            .await;

        let value = gateway(&server).analyze("tired".to_string(), None, 3).await.unwrap();
        assert_eq!(value["level"], "mild");
    }

    #[tokio::test]
    async fn test_upstream_error_is_external() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = gateway(&server).chat("hi".to_string(), None, 1).await.unwrap_err();
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.error_code(), "EXTERNAL_SERVICE_ERROR");
    }
}
