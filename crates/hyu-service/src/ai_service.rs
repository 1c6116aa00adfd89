//! Smoke-test passthrough to the external AI service.

use crate::clients::AiGateway;
use crate::dto::{AnalyzeSmokeRequest, ChatSmokeRequest};
use async_trait::async_trait;
use hyu_core::{HyuResult, Interface, ValidateExt};
use serde_json::Value;
use shaku::Component;
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait AiProxyService: Interface + Send + Sync {
    /// Forwards a chat message and returns the upstream JSON untouched.
    async fn chat_smoke(&self, user_id: i64, request: ChatSmokeRequest) -> HyuResult<Value>;

    /// Forwards a text for analysis and returns the upstream JSON untouched.
    async fn analyze_smoke(&self, user_id: i64, request: AnalyzeSmokeRequest) -> HyuResult<Value>;
}

#[derive(Component)]
#[shaku(interface = AiProxyService)]
pub struct AiProxyServiceImpl {
    #[shaku(inject)]
    gateway: Arc<dyn AiGateway>,
}

impl AiProxyServiceImpl {
    pub fn new(gateway: Arc<dyn AiGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl AiProxyService for AiProxyServiceImpl {
    async fn chat_smoke(&self, user_id: i64, request: ChatSmokeRequest) -> HyuResult<Value> {
        request.validate_request()?;
        debug!("AI chat smoke for user {}", user_id);
        self.gateway.chat(request.message, request.session_id, user_id).await
    }

    async fn analyze_smoke(&self, user_id: i64, request: AnalyzeSmokeRequest) -> HyuResult<Value> {
        request.validate_request()?;
        debug!("AI analyze smoke for user {}", user_id);
        self.gateway.analyze(request.text, request.session_id, user_id).await
    }
}

impl std::fmt::Debug for AiProxyServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiProxyServiceImpl").finish_non_exhaustive()
    }
}
