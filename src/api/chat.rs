//! Chat resource: `/ai/chat/`.

use async_trait::async_trait;

use super::ApiClient;
use crate::error::{Resource, Result};
use crate::models::{ChatRequest, ChatResponse};

/// Remote assistant.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send the conversation and wait for the assistant's reply.
    async fn send(&self, request: ChatRequest) -> Result<ChatResponse>;
}

/// HTTP implementation of [`ChatService`].
#[derive(Debug, Clone)]
pub struct ChatApi {
    client: ApiClient,
}

impl ChatApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatService for ChatApi {
    async fn send(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.client
            .post_json(Resource::Chat, "/ai/chat/", &request)
            .await
    }
}
