//! Chat screen state.

use std::fmt;
use std::sync::Arc;

use super::Busy;
use crate::api::ChatService;
use crate::error::Result;
use crate::models::{ChatMessage, ChatRequest};
use crate::reactive::Signal;

/// Conversation with the assistant.
///
/// Messages are append-only until [`ChatStore::clear`]; nothing is persisted.
pub struct ChatStore {
    service: Arc<dyn ChatService>,
    messages: Signal<Vec<ChatMessage>>,
    draft: Signal<String>,
    loading: Signal<bool>,
    error: Signal<Option<String>>,
}

impl ChatStore {
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self {
            service,
            messages: Signal::default(),
            draft: Signal::default(),
            loading: Signal::new(false),
            error: Signal::new(None),
        }
    }

    pub fn messages(&self) -> &Signal<Vec<ChatMessage>> {
        &self.messages
    }

    /// Text currently in the input box.
    pub fn draft(&self) -> &Signal<String> {
        &self.draft
    }

    pub fn loading(&self) -> &Signal<bool> {
        &self.loading
    }

    pub fn error(&self) -> &Signal<Option<String>> {
        &self.error
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.draft.set(text.into());
    }

    pub fn has_messages(&self) -> bool {
        self.messages.with(|messages| !messages.is_empty())
    }

    pub fn can_send(&self) -> bool {
        !self.loading.get() && self.draft.with(|draft| !draft.trim().is_empty())
    }

    /// Send the draft along with the whole conversation so far.
    ///
    /// Returns `None` when there was nothing to send.
    pub async fn send(&self) -> Option<Result<ChatMessage>> {
        if !self.can_send() {
            return None;
        }

        let user = ChatMessage::user(self.draft.with(|draft| draft.trim().to_string()));
        self.messages.update(|messages| messages.push(user));
        self.draft.set(String::new());
        let _busy = Busy::raise(&self.loading);
        self.error.set(None);

        let request = ChatRequest {
            messages: self.messages.get(),
            stream: false,
        };
        let result = self.service.send(request).await;

        let outcome = match result {
            Ok(response) => {
                tracing::debug!(name: "chat.reply.ok", chars = response.content.len(), "assistant replied");
                let reply = ChatMessage::assistant(response.content);
                self.messages.update(|messages| messages.push(reply.clone()));
                Ok(reply)
            }
            Err(err) => {
                tracing::error!(name: "chat.reply.failed", error = %err, status = ?err.status, "Error sending chat message");
                self.error.set(Some(err.message.clone()));
                Err(err)
            }
        };
        Some(outcome)
    }

    /// Forget the conversation.
    pub fn clear(&self) {
        self.messages.set(Vec::new());
        self.error.set(None);
    }
}

impl fmt::Debug for ChatStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatStore")
            .field("messages", &self.messages)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
