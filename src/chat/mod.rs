//! The floating deployment assistant.

mod client;
pub mod render;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use uuid::Uuid;

use crate::notify::{Notification, Notifier};

pub use client::{
    APP_TITLE, ChatError, ChatOptions, CompletionApi, CompletionMessage, CompletionRole,
    DEFAULT_CHAT_API_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, OpenRouterClient,
    SYSTEM_PROMPT,
};

#[cfg(test)]
pub use client::MockCompletionApi;

pub const GREETING: &str = "Hi there! I'm your AI deployment assistant. How can I help you today?";
pub const FALLBACK_REPLY: &str = "I'm sorry, I'm having trouble connecting to my knowledge base right now. Please try again in a moment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    fn to_completion(&self) -> CompletionMessage {
        let role = match self.role {
            Role::User => CompletionRole::User,
            Role::Assistant => CompletionRole::Assistant,
        };
        CompletionMessage::new(role, self.content.clone())
    }
}

/// Conversation state. At most one completion request is in flight; sends
/// made meanwhile are ignored.
pub struct ChatAssistant {
    messages: Vec<ChatMessage>,
    greeting_id: Uuid,
    pending: bool,
}

impl Default for ChatAssistant {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatAssistant {
    pub fn new() -> Self {
        let greeting = ChatMessage::new(Role::Assistant, GREETING);
        Self {
            greeting_id: greeting.id,
            messages: vec![greeting],
            pending: false,
        }
    }

    /// Back to a lone greeting, as when the widget is mounted again.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Appends the user's message and returns the conversation to send, or
    /// `None` if `text` is blank or a request is already in flight.
    pub fn begin_send(&mut self, text: &str) -> Option<Vec<CompletionMessage>> {
        if self.pending {
            debug!("Ignoring message while a reply is pending");
            return None;
        }
        if text.trim().is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::new(Role::User, text));
        self.pending = true;

        Some(
            self.messages
                .iter()
                .filter(|m| m.id != self.greeting_id)
                .map(ChatMessage::to_completion)
                .collect(),
        )
    }

    /// Records the reply, or the fallback reply plus a notification on failure.
    pub fn finish_send<N: Notifier + ?Sized>(
        &mut self,
        result: Result<String, ChatError>,
        notifier: &N,
    ) -> &ChatMessage {
        self.pending = false;

        let content = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Chat completion failed: {}", e);
                notifier.notify(&Notification::error(
                    "Assistant unavailable",
                    "Failed to get a response from the AI assistant.",
                ));
                FALLBACK_REPLY.to_string()
            }
        };

        self.messages.push(ChatMessage::new(Role::Assistant, content));
        &self.messages[self.messages.len() - 1]
    }

    /// Sends `text` and waits for the reply. Returns the assistant's message,
    /// or `None` if the send was ignored.
    #[tracing::instrument(skip(self, api, notifier, text))]
    pub async fn send_message<C, N>(
        &mut self,
        api: &C,
        notifier: &N,
        text: &str,
    ) -> Option<&ChatMessage>
    where
        C: CompletionApi + ?Sized,
        N: Notifier + ?Sized,
    {
        let conversation = self.begin_send(text)?;
        let result = api.complete(&conversation).await;
        Some(self.finish_send(result, notifier))
    }
}
