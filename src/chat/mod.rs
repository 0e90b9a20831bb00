//! The chat assistant: a bounded conversation history that is forwarded, with a fixed system
//! instruction, to a chat-completion endpoint.
//!
//! The endpoint sits behind the `Completion` trait. `OpenRouterClient` talks to the real service
//! and `OfflineCompletion` answers locally so the whole app can run without network access or an
//! API key (see `ChatMode`).

mod offline;
mod openrouter;
mod slot;

pub use offline::OfflineCompletion;
pub use openrouter::OpenRouterClient;
pub use slot::{ChatSlot, Completed, Replies};

use crate::{Config, Result};
use anyhow::bail;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// When this environment variable is set and non-empty, the chat uses `OfflineCompletion`.
pub const TEST_MODE_ENV: &str = "BUDGET_CHAT_TEST_MODE";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of the conversation, in the wire format of chat-completion APIs.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Produces the assistant's next message for a conversation.
#[async_trait::async_trait]
pub trait Completion: Send {
    /// `messages` starts with the system instruction and ends with the newest user turn.
    async fn complete(&mut self, messages: &[ChatMessage]) -> Result<String>;
}

/// Which `Completion` the chat uses.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ChatMode {
    OpenRouter,
    Offline,
}

impl ChatMode {
    /// `Offline` if `BUDGET_CHAT_TEST_MODE` is set to a non-empty value, otherwise `OpenRouter`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(v) if !v.is_empty() => ChatMode::Offline,
            _ => ChatMode::OpenRouter,
        }
    }
}

/// Holds the conversation and sends it to a `Completion`.
pub struct ChatRelay {
    completion: Box<dyn Completion>,
    system_prompt: String,
    history: Vec<ChatMessage>,
    max_history: usize,
}

impl ChatRelay {
    pub fn new(
        completion: Box<dyn Completion>,
        system_prompt: impl Into<String>,
        max_history: usize,
    ) -> Self {
        Self {
            completion,
            system_prompt: system_prompt.into(),
            history: Vec::new(),
            max_history,
        }
    }

    /// Builds the relay described by the `chat` section of `config`. In `OpenRouter` mode this
    /// needs the API key.
    pub async fn from_config(config: &Config, mode: ChatMode) -> Result<Self> {
        let chat = config.chat();
        let completion: Box<dyn Completion> = match mode {
            ChatMode::OpenRouter => {
                let api_key = config.api_key().await?;
                Box::new(OpenRouterClient::new(chat, api_key)?)
            }
            ChatMode::Offline => {
                debug!("Using the offline chat assistant");
                Box::new(OfflineCompletion::default())
            }
        };
        Ok(Self::new(completion, &chat.system_prompt, chat.max_history))
    }

    /// The user and assistant turns kept so far, oldest first.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Sends `message` with the kept history and returns the trimmed reply.
    ///
    /// On success both turns are kept and the history is cut to the newest `max_history` entries.
    /// On failure the history is left as it was before the call.
    pub async fn send(&mut self, message: &str) -> Result<String> {
        let message = message.trim();
        if message.is_empty() {
            bail!("Cannot send an empty message");
        }
        self.history.push(ChatMessage::user(message));

        let mut request = Vec::with_capacity(self.history.len() + 1);
        request.push(ChatMessage::new(Role::System, &self.system_prompt));
        request.extend(self.history.iter().cloned());
        trace!("Sending {} messages to the assistant", request.len());

        match self.completion.complete(&request).await {
            Ok(reply) => {
                let reply = reply.trim().to_string();
                self.history.push(ChatMessage::assistant(&reply));
                self.trim_history();
                Ok(reply)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }

    fn trim_history(&mut self) {
        let excess = self.history.len().saturating_sub(self.max_history);
        self.history.drain(..excess);
    }
}

impl std::fmt::Debug for ChatRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRelay")
            .field("history", &self.history.len())
            .field("max_history", &self.max_history)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every request and answers from a script.
    struct Recorder {
        requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
        replies: Vec<Result<String>>,
    }

    #[async_trait::async_trait]
    impl Completion for Recorder {
        async fn complete(&mut self, messages: &[ChatMessage]) -> Result<String> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.replies.remove(0)
        }
    }

    fn relay(replies: Vec<Result<String>>) -> (ChatRelay, Arc<Mutex<Vec<Vec<ChatMessage>>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorder = Recorder {
            requests: requests.clone(),
            replies,
        };
        (ChatRelay::new(Box::new(recorder), "Be brief.", 10), requests)
    }

    #[tokio::test]
    async fn test_send_prefixes_system_prompt() {
        let (mut relay, requests) = relay(vec![Ok("  Hello!  ".to_string())]);
        let reply = relay.send(" Hi ").await.unwrap();
        assert_eq!(reply, "Hello!");
        assert_eq!(
            relay.history(),
            &[ChatMessage::user("Hi"), ChatMessage::assistant("Hello!")]
        );
        let requests = requests.lock().unwrap();
        let sent = &requests[0];
        assert_eq!(sent[0], ChatMessage::new(Role::System, "Be brief."));
        assert_eq!(sent[1], ChatMessage::user("Hi"));
        assert_eq!(sent.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_user_turn() {
        let (mut relay, _) = relay(vec![
            Ok("first".to_string()),
            Err(anyhow::anyhow!("HTTP 500")),
        ]);
        relay.send("one").await.unwrap();
        let err = relay.send("two").await.unwrap_err();
        assert!(err.to_string().contains("500"));
        assert_eq!(relay.history().len(), 2);
        assert_eq!(relay.history().last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let replies = (0..8).map(|i| Ok(format!("reply {i}"))).collect();
        let (mut relay, requests) = relay(replies);
        for i in 0..8 {
            relay.send(&format!("message {i}")).await.unwrap();
        }
        assert_eq!(relay.history().len(), 10);
        assert_eq!(relay.history()[0], ChatMessage::user("message 3"));
        // The system prompt, ten kept turns and the new one.
        let last = requests.lock().unwrap().last().unwrap().len();
        assert_eq!(last, 12);
    }

    #[tokio::test]
    async fn test_empty_message_is_not_sent() {
        let (mut relay, requests) = relay(vec![]);
        assert!(relay.send("   ").await.is_err());
        assert!(relay.history().is_empty());
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_role_wire_names() {
        let json = serde_json::to_string(&ChatMessage::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }
}
