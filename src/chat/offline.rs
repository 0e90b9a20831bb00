//! Implements the `Completion` trait without any network access.
//!
//! Note: this is compiled into the release binary so that the chat can be run top-to-bottom in
//! test mode without an API key.

use crate::chat::{ChatMessage, Completion, Role};
use crate::Result;
use std::collections::VecDeque;

/// Answers from a script of canned replies and, once the script runs out, echoes the newest user
/// message. A scripted `Err` is returned as a failed completion.
#[derive(Debug, Default)]
pub struct OfflineCompletion {
    script: VecDeque<std::result::Result<String, String>>,
}

impl OfflineCompletion {
    pub fn scripted(
        script: impl IntoIterator<Item = std::result::Result<String, String>>,
    ) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl Completion for OfflineCompletion {
    async fn complete(&mut self, messages: &[ChatMessage]) -> Result<String> {
        if let Some(next) = self.script.pop_front() {
            return next.map_err(anyhow::Error::msg);
        }
        let last = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(format!("(offline) You said: {last}"))
    }
}
