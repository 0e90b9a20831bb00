//! Runs one chat request at a time in the background.
//!
//! The relay is moved into a spawned task for the duration of a request and comes back over a
//! channel together with the result, so the caller keeps reading input while the request is in
//! flight and no lock is needed around the history.

use crate::chat::ChatRelay;
use crate::Result;
use anyhow::bail;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// The receiving end of a `ChatSlot`. Each message must be passed back to `ChatSlot::complete`.
pub type Replies = mpsc::Receiver<Completed>;

/// A finished request.
#[derive(Debug)]
pub struct Completed {
    relay: ChatRelay,
    /// The message that was sent.
    pub message: String,
    result: Result<String>,
}

/// Holds the relay while it is idle.
#[derive(Debug)]
pub struct ChatSlot {
    relay: Option<ChatRelay>,
    sender: mpsc::Sender<Completed>,
}

impl ChatSlot {
    pub fn new(relay: ChatRelay) -> (Self, Replies) {
        let (sender, receiver) = mpsc::channel(1);
        let slot = Self {
            relay: Some(relay),
            sender,
        };
        (slot, receiver)
    }

    /// True while a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.relay.is_none()
    }

    /// Starts sending `message` on a background task. Fails without sending if a request is
    /// already in flight.
    pub fn dispatch(&mut self, message: impl Into<String>) -> Result<()> {
        let Some(mut relay) = self.relay.take() else {
            bail!("The assistant is still answering the previous message");
        };
        let message = message.into();
        let sender = self.sender.clone();
        trace!("Dispatching a chat message");
        tokio::spawn(async move {
            let result = relay.send(&message).await;
            let completed = Completed {
                relay,
                message,
                result,
            };
            if sender.send(completed).await.is_err() {
                debug!("The chat slot was dropped before the reply arrived");
            }
        });
        Ok(())
    }

    /// Puts the relay back and returns the reply or the error of the request.
    pub fn complete(&mut self, completed: Completed) -> Result<String> {
        self.relay = Some(completed.relay);
        completed.result
    }

    /// The idle relay, if no request is in flight.
    pub fn relay(&self) -> Option<&ChatRelay> {
        self.relay.as_ref()
    }
}
