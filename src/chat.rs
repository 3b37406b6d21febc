//! Conversation inside a single match.
use tracing::{debug, warn};

use crate::api::model::{Match, Message};
use crate::api::MatchService;
use crate::error::FriendlyError;

pub struct ChatStore<S> {
    service: S,
    chat: Match,
    messages: Vec<Message>,
    loading: bool,
    error: Option<FriendlyError>,
    /// Text typed but not yet sent.
    pub draft: String,
}

impl<S: MatchService> ChatStore<S> {
    pub fn new(service: S, chat: Match) -> Self {
        Self {
            service,
            chat,
            messages: Vec::new(),
            loading: false,
            error: None,
            draft: String::new(),
        }
    }

    pub fn chat(&self) -> &Match {
        &self.chat
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&FriendlyError> {
        self.error.as_ref()
    }

    pub async fn reload(&mut self) {
        self.loading = true;
        self.error = None;
        match self.service.messages(self.chat.id).await {
            Ok(messages) => self.messages = messages,
            Err(err) => {
                warn!(?err, match_id = self.chat.id, "failed to load messages");
                self.error = FriendlyError::from_api(&err);
            }
        }
        self.loading = false;
    }

    /// Send the trimmed draft. The draft is cleared before the request goes
    /// out and is not restored if it fails.
    pub async fn send(&mut self) {
        let text = self.draft.trim().to_string();
        if text.is_empty() {
            return;
        }
        self.draft.clear();

        match self.service.send_message(self.chat.id, &text).await {
            Ok(created) => {
                debug!(message_id = created.id, match_id = self.chat.id, "message sent");
                self.messages.push(created);
            }
            Err(err) => {
                warn!(?err, match_id = self.chat.id, "failed to send message");
                self.error = FriendlyError::from_api(&err);
            }
        }
    }
}
