use super::Message;

/// Everything a presentation layer needs to draw the conversation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Draft text, not yet sent.
    pub input: String,
    /// Append-only transcript.
    pub messages: Vec<Message>,
    pub is_pending: bool,
}

impl SessionState {
    pub fn last_message(&self) -> Option<&Message> {
        return self.messages.last();
    }
}
