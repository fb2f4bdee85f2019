#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

/// A single transcript entry. Messages are never edited once created, their
/// position in the transcript is their only identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    text: String,
    is_user: bool,
}

impl Message {
    pub fn user(text: &str) -> Message {
        return Message {
            text: text.to_string(),
            is_user: true,
        };
    }

    pub fn assistant(text: &str) -> Message {
        return Message {
            text: text.to_string(),
            is_user: false,
        };
    }

    pub fn text(&self) -> &str {
        return &self.text;
    }

    pub fn is_user(&self) -> bool {
        return self.is_user;
    }
}
