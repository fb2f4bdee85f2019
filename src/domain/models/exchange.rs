#[cfg(test)]
#[path = "exchange_test.rs"]
mod tests;

use strum::IntoStaticStr;
use thiserror::Error;

/// Why a chat exchange produced no reply. The transcript never shows the
/// difference between these, only the diagnostics log does.
#[derive(Debug, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ExchangeError {
    #[error("chat request could not be completed: {0}")]
    Transport(String),

    #[error("chat endpoint responded with status {0}")]
    UnsuccessfulStatus(u16),

    #[error("chat response could not be parsed: {0}")]
    MalformedResponse(String),
}

impl ExchangeError {
    pub fn kind(&self) -> &'static str {
        return self.into();
    }
}

/// How a dispatched exchange settled. Failures have already been turned into
/// a transcript entry by the time this is observed.
#[derive(Debug)]
pub enum ExchangeOutcome {
    Replied,
    Failed(ExchangeError),
}

impl ExchangeOutcome {
    pub fn is_replied(&self) -> bool {
        return matches!(self, ExchangeOutcome::Replied);
    }
}
