#[cfg(test)]
#[path = "exchange_test.rs"]
mod tests;

use std::panic::AssertUnwindSafe;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinHandle;

use super::SessionStore;
use crate::domain::models::BackendArc;
use crate::domain::models::ExchangeError;
use crate::domain::models::ExchangeOutcome;
use crate::domain::models::Message;
use crate::domain::models::SendPolicy;

pub const FALLBACK_REPLY: &str = "Sorry, an error occurred. Please try again.";

pub enum SendStatus {
    /// The draft was blank after trimming. Nothing changed.
    Ignored,
    /// Another exchange is pending and the policy refuses overlap. The draft
    /// is left as it was.
    Rejected,
    Dispatched(JoinHandle<ExchangeOutcome>),
}

/// Clears the pending flag once the last in-flight exchange is gone, whether
/// the exchange replied, failed, panicked, or its task was dropped.
struct PendingGuard {
    store: Arc<SessionStore>,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let in_flight = &self.in_flight;
        self.store.update(|tx| {
            if in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                tx.set_pending(false);
            }
        });
    }
}

fn panic_detail(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        return msg.to_string();
    }
    if let Some(msg) = panic.downcast_ref::<String>() {
        return msg.to_string();
    }

    return "unknown panic".to_string();
}

async fn exchange(
    store: Arc<SessionStore>,
    backend: BackendArc,
    text: String,
    guard: PendingGuard,
) -> ExchangeOutcome {
    let _guard = guard;

    let res = AssertUnwindSafe(backend.send(&text))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            return Err(ExchangeError::Transport(format!(
                "backend panicked: {}",
                panic_detail(panic)
            )));
        });

    match res {
        Ok(reply) => {
            tracing::debug!(bytes = reply.len(), "Chat exchange replied");
            store.append_message(Message::assistant(&reply));
            return ExchangeOutcome::Replied;
        }
        Err(err) => {
            tracing::error!(kind = err.kind(), error = %err, "Chat exchange failed");
            store.append_message(Message::assistant(FALLBACK_REPLY));
            return ExchangeOutcome::Failed(err);
        }
    }
}

enum Commit {
    Ignored,
    Rejected,
    Accepted(String),
}

/// Turns the store's draft into a chat exchange and reconciles the result back
/// into the transcript.
pub struct ExchangeController {
    store: Arc<SessionStore>,
    backend: BackendArc,
    policy: SendPolicy,
    in_flight: Arc<AtomicUsize>,
}

impl ExchangeController {
    pub fn new(store: Arc<SessionStore>, backend: BackendArc, policy: SendPolicy) -> Self {
        return ExchangeController {
            store,
            backend,
            policy,
            in_flight: Arc::new(AtomicUsize::new(0)),
        };
    }

    /// Sends the current draft. Clearing the draft, appending the user message
    /// and raising the pending flag happen as one store update before this
    /// returns. The request itself runs on a spawned task, so this must be
    /// called from within a Tokio runtime.
    pub fn send_message(&self) -> SendStatus {
        let policy = self.policy;
        let in_flight = &self.in_flight;

        let commit = self.store.update(|tx| {
            let text = tx.input().trim().to_string();
            if text.is_empty() {
                return Commit::Ignored;
            }
            if tx.is_pending() && policy == SendPolicy::Reject {
                return Commit::Rejected;
            }

            in_flight.fetch_add(1, Ordering::SeqCst);
            tx.set_input("");
            tx.append_message(Message::user(&text));
            tx.set_pending(true);

            return Commit::Accepted(text);
        });

        let text = match commit {
            Commit::Ignored => return SendStatus::Ignored,
            Commit::Rejected => {
                tracing::debug!("Send rejected, an exchange is already pending");
                return SendStatus::Rejected;
            }
            Commit::Accepted(text) => text,
        };

        let guard = PendingGuard {
            store: self.store.clone(),
            in_flight: self.in_flight.clone(),
        };

        tracing::debug!(bytes = text.len(), policy = %policy, "Dispatching chat exchange");
        let handle = tokio::spawn(exchange(
            self.store.clone(),
            self.backend.clone(),
            text,
            guard,
        ));

        return SendStatus::Dispatched(handle);
    }
}
