#[cfg(test)]
#[path = "console_test.rs"]
mod tests;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::task::JoinHandle;
use yansi::Paint;

use crate::domain::models::ExchangeOutcome;
use crate::domain::models::Message;
use crate::domain::models::SessionState;
use crate::domain::models::SlashCommand;
use crate::domain::services::ExchangeController;
use crate::domain::services::SendStatus;
use crate::domain::services::SessionStore;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /quit /exit (/q) - Exit ragchat. Replies still on their way are waited for first.
- /help (/h) - Provides this help menu.
        "#;

    return text.trim().to_string();
}

fn format_message(message: &Message) -> String {
    if message.is_user() {
        return format!("You: {}", message.text());
    }

    return format!("Assistant: {}", message.text());
}

#[derive(Default)]
struct PrinterState {
    printed: usize,
    was_pending: bool,
}

/// Turns store snapshots into the console lines that haven't been printed yet.
#[derive(Default)]
pub struct TranscriptPrinter {
    state: Mutex<PrinterState>,
}

impl TranscriptPrinter {
    pub fn render(&self, snapshot: &SessionState) -> Vec<String> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut lines = snapshot
            .messages
            .iter()
            .skip(state.printed)
            .map(format_message)
            .collect::<Vec<String>>();
        state.printed = snapshot.messages.len();

        if snapshot.is_pending && !state.was_pending {
            lines.push("Loading...".to_string());
        }
        state.was_pending = snapshot.is_pending;

        return lines;
    }
}

/// Reads drafts from stdin until `/quit` or end of input, sending each one
/// through the exchange controller. Transcript updates are printed by a store
/// observer rather than by this loop.
pub async fn start(store: Arc<SessionStore>, exchange: ExchangeController) -> Result<()> {
    let printer = TranscriptPrinter::default();
    let subscription = store.subscribe(move |snapshot| {
        for line in printer.render(snapshot) {
            println!("{line}");
        }
    });

    println!("{}", Paint::new("RAG Chat").bold());
    println!("Type a message and press enter. /help lists commands.");

    let mut in_flight: Vec<JoinHandle<ExchangeOutcome>> = vec![];
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(command) = SlashCommand::parse(&line) {
            if command.is_quit() {
                break;
            }
            if command.is_help() {
                println!("{}", help_text());
                continue;
            }
        }

        store.set_input(&line);
        match exchange.send_message() {
            SendStatus::Dispatched(handle) => {
                in_flight.retain(|other| return !other.is_finished());
                in_flight.push(handle);
            }
            SendStatus::Rejected => {
                println!(
                    "{}",
                    Paint::yellow("Still waiting on the last reply. Send your message again once it arrives.")
                );
            }
            SendStatus::Ignored => (),
        }
    }

    for handle in in_flight {
        if let Err(err) = handle.await {
            tracing::error!(error = ?err, "Chat exchange task did not complete");
        }
    }

    subscription.unsubscribe();
    return Ok(());
}
