#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

use std::env;
use std::fs;
use std::process;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Error;
use anyhow::Result;
use ragchat::application::cli;
use ragchat::application::cli::Next;
use ragchat::application::console;
use ragchat::configuration::Config;
use ragchat::configuration::ConfigKey;
use ragchat::domain::models::BackendArc;
use ragchat::domain::models::ChatBackend;
use ragchat::domain::models::SendPolicy;
use ragchat::domain::services::ExchangeController;
use ragchat::domain::services::SessionStore;
use ragchat::infrastructure::backends::http::HttpChat;
use yansi::Paint;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "Oh no! ragchat has failed with the following app version and error.\n\nVersion: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

async fn run() -> Result<()> {
    if cli::parse().await? == Next::Exit {
        return Ok(());
    }

    let policy = SendPolicy::from_str(&Config::get(ConfigKey::SendPolicy))?;
    let backend: BackendArc = Arc::new(HttpChat::default());
    if let Err(err) = backend.health_check().await {
        tracing::warn!(error = ?err, "Chat service failed its health check");
        eprintln!(
            "{}",
            Paint::yellow(format!(
                "Hey, it looks like the chat service at {} isn't responding. Messages will fail until it's up.\n\nError: {err}",
                Config::get(ConfigKey::ChatUrl)
            ))
        );
    }

    let store = SessionStore::new();
    let exchange = ExchangeController::new(store.clone(), backend, policy);

    return console::start(store, exchange).await;
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let max_level = cli::log_level(&env::var("RUST_LOG").unwrap_or_default());

    let mut log_guard = None;
    let log_dir = cli::log_dir();
    if fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(log_dir, "debug.log");
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        log_guard = Some(guard);

        tracing_subscriber::fmt()
            .json()
            .with_max_level(max_level)
            .with_writer(writer)
            .init();
    }

    let res = run().await;
    // Flush buffered log lines before any exit.
    drop(log_guard);

    if let Err(err) = res {
        handle_error(err);
    }
}
