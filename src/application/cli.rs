#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::application::console::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::SendPolicy;

/// What `main` should do once the command line has been handled.
#[derive(Debug, PartialEq, Eq)]
pub enum Next {
    Chat,
    Exit,
}

pub fn log_dir() -> path::PathBuf {
    if let Ok(dir) = std::env::var("RAGCHAT_LOG_DIR") {
        return path::PathBuf::from(dir);
    }

    return dirs::cache_dir().unwrap_or_default().join("ragchat");
}

/// Exchange failures and warnings are always written. `RUST_LOG=ragchat` adds
/// debug records.
pub fn log_level(rust_log: &str) -> tracing::Level {
    if rust_log.contains("ragchat") {
        return tracing::Level::DEBUG;
    }

    return tracing::Level::WARN;
}

fn print_completions(shell: Shell, cmd: &mut Command) {
    let name = cmd.get_name().to_string();
    generate(shell, cmd, name, &mut io::stdout());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default().as_bytes())
        .await?;

    println!(
        "Created default config file at {}",
        config_file_path.to_string_lossy()
    );
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for ragchat")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to the log file. Debug records are added when running ragchat with environment variable RUST_LOG=ragchat")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn arg_chat_url() -> Arg {
    return Arg::new(ConfigKey::ChatUrl.to_string())
        .short('u')
        .long(ConfigKey::ChatUrl.to_string())
        .env("RAGCHAT_CHAT_URL")
        .num_args(1)
        .help(format!(
            "{} [default: {}]",
            ConfigKey::ChatUrl.description(),
            Config::default(ConfigKey::ChatUrl)
        ));
}

fn arg_send_policy() -> Arg {
    return Arg::new(ConfigKey::SendPolicy.to_string())
        .short('p')
        .long(ConfigKey::SendPolicy.to_string())
        .env("RAGCHAT_SEND_POLICY")
        .num_args(1)
        .help(format!(
            "{} [default: {}]",
            ConfigKey::SendPolicy.description(),
            Config::default(ConfigKey::SendPolicy)
        ))
        .value_parser(PossibleValuesParser::new(SendPolicy::VARIANTS));
}

fn arg_backend_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
        .long(ConfigKey::BackendHealthCheckTimeout.to_string())
        .env("RAGCHAT_BACKEND_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(format!(
            "{} [default: {}]",
            ConfigKey::BackendHealthCheckTimeout.description(),
            Config::default(ConfigKey::BackendHealthCheckTimeout)
        ));
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Start a new chat session.")
        .arg(arg_chat_url())
        .arg(arg_send_policy())
        .arg(arg_backend_health_check_timeout());
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("ragchat")
        .about(about)
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(arg_chat_url())
        .arg(arg_send_policy())
        .arg(arg_backend_health_check_timeout())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("RAGCHAT_CONFIG_FILE")
                .num_args(1)
                .help(format!("{} [default: {}]", ConfigKey::ConfigFile.description(), Config::default(ConfigKey::ConfigFile)))
                .global(true)
        );
}

/// Handles every subcommand that doesn't start a chat, and loads config for
/// the ones that do.
pub async fn handle(matches: ArgMatches) -> Result<Next> {
    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = log_dir().join("debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }
            return Ok(Next::Exit);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(shell) = subcmd_matches.get_one::<Shell>("shell").copied() {
                print_completions(shell, &mut build());
            }
            return Ok(Next::Exit);
        }
        Some(("config", subcmd_matches)) => {
            match subcmd_matches.subcommand() {
                Some(("create", _)) => {
                    create_config_file().await?;
                }
                Some(("default", _)) => {
                    println!("{}", Config::serialize_default());
                }
                Some(("path", _)) => {
                    println!("{}", Config::default(ConfigKey::ConfigFile));
                }
                _ => {
                    subcommand_config().print_long_help()?;
                }
            }
            return Ok(Next::Exit);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
        }
        _ => {
            Config::load(vec![&matches]).await?;
        }
    }

    return Ok(Next::Chat);
}

pub async fn parse() -> Result<Next> {
    return handle(build().get_matches()).await;
}
