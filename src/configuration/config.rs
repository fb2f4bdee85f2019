#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path;
use std::str::FromStr;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use strum::VariantNames;
use tokio::fs;

use crate::domain::models::SendPolicy;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    BackendHealthCheckTimeout,
    ChatUrl,
    ConfigFile,
    SendPolicy,
}

impl ConfigKey {
    /// Shared by `--help` and the generated config file.
    pub fn description(self) -> &'static str {
        return match self {
            ConfigKey::BackendHealthCheckTimeout => "Time to wait in milliseconds before timing out when doing a healthcheck for the chat service.",
            ConfigKey::ChatUrl => "Base URL of the chat service. Messages are posted to its /chat endpoint.",
            ConfigKey::ConfigFile => "Path to configuration file",
            ConfigKey::SendPolicy => "What to do with a new message while a reply is still pending.",
        };
    }

    fn is_millis(self) -> bool {
        return self == ConfigKey::BackendHealthCheckTimeout;
    }

    fn possible_values(self) -> &'static [&'static str] {
        if self == ConfigKey::SendPolicy {
            return SendPolicy::VARIANTS;
        }

        return &[];
    }
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        return match key {
            ConfigKey::BackendHealthCheckTimeout => "1000".to_string(),
            ConfigKey::ChatUrl => "http://localhost:8080".to_string(),
            ConfigKey::SendPolicy => SendPolicy::default().to_string(),
            ConfigKey::ConfigFile => dirs::config_dir()
                .unwrap_or_default()
                .join("ragchat/config.toml")
                .to_string_lossy()
                .to_string(),
        };
    }

    fn from_file_value(key: ConfigKey, val: &toml_edit::Item) -> Result<Option<String>> {
        if key.is_millis() {
            if let Some(millis) = val.as_integer().filter(|e| return *e >= 0) {
                return Ok(Some(millis.to_string()));
            }
            bail!(format!(
                "config.toml expects '{key}' to be a whole number of milliseconds"
            ));
        }

        let Some(val_str) = val.as_str() else {
            bail!(format!("config.toml expects '{key}' to be a string"));
        };
        if val_str.is_empty() {
            return Ok(None);
        }

        let possible_values = key.possible_values();
        if !possible_values.is_empty() && !possible_values.contains(&val_str) {
            bail!(format!(
                "config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}",
                possible_values.join(", ")
            ));
        }

        return Ok(Some(val_str.to_string()));
    }

    /// Checks the merged values that the session can't start without.
    fn validate() -> Result<()> {
        let chat_url = Config::get(ConfigKey::ChatUrl);
        if let Err(err) = reqwest::Url::parse(&chat_url) {
            bail!(format!("'{}' is not a valid URL: {chat_url} ({err})", ConfigKey::ChatUrl));
        }

        let timeout = Config::get(ConfigKey::BackendHealthCheckTimeout);
        if timeout.parse::<u64>().is_err() {
            bail!(format!(
                "'{}' must be a whole number of milliseconds, got: {timeout}",
                ConfigKey::BackendHealthCheckTimeout
            ));
        }

        SendPolicy::from_str(&Config::get(ConfigKey::SendPolicy))?;

        return Ok(());
    }

    /// Defaults, then the config file, then CLI arguments and environment.
    pub async fn load(clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter().filter(|key| return *key != ConfigKey::ConfigFile) {
                if let Some(val) = doc.get(&key.to_string()) {
                    if let Some(val) = Config::from_file_value(key, val)? {
                        Config::set(key, &val);
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        Config::validate()?;

        tracing::debug!(
            chat_url = Config::get(ConfigKey::ChatUrl),
            send_policy = Config::get(ConfigKey::SendPolicy),
            health_check_timeout = Config::get(ConfigKey::BackendHealthCheckTimeout),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default() -> String {
        return ConfigKey::iter()
            .filter(|key| return *key != ConfigKey::ConfigFile)
            .map(|key| {
                let mut description = key.description().to_string();
                if !key.possible_values().is_empty() {
                    description = format!(
                        "{description} [possible values: {}]",
                        key.possible_values().join(", ")
                    );
                }

                let val = Config::default(key);
                if key.is_millis() {
                    return format!("# {description}\n{key} = {val}");
                }

                return format!("# {description}\n{key} = \"{val}\"");
            })
            .collect::<Vec<String>>()
            .join("\n\n");
    }
}
