use std::collections::HashMap;
use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::ApiKey;
use crate::mailchimp_client::MailChimpClient;
use crate::mailchimp_client::MailChimpError;

/// Global configuration, loaded from the yaml files under `configuration/`.
/// See `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub mailchimp: MailChimpSettings,
}

/// Everything the connector needs to talk to MailChimp
#[derive(Deserialize, Clone)]
pub struct MailChimpSettings {
    /// `<key>-<dc>`; validated when the client is built, not when the config is
    /// loaded
    pub api_key: Secret<String>,

    /// Overrides the URL derived from the key's data center. Only really
    /// useful for pointing the client at a mock server.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Named lists (as used in code, e.g. `newsletter`) -> MailChimp list ids.
    /// Note that `config` lowercases keys.
    #[serde(default)]
    pub lists: HashMap<String, String>,

    /// Used by `subscribe` when the caller doesn't pass a language, e.g.
    /// `en_US`
    #[serde(default)]
    pub default_locale: Option<String>,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl MailChimpSettings {
    pub fn api_key(&self) -> Result<ApiKey, MailChimpError> {
        ApiKey::parse(self.api_key.clone()).map_err(MailChimpError::Configuration)
    }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    /// Build a `MailChimpClient` from these settings. Fails if the API key is
    /// malformed.
    pub fn client(&self) -> Result<MailChimpClient, MailChimpError> {
        let api_key = self.api_key()?;
        let base_url = self
            .base_url
            .clone()
            .unwrap_or_else(|| api_key.base_url());
        MailChimpClient::new(
            base_url,
            api_key,
            self.lists.clone(),
            self.default_locale.clone(),
            self.timeout(),
        )
    }
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )?;
        Ok(())
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid: {e}")),
        }
    }
}

/// Load yaml configuration files at `<project_root>/configuration`:
/// `base.yaml`, then `{local,production}.yaml` (picked by `APP_ENVIRONMENT`),
/// then `APP_`-prefixed env vars.
///
/// All required fields must be present, otherwise this fails immediately. The
/// API key is only checked when the client is built.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Message(format!("could not get current dir: {e}")))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or("local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    tracing::debug!("loading config for {env} env");

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are -always- parsed as String, `serde-aux` is required to parse other
            // types.
            //
            // `APP_MAILCHIMP__API_KEY=abc-us6` -> `Settings.mailchimp.api_key`
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
