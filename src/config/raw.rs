use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_with::serde_as;
use url::Url;

use crate::Result;
use crate::error::ConfigError;

use super::defaults::{default_connect_timeout, default_request_timeout};
use super::env::env_string;
use super::{Config, HumantimeDuration};

pub(super) fn load(path: impl AsRef<Path>) -> std::result::Result<RawConfig, ConfigError> {
    let mut builder = ::config::Config::builder();
    let path = path.as_ref();
    builder = builder.add_source(::config::File::from(path).required(false));
    builder = builder.add_source(
        ::config::Environment::with_prefix("ZBXAPI")
            .separator("__")
            .try_parsing(true),
    );

    builder
        .build()
        .map_err(|err| ConfigError::Other(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub(super) server: RawServer,
    #[serde(default)]
    pub(super) http: RawHttp,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawServer {
    pub(super) url: Option<String>,
    pub(super) user: Option<String>,
    pub(super) password: Option<String>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawHttp {
    #[serde(default = "default_request_timeout")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) request_timeout: Duration,
    #[serde(default = "default_connect_timeout")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) connect_timeout: Duration,
}

impl RawConfig {
    /// The legacy variables of the command-line client win over both the
    /// file and the `ZBXAPI`-prefixed source.
    pub(super) fn apply_env_overrides(&mut self) -> std::result::Result<(), ConfigError> {
        if let Some(url) = env_string("ZABBIX_API")? {
            self.server.url = Some(url);
        }
        if let Some(user) = env_string("ZABBIX_USER")? {
            self.server.user = Some(user);
        }
        if let Some(password) = env_string("ZABBIX_PASS")? {
            self.server.password = Some(password);
        }
        Ok(())
    }

    pub(super) fn validate_and_build(self) -> Result<Config> {
        let url_str = self.server.url.ok_or(ConfigError::MissingField {
            field: "server.url",
        })?;
        let base_url = Url::parse(&url_str).map_err(|err| ConfigError::InvalidField {
            field: "server.url",
            message: err.to_string(),
        })?;

        // Username falls back to the login account, same as the original
        // command-line client.
        let user = match self.server.user {
            Some(user) => user,
            None => env_string("USER")?.ok_or(ConfigError::MissingField {
                field: "server.user",
            })?,
        };
        if user.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "server.user",
                message: "username cannot be empty".to_string(),
            }
            .into());
        }

        let password = self.server.password.ok_or(ConfigError::MissingField {
            field: "server.password",
        })?;
        if password.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "server.password",
                message: "password cannot be empty".to_string(),
            }
            .into());
        }

        if self.http.request_timeout.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "http.request_timeout",
                message: "timeout must be greater than zero".to_string(),
            }
            .into());
        }
        if self.http.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "http.connect_timeout",
                message: "timeout must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(Config {
            base_url,
            user,
            password: password.into(),
            http_request_timeout: self.http.request_timeout,
            http_connect_timeout: self.http.connect_timeout,
        })
    }
}

impl Default for RawHttp {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}
