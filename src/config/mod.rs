use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::Result;
use crate::error::Error;

mod defaults;
mod env;
mod raw;
mod serde;

pub(crate) use serde::HumantimeDuration;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything the session needs to reach and authenticate against the
/// server. Credentials come from the file, the environment, or CLI flags;
/// the session itself never reads the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server root; the session appends `api_jsonrpc.php` itself.
    pub base_url: Url,
    pub user: String,
    pub password: SecretString,
    pub http_request_timeout: Duration,
    pub http_connect_timeout: Duration,
}

impl Config {
    /// Load configuration from a TOML file and the environment.
    ///
    /// The file is optional. A `ZBXAPI`-prefixed environment source is
    /// layered on top of it, then the legacy `ZABBIX_API` / `ZABBIX_USER` /
    /// `ZABBIX_PASS` variables override both.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be parsed, when environment
    /// overrides are invalid, or when the resulting values fail validation.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut raw = raw::load(path).map_err(Error::from)?;
        raw.apply_env_overrides().map_err(Error::from)?;
        raw.validate_and_build()
    }
}
