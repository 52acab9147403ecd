use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use serde_json::{Map, Value, json};
use tracing::error;
use url::Url;

use zbxapi::Result;
use zbxapi::api::{Entity, EntityKind, Session};
use zbxapi::config::Config;
use zbxapi::error::{ApiError, ConfigError, Error};
use zbxapi::telemetry::init_tracing;

use super::cli::Cli;
use super::params::parse_params;

const DEFAULT_CONFIG: &str = "config.toml";

pub fn run(cli: Cli) -> Result<ExitCode> {
    init_tracing(cli.log_filter.as_deref(), cli.json_logs)?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = Config::from_env_and_file(&config_path)?;
    if let Some(api) = cli.api.as_deref() {
        config.base_url = Url::parse(api).map_err(|err| ConfigError::InvalidField {
            field: "server.url",
            message: err.to_string(),
        })?;
    }
    if let Some(user) = cli.user.clone() {
        config.user = user;
    }

    let session = Session::new(
        config.base_url.clone(),
        config.http_request_timeout,
        config.http_connect_timeout,
        cli.insecure,
    )?;
    if !session.login(&config.user, &config.password)? {
        error!(user = %config.user, "authentication failed");
        return Ok(ExitCode::FAILURE);
    }

    let kind = EntityKind::from_str(&cli.entity).map_err(|message| {
        Error::Config(ConfigError::InvalidField {
            field: "entity",
            message,
        })
    })?;
    let params = parse_params(&cli.params)?;

    match cli.verb.as_str() {
        "get" => {
            let entities = session.fetch(kind, Value::Object(params))?;
            let rendered = Value::Array(entities.iter().map(Entity::to_json).collect());
            println!("{rendered:#}");
        }
        "create" if kind == EntityKind::Group => {
            let name = params
                .get("name")
                .and_then(Value::as_str)
                .ok_or(ApiError::InvalidValue {
                    field: "name",
                    message: "group creation needs a name:<value> parameter".to_string(),
                })?;
            let id = session.group_create(name)?;
            let rendered = json!({ "groupids": [id] });
            println!("{rendered:#}");
        }
        verb @ ("add-hosts" | "remove-hosts") if kind == EntityKind::Group => {
            let result = group_membership(&session, &params, verb == "add-hosts")?;
            println!("{result:#}");
        }
        other => {
            error!(entity = %kind, verb = other, "unsupported operation");
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Resolve the named group and hosts, then issue one mass membership
/// call. The remote result is printed verbatim; membership is only
/// observable by re-fetching.
fn group_membership(session: &Session, params: &Map<String, Value>, add: bool) -> Result<Value> {
    let group_key = params
        .get("group")
        .and_then(Value::as_str)
        .ok_or(ApiError::InvalidValue {
            field: "group",
            message: "a group:<name-or-id> parameter is required".to_string(),
        })?;
    let host_keys: Vec<&str> = params
        .get("hosts")
        .and_then(Value::as_str)
        .map(|raw| raw.split(',').collect())
        .ok_or(ApiError::InvalidValue {
            field: "hosts",
            message: "a hosts:<name,name,...> parameter is required".to_string(),
        })?;

    let group = session.group(group_key)?.ok_or(ApiError::InvalidValue {
        field: "group",
        message: format!("no group matches {group_key:?}"),
    })?;
    let mut hosts = Vec::with_capacity(host_keys.len());
    for key in host_keys {
        let host = session.host(key)?.ok_or(ApiError::InvalidValue {
            field: "hosts",
            message: format!("no host matches {key:?}"),
        })?;
        hosts.push(host);
    }

    if add {
        group.add_hosts(&hosts)
    } else {
        group.remove_hosts(&hosts)
    }
}
