use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(author, version, about = "Typed command-line access to the monitoring API", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Server root URL, overriding configuration and environment.
    #[arg(long, value_name = "URL")]
    pub api: Option<String>,

    /// Username, overriding configuration and environment.
    #[arg(long, value_name = "NAME")]
    pub user: Option<String>,

    /// Accept plain http URLs.
    #[arg(long, action = ArgAction::SetTrue)]
    pub insecure: bool,

    /// Use a JSON layer for logs (`--features json-logs`).
    #[arg(long, action = ArgAction::SetTrue)]
    pub json_logs: bool,

    /// Explicit log filter (e.g. "zbxapi=debug").
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,

    /// Entity kind: host, hostgroup, template, item, trigger, event,
    /// problem, maintenance, application, service.
    pub entity: String,

    /// Operation: `get` for every kind; `create`, `add-hosts`,
    /// `remove-hosts` for groups.
    pub verb: String,

    /// `name:value` parameters. `filter` and `search` take
    /// `+`-separated `key:v1,v2` pairs.
    #[arg(value_name = "PARAMS")]
    pub params: Vec<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
