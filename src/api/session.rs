use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use tracing::debug;
use url::Url;

use crate::Result;
use crate::error::{ApiError, ConfigError, Error};

use super::entity::Entity;
use super::rpc::{RpcEnvelope, RpcRequest, body_preview};
use super::schema::EntityKind;

/// An authenticated connection to one server.
///
/// All remote calls go through [`Session::call`]: one blocking HTTP POST
/// per call, a request id from a monotonically increasing counter, and the
/// stored token attached once [`Session::login`] has succeeded. The
/// interior `Cell`/`RefCell` state makes `Session` `!Sync` on purpose:
/// concurrent callers must serialize access themselves, and the compiler
/// holds them to it.
#[derive(Debug)]
pub struct Session {
    http: reqwest::blocking::Client,
    endpoint: Url,
    auth: RefCell<Option<String>>,
    request_id: Cell<u64>,
}

impl Session {
    /// Build a session for the server at `base`. The JSON-RPC endpoint
    /// path is appended here; `base` is the server root.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not HTTPS while `insecure_http` is
    /// unset, or if the underlying HTTP client fails to build.
    pub fn new(
        base: Url,
        request_timeout: Duration,
        connect_timeout: Duration,
        insecure_http: bool,
    ) -> Result<Self> {
        if base.scheme() != "https" && !insecure_http {
            return Err(Error::Config(ConfigError::InvalidField {
                field: "server.url",
                message: "only https URLs are accepted without --insecure".to_string(),
            }));
        }

        let endpoint = endpoint_for(&base)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json-rpc"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        let mut builder = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(concat!("zbxapi/", env!("CARGO_PKG_VERSION")));

        if !insecure_http {
            builder = builder.https_only(true);
        }

        let http = builder
            .build()
            .map_err(|err| ApiError::Client { source: err })?;

        Ok(Self {
            http,
            endpoint,
            auth: RefCell::new(None),
            request_id: Cell::new(0),
        })
    }

    /// Authenticate and store the session token.
    ///
    /// Returns `Ok(false)` when the server rejects the credentials; any
    /// other failure propagates. A previously stored token is kept on a
    /// failed re-login.
    ///
    /// # Errors
    ///
    /// Transport failures, undecodable replies, and remote errors other
    /// than the bad-credentials code.
    pub fn login(&self, user: &str, password: &SecretString) -> Result<bool> {
        let params = json!({
            "user": user,
            "password": password.expose_secret(),
        });
        match self.call("user.login", params) {
            Ok(result) => {
                let token = result.as_str().ok_or_else(|| ApiError::InvalidReply {
                    message: "login result is not a token string".to_string(),
                })?;
                self.auth.replace(Some(token.to_string()));
                Ok(true)
            }
            Err(Error::Api(ApiError::Remote { code, .. })) if code == ApiError::FAILED_AUTH => {
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Issue one JSON-RPC call and return the reply's result member.
    ///
    /// # Errors
    ///
    /// `InvalidReply` for an empty or undecodable body, `Remote` with the
    /// server's code/message/data passed through verbatim, and the
    /// transport errors from the HTTP layer. Nothing is retried.
    pub fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.request_id.get();
        self.request_id.set(id + 1);
        let auth = self.auth.borrow().clone();
        let started = Instant::now();

        let payload = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
            auth: auth.as_deref(),
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .map_err(ApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus { status }.into());
        }

        let body = response.bytes().map_err(ApiError::from)?;
        if body.is_empty() {
            return Err(ApiError::InvalidReply {
                message: "empty reply".to_string(),
            }
            .into());
        }

        let envelope: RpcEnvelope<Value> =
            serde_json::from_slice(&body).map_err(|err| ApiError::InvalidReply {
                message: format!(
                    "error decoding response body: {err}; body preview: {}",
                    body_preview(&body)
                ),
            })?;

        if let Some(err) = envelope.error {
            return Err(ApiError::Remote {
                code: err.code,
                message: err.message,
                data: err.data.unwrap_or_default(),
            }
            .into());
        }

        let result = envelope.result.ok_or_else(|| ApiError::InvalidReply {
            message: "reply carries neither result nor error".to_string(),
        })?;

        debug!(
            method,
            id,
            latency_ms = started.elapsed().as_millis(),
            "call succeeded"
        );
        Ok(result)
    }

    /// Fetch entities of `kind` via `<kind>.get`.
    ///
    /// Relations the schema marks default-eager get their `selectXxx`
    /// flag added unless the caller already specified one.
    ///
    /// # Errors
    ///
    /// Call failures, plus `InvalidReply` when the result is not a list
    /// of records.
    pub fn fetch(&self, kind: EntityKind, params: Value) -> Result<Vec<Entity<'_>>> {
        self.fetch_records(kind, params)?
            .iter()
            .map(|record| Entity::from_record(self, kind, record))
            .collect()
    }

    /// Look one entity up by numeric id or by name.
    ///
    /// # Errors
    ///
    /// `AmbiguousFilter` when more than one record matches; this is a
    /// caller error and is never retried.
    pub fn fetch_one(&self, kind: EntityKind, key: &str) -> Result<Option<Entity<'_>>> {
        match self.fetch_one_record(kind, key)? {
            Some(record) => Ok(Some(Entity::from_record(self, kind, &record)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn fetch_records(
        &self,
        kind: EntityKind,
        params: Value,
    ) -> Result<Vec<Map<String, Value>>> {
        let schema = kind.schema();
        let mut params = if params.is_null() { json!({}) } else { params };
        let map = params.as_object_mut().ok_or(ApiError::InvalidValue {
            field: "params",
            message: "request parameters must be a JSON object".to_string(),
        })?;
        for relation in schema.relations {
            if relation.eager && !map.contains_key(relation.select) {
                map.insert(relation.select.to_string(), Value::Bool(true));
            }
        }

        let result = self.call(&format!("{}.get", schema.api_name), params)?;
        let Value::Array(rows) = result else {
            return Err(ApiError::InvalidReply {
                message: format!("{}.get result is not a list", schema.api_name),
            }
            .into());
        };
        rows.into_iter()
            .map(|row| match row {
                Value::Object(record) => Ok(record),
                other => Err(ApiError::InvalidReply {
                    message: format!("{}.get returned a non-record entry: {other}", schema.api_name),
                }
                .into()),
            })
            .collect()
    }

    pub(crate) fn fetch_one_record(
        &self,
        kind: EntityKind,
        key: &str,
    ) -> Result<Option<Map<String, Value>>> {
        let schema = kind.schema();
        let params = if looks_like_id(key) {
            json!({ (schema.id_param()): key })
        } else {
            json!({ "filter": { (schema.text_field): key } })
        };
        let mut records = self.fetch_records(kind, params)?;
        match records.len() {
            0 => Ok(None),
            1 => Ok(records.pop()),
            matched => Err(ApiError::AmbiguousFilter { matched }.into()),
        }
    }
}

/// Append the JSON-RPC endpoint path to the server root.
fn endpoint_for(base: &Url) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("api_jsonrpc.php")
        .map_err(|err| {
            Error::Config(ConfigError::InvalidField {
                field: "server.url",
                message: err.to_string(),
            })
        })
}

/// True when `key` looks like a numeric identifier rather than a name.
fn looks_like_id(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}
