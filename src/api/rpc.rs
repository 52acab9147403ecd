use serde::{Deserialize, Serialize};
use serde_json::Value;

const BODY_PREVIEW_LIMIT: usize = 256;

/// One decoded reply. Exactly one of `result` / `error` is expected to be
/// present; the session turns anything else into an invalid-reply failure.
#[derive(Debug, Deserialize)]
pub(super) struct RpcEnvelope<T> {
    #[allow(dead_code)]
    pub(super) jsonrpc: String,
    pub(super) result: Option<T>,
    pub(super) error: Option<RpcError>,
    #[allow(dead_code)]
    pub(super) id: Value,
}

#[derive(Debug, Deserialize)]
pub(super) struct RpcError {
    pub(super) code: i64,
    pub(super) message: String,
    #[serde(default)]
    pub(super) data: Option<String>,
}

/// `auth` serializes as `null` until a login has stored a token.
#[derive(Serialize)]
pub(super) struct RpcRequest<'a> {
    pub(super) jsonrpc: &'static str,
    pub(super) method: &'a str,
    pub(super) params: Value,
    pub(super) id: u64,
    pub(super) auth: Option<&'a str>,
}

pub(super) fn body_preview(body: &[u8]) -> String {
    if body.is_empty() {
        return "<empty>".to_string();
    }
    let end = body.len().min(BODY_PREVIEW_LIMIT);
    let mut preview = String::from_utf8_lossy(&body[..end]).to_string();
    if body.len() > BODY_PREVIEW_LIMIT {
        preview.push_str("...");
    }
    preview.replace('\n', "\\n")
}
