//! Stdio JSON-RPC 2.0 transport ("Wire protocol").
//!
//! Framing is deliberately the simplest thing that satisfies JSON-RPC 2.0
//! over stdio: one request object per line, one response object per line.
//! The transport's own framing detail is a collaborator concern; what
//! belongs here is only translating `{jsonrpc, method, params, id}` onto
//! [`leindex_orchestrator::dispatch::Request`] and `handle_request`'s
//! `Result` back onto `{result}` / `{error}`. Request timeouts are honored
//! by the orchestrator (`handle_request`'s deadline parameter), not by this
//! loop.

use std::sync::Arc;

use leindex_orchestrator::{handle_request, ErrorCategory, LeIndexError, ProjectRegistry, Request};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    method: String,
    #[serde(default)]
    params: Value,
    id: Value,
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
    id: Value,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
    data: Value,
}

impl From<&LeIndexError> for RpcError {
    fn from(err: &LeIndexError) -> Self {
        // JSON-RPC reserves -32768..-32000; application errors use -32000
        // downward, one code per category so clients can match on
        // `error.data.category` without parsing the message text.
        let code = match err.category {
            ErrorCategory::InvalidInput => -32000,
            ErrorCategory::NotFound => -32001,
            ErrorCategory::Unavailable => -32002,
            ErrorCategory::Timeout => -32003,
            ErrorCategory::Corrupted => -32004,
            ErrorCategory::Unsupported => -32005,
            ErrorCategory::Internal => -32006,
        };
        RpcError {
            code,
            message: err.message.clone(),
            data: serde_json::json!({
                "category": err.category.as_str(),
                "code": err.code,
                "remediation": err.remediation,
                "correlation_id": err.correlation_id,
            }),
        }
    }
}

fn parse_error(id: Value, message: impl Into<String>) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0",
        result: None,
        error: Some(RpcError {
            code: -32600,
            message: message.into(),
            data: Value::Null,
        }),
        id,
    }
}

/// One JSON-RPC method per op; `params` is the op's own parameter object,
/// matching `Request`'s `#[serde(tag = "op")]` shape minus the tag itself.
fn method_to_request(method: &str, params: Value) -> Result<Request, String> {
    let tagged = match method {
        "index" | "search" | "analyze" | "context" | "phase" => {
            let mut obj = match params {
                Value::Object(map) => map,
                Value::Null => serde_json::Map::new(),
                other => return Err(format!("params for {method} must be an object, got {other}")),
            };
            obj.insert("op".to_string(), Value::String(method.to_string()));
            Value::Object(obj)
        }
        "diagnostics" => serde_json::json!({"op": "diagnostics"}),
        other => return Err(format!("unknown method: {other}")),
    };
    serde_json::from_value(tagged).map_err(|e| format!("invalid params for {method}: {e}"))
}

/// Runs the JSON-RPC loop over stdin/stdout until stdin closes. Each line
/// is one complete request; each response is written as one complete line
/// before the next request is read, so output never interleaves.
pub async fn serve_stdio(registry: Arc<ProjectRegistry>) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(&registry, &line).await;
        let mut text = serde_json::to_string(&response)?;
        text.push('\n');
        stdout.write_all(text.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}

async fn handle_line(registry: &Arc<ProjectRegistry>, line: &str) -> RpcResponse {
    let parsed: RpcRequest = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(err) => return parse_error(Value::Null, format!("malformed JSON-RPC request: {err}")),
    };
    let id = parsed.id.clone();

    let request = match method_to_request(&parsed.method, parsed.params) {
        Ok(req) => req,
        Err(message) => return parse_error(id, message),
    };

    match handle_request(registry, request, None).await {
        Ok(response) => RpcResponse {
            jsonrpc: "2.0",
            result: Some(serde_json::to_value(response).unwrap_or(Value::Null)),
            error: None,
            id,
        },
        Err(err) => RpcResponse {
            jsonrpc: "2.0",
            result: None,
            error: Some(RpcError::from(&err)),
            id,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_to_request_rejects_unknown_method() {
        let err = method_to_request("frobnicate", Value::Null).unwrap_err();
        assert!(err.contains("unknown method"));
    }

    #[test]
    fn method_to_request_builds_diagnostics_with_no_params() {
        let req = method_to_request("diagnostics", Value::Null).unwrap();
        assert!(matches!(req, Request::Diagnostics));
    }

    #[test]
    fn method_to_request_builds_index_request() {
        let params = serde_json::json!({"project_path": "/tmp/proj", "force": true});
        let req = method_to_request("index", params).unwrap();
        match req {
            Request::Index { project_path, force } => {
                assert_eq!(project_path, std::path::PathBuf::from("/tmp/proj"));
                assert!(force);
            }
            other => panic!("expected Index, got {other:?}"),
        }
    }
}
