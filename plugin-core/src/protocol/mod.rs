//! Wire shapes and method dispatch for the line-delimited JSON protocol.
//!
//! A request line is `{"method": "...", "params": {...}}`; a response line is
//! either `{"result": ...}` or `{"error": {"code": ..., "message": "..."}}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::PluginError;
use crate::plugins::Plugin;

mod method;
pub mod server;

pub use method::Method;

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

pub type Params = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub params: Params,
}

impl Request {
    /// Builds a request from a decoded line. A missing `method` becomes the
    /// empty name (which nothing registers) and a missing or non-object
    /// `params` becomes an empty mapping.
    pub fn from_value(req: Value) -> Result<Self, PluginError> {
        let Value::Object(mut obj) = req else {
            return Err(PluginError::Parse("request must be a JSON object".into()));
        };

        let method = obj
            .get("method")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let params = match obj.remove("params") {
            Some(Value::Object(p)) => p,
            _ => Params::new(),
        };

        Ok(Request { method, params })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Success { result: Value },
    Failure { error: ErrorObject },
}

impl Response {
    pub fn ok(result: Value) -> Self {
        Response::Success { result }
    }

    pub fn err(code: i64, message: impl Into<String>) -> Self {
        Response::Failure {
            error: ErrorObject {
                code,
                message: message.into(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Failure { .. })
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<PluginError> for Response {
    fn from(e: PluginError) -> Self {
        Response::err(e.code(), e.to_string())
    }
}

/// Routes a request to `ping` or to the domain methods one plugin registers.
pub struct Dispatcher {
    plugin: Box<dyn Plugin>,
}

impl Dispatcher {
    pub fn new(plugin: Box<dyn Plugin>) -> Self {
        Dispatcher { plugin }
    }

    pub fn plugin_name(&self) -> &'static str {
        self.plugin.name()
    }

    pub fn dispatch(&self, req: &Request) -> Response {
        let method = Method::from(req.method.as_str());
        debug!(plugin = self.plugin.name(), method = %req.method, "dispatching request");

        if method == Method::Ping {
            return Response::ok(json!("pong"));
        }

        if method == Method::Unknown || !self.plugin.methods().contains(&method) {
            warn!(plugin = self.plugin.name(), method = %req.method, "method not found");
            return PluginError::MethodNotFound(req.method.clone()).into();
        }

        match self.plugin.handle(method, &req.params) {
            Ok(result) => Response::ok(result),
            Err(e) => {
                warn!(
                    plugin = self.plugin.name(),
                    method = %req.method,
                    code = e.code(),
                    error = %e,
                    "handler failed"
                );
                e.into()
            }
        }
    }
}
