//! The read-dispatch-write loop.
//!
//! One request line in, exactly one response line out, strictly in order.
//! Every response is flushed before the next line is read so a supervising
//! process never waits on buffered output.

use std::any::Any;
use std::io::{BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

use clap::ValueEnum;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{Dispatcher, Request, Response, INTERNAL_ERROR};
use crate::error::{PluginError, ServerError};
use crate::plugins::Plugin;

/// Optional capability the supervising host hands to a plugin process at
/// startup. Plugins in this crate do not call into it yet.
pub trait HostBridge: Send + Sync {
    fn name(&self) -> &str;
}

/// What to do with a line that cannot be decoded, or a handler that panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MalformedLinePolicy {
    /// Answer with a `-32700` (or `-32603` for a panic) and keep serving.
    Recover,
    /// Emit one final `-32603` line and stop serving.
    Terminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// Input reached end-of-stream.
    EndOfInput,
    /// A malformed line or handler panic stopped the loop under
    /// [`MalformedLinePolicy::Terminate`].
    Fatal,
}

enum Outcome {
    Continue(Response),
    Stop(Response),
}

pub struct PluginServer {
    dispatcher: Dispatcher,
    host: Option<Box<dyn HostBridge>>,
    on_malformed: MalformedLinePolicy,
}

impl PluginServer {
    pub fn new(plugin: Box<dyn Plugin>) -> Self {
        PluginServer {
            dispatcher: Dispatcher::new(plugin),
            host: None,
            on_malformed: MalformedLinePolicy::Recover,
        }
    }

    pub fn with_host(mut self, host: Box<dyn HostBridge>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn on_malformed(mut self, policy: MalformedLinePolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    pub fn host(&self) -> Option<&dyn HostBridge> {
        self.host.as_deref()
    }

    pub fn run<R: BufRead, W: Write>(
        &self,
        mut input: R,
        mut output: W,
    ) -> Result<Shutdown, ServerError> {
        info!(
            plugin = self.dispatcher.plugin_name(),
            host = self.host().map(|h| h.name()).unwrap_or("none"),
            policy = ?self.on_malformed,
            "plugin server running"
        );

        let mut buf = Vec::new();
        let mut served = 0usize;
        let mut failed = 0usize;

        loop {
            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "stdin read failed");
                    let resp = Response::err(INTERNAL_ERROR, format!("Internal error: {e}"));
                    // Best effort: the stream is already broken.
                    let _ = write_line(&mut output, &resp);
                    return Err(ServerError::Read(e));
                }
            }

            // Undecodable bytes are a bad line, not a broken stream.
            let outcome = match std::str::from_utf8(strip_line_ending(&buf)) {
                Ok(line) if line.trim().is_empty() => {
                    debug!("skipping blank line");
                    continue;
                }
                Ok(line) => self.handle_line(line),
                Err(e) => {
                    warn!(error = %e, "request line is not valid UTF-8");
                    self.fail(PluginError::Parse(e.to_string()))
                }
            };

            match outcome {
                Outcome::Continue(resp) => {
                    served += 1;
                    if resp.is_error() {
                        failed += 1;
                    }
                    write_line(&mut output, &resp)?;
                }
                Outcome::Stop(resp) => {
                    write_line(&mut output, &resp)?;
                    error!("plugin server stopped after fatal request");
                    return Ok(Shutdown::Fatal);
                }
            }
        }

        info!(
            plugin = self.dispatcher.plugin_name(),
            served,
            failed,
            "input closed, shutting down"
        );
        Ok(Shutdown::EndOfInput)
    }

    fn handle_line(&self, line: &str) -> Outcome {
        let req = match serde_json::from_str::<Value>(line)
            .map_err(|e| PluginError::Parse(e.to_string()))
            .and_then(Request::from_value)
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "malformed request line");
                return self.fail(e);
            }
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.dispatcher.dispatch(&req)));

        match result {
            Ok(resp) => Outcome::Continue(resp),
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                error!(method = %req.method, panic = %msg, "handler panicked");
                let e = PluginError::Internal(msg);
                match self.on_malformed {
                    MalformedLinePolicy::Recover => Outcome::Continue(e.into()),
                    MalformedLinePolicy::Terminate => Outcome::Stop(e.into()),
                }
            }
        }
    }

    fn fail(&self, e: PluginError) -> Outcome {
        match self.on_malformed {
            MalformedLinePolicy::Recover => Outcome::Continue(e.into()),
            MalformedLinePolicy::Terminate => {
                let detail = match &e {
                    PluginError::Parse(d) => d.clone(),
                    other => other.to_string(),
                };
                Outcome::Stop(PluginError::Internal(detail).into())
            }
        }
    }
}

fn write_line<W: Write>(out: &mut W, resp: &Response) -> Result<(), ServerError> {
    let line = resp.to_line()?;
    writeln!(out, "{line}").map_err(ServerError::Write)?;
    out.flush().map_err(ServerError::Write)
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Method, Params};
    use serde_json::json;
    use std::io::Cursor;

    struct Flaky;

    impl Plugin for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn methods(&self) -> &'static [Method] {
            &[Method::GetTime]
        }

        fn handle(&self, _method: Method, params: &Params) -> Result<Value, PluginError> {
            if params.contains_key("explode") {
                panic!("kaboom");
            }
            Ok(json!("tick"))
        }
    }

    struct Parent;

    impl HostBridge for Parent {
        fn name(&self) -> &str {
            "browser-extension"
        }
    }

    fn run(server: &PluginServer, input: &str) -> (Shutdown, Vec<Value>) {
        run_bytes(server, input.as_bytes())
    }

    fn run_bytes(server: &PluginServer, input: &[u8]) -> (Shutdown, Vec<Value>) {
        let mut out = Vec::new();
        let shutdown = server.run(Cursor::new(input), &mut out).unwrap();
        let lines = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (shutdown, lines)
    }

    #[test]
    fn answers_each_line_in_order() {
        let server = PluginServer::new(Box::new(Flaky));
        let input = "{\"method\":\"get_time\"}\n{\"method\":\"ping\"}\n{\"method\":\"nope\"}\n";
        let (shutdown, lines) = run(&server, input);

        assert_eq!(shutdown, Shutdown::EndOfInput);
        assert_eq!(
            lines,
            vec![
                json!({"result": "tick"}),
                json!({"result": "pong"}),
                json!({"error": {"code": -32601, "message": "Method not found: nope"}}),
            ]
        );
    }

    #[test]
    fn empty_input_is_clean_shutdown() {
        let server = PluginServer::new(Box::new(Flaky));
        let (shutdown, lines) = run(&server, "");
        assert_eq!(shutdown, Shutdown::EndOfInput);
        assert!(lines.is_empty());
    }

    #[test]
    fn blank_lines_get_no_response() {
        let server = PluginServer::new(Box::new(Flaky));
        let (_, lines) = run(&server, "\n   \n{\"method\":\"ping\"}\n\n");
        assert_eq!(lines, vec![json!({"result": "pong"})]);
    }

    #[test]
    fn last_line_without_newline_is_served() {
        let server = PluginServer::new(Box::new(Flaky));
        let (_, lines) = run(&server, "{\"method\":\"ping\"}");
        assert_eq!(lines, vec![json!({"result": "pong"})]);
    }

    #[test]
    fn recover_policy_reports_parse_error_and_continues() {
        let server = PluginServer::new(Box::new(Flaky));
        let (shutdown, lines) = run(&server, "{not json\n[1,2]\n{\"method\":\"ping\"}\n");

        assert_eq!(shutdown, Shutdown::EndOfInput);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["error"]["code"], json!(-32700));
        assert!(lines[0]["error"]["message"].as_str().unwrap().starts_with("Parse error: "));
        assert_eq!(lines[1]["error"]["code"], json!(-32700));
        assert_eq!(
            lines[1]["error"]["message"],
            json!("Parse error: request must be a JSON object")
        );
        assert_eq!(lines[2], json!({"result": "pong"}));
    }

    #[test]
    fn invalid_utf8_line_is_a_parse_error_under_recover() {
        let server = PluginServer::new(Box::new(Flaky));
        let input = b"{\"method\":\"ping\"}\n{\"method\":\"p\xffng\"}\n{\"method\":\"ping\"}\n";
        let (shutdown, lines) = run_bytes(&server, input);

        assert_eq!(shutdown, Shutdown::EndOfInput);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], json!({"result": "pong"}));
        assert_eq!(lines[1]["error"]["code"], json!(-32700));
        assert!(lines[1]["error"]["message"].as_str().unwrap().starts_with("Parse error: "));
        assert_eq!(lines[2], json!({"result": "pong"}));
    }

    #[test]
    fn invalid_utf8_line_stops_loop_under_terminate() {
        let server =
            PluginServer::new(Box::new(Flaky)).on_malformed(MalformedLinePolicy::Terminate);
        let input = b"{\"method\":\"p\xffng\"}\n{\"method\":\"ping\"}\n";
        let (shutdown, lines) = run_bytes(&server, input);

        assert_eq!(shutdown, Shutdown::Fatal);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["error"]["code"], json!(-32603));
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let server = PluginServer::new(Box::new(Flaky));
        let (_, lines) = run_bytes(&server, b"{\"method\":\"ping\"}\r\n\r\n");
        assert_eq!(lines, vec![json!({"result": "pong"})]);
    }

    #[test]
    fn terminate_policy_stops_after_one_internal_error() {
        let server =
            PluginServer::new(Box::new(Flaky)).on_malformed(MalformedLinePolicy::Terminate);
        let input = "{\"method\":\"ping\"}\n{oops\n{\"method\":\"ping\"}\n";
        let (shutdown, lines) = run(&server, input);

        assert_eq!(shutdown, Shutdown::Fatal);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], json!({"result": "pong"}));
        assert_eq!(lines[1]["error"]["code"], json!(-32603));
        assert!(lines[1]["error"]["message"].as_str().unwrap().starts_with("Internal error: "));
    }

    #[test]
    fn handler_panic_becomes_internal_error() {
        let server = PluginServer::new(Box::new(Flaky));
        let input = "{\"method\":\"get_time\",\"params\":{\"explode\":1}}\n{\"method\":\"ping\"}\n";
        let (shutdown, lines) = run(&server, input);

        assert_eq!(shutdown, Shutdown::EndOfInput);
        assert_eq!(
            lines[0],
            json!({"error": {"code": -32603, "message": "Internal error: kaboom"}})
        );
        assert_eq!(lines[1], json!({"result": "pong"}));
    }

    #[test]
    fn handler_panic_under_terminate_stops_loop() {
        let server =
            PluginServer::new(Box::new(Flaky)).on_malformed(MalformedLinePolicy::Terminate);
        let input = "{\"method\":\"get_time\",\"params\":{\"explode\":1}}\n{\"method\":\"ping\"}\n";
        let (shutdown, lines) = run(&server, input);

        assert_eq!(shutdown, Shutdown::Fatal);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn host_bridge_is_optional_and_injected() {
        let bare = PluginServer::new(Box::new(Flaky));
        assert!(bare.host().is_none());

        let hosted = PluginServer::new(Box::new(Flaky)).with_host(Box::new(Parent));
        assert_eq!(hosted.host().map(|h| h.name()), Some("browser-extension"));

        let (_, lines) = run(&hosted, "{\"method\":\"ping\"}\n");
        assert_eq!(lines, vec![json!({"result": "pong"})]);
    }
}
