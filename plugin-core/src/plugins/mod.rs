//! Plugins: each one is a named set of domain methods served behind `ping`.

use serde_json::Value;

use crate::error::PluginError;
use crate::protocol::{Method, Params};

pub mod analyzer;
pub mod time;

pub use analyzer::OzonAnalyzer;
pub use time::TimePlugin;

pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// Domain methods this plugin answers. `ping` is handled by the dispatcher
    /// and need not be listed.
    fn methods(&self) -> &'static [Method];

    /// Only called with a method from [`Plugin::methods`].
    fn handle(&self, method: Method, params: &Params) -> Result<Value, PluginError>;
}

/// String parameter, or `None` if it is absent or not a string.
pub(crate) fn str_param<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}
