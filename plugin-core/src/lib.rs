//! Plugin processes that speak a line-delimited JSON request/response
//! protocol over stdin/stdout.

pub mod config;
pub mod error;
pub mod model;
pub mod parsers;
pub mod plugins;
pub mod protocol;
pub mod services;
