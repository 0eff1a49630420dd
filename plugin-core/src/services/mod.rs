pub mod catalog;
pub mod fingerprint;
pub mod scoring;
pub mod time_api;
