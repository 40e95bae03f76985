//! Port traits the domain depends on.

pub mod config_port;
pub mod kv_port;
pub mod provider_port;
pub mod report_port;
