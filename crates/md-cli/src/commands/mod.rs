//! CLI command implementations

mod config;
mod connect;
mod input;
mod metrics;
mod qr;
mod screen;

pub use config::{config_init, config_path, config_show, load_client_config};
pub use connect::{connect, pair_command, probe_command, resolve_target};
pub use input::{exec_command, parse_key_value, send_command};
pub use metrics::metrics_command;
pub use qr::qr_command;
pub use screen::{screenshot_command, watch_command};
