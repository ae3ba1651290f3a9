//! Process-wide logging setup.

/// Install the `env_logger` backend for the `log` facade.
///
/// Defaults to `info`; `RUST_LOG` overrides (e.g. `RUST_LOG=ar_placement=trace`).
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}
