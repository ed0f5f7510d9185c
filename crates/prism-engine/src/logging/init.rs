use std::sync::Once;

/// Default filter when neither the config nor `RUST_LOG` provides one.
///
/// wgpu and naga are chatty at `info`; keep them at `warn`.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "prism_engine=debug,wgpu_core=warn").
///
/// `write_style` controls ANSI coloring behavior.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// This function is idempotent; subsequent calls are ignored.
/// Intended usage is early in `main`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&resolve_filter(config.env_filter, std::env::var("RUST_LOG").ok()));
        builder.write_style(config.write_style);

        // A logger may already be installed by a test harness; that is not an error here.
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized");
    });
}

/// Filter precedence: explicit config, then `RUST_LOG`, then [`DEFAULT_FILTER`].
///
/// A blank source counts as absent.
fn resolve_filter(configured: Option<String>, from_env: Option<String>) -> String {
    let given = |f: &String| !f.trim().is_empty();
    configured
        .filter(given)
        .or_else(|| from_env.filter(given))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}
