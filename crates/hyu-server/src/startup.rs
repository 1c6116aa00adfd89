//! Server startup utilities.

use hyu_config::{AppConfig, ObservabilityConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset; `{level}` comes from the config.
fn default_filter(level: &str) -> String {
    format!("{level},hyu=debug,tower_http=debug")
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Returns `false` when a
/// subscriber was already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).try_init()
    };
    result.is_ok()
}

/// Prints the startup banner.
pub fn print_banner() {
    info!(
        r#"
    __
   / /_  __  ____  __
  / __ \/ / / / / / /
 / / / / /_/ / /_/ /
/_/ /_/\__, /\__,_/
      /____/
    "#
    );
}

/// Prints server startup information.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    let addr = config.server.addr();
    info!("{}", separator);
    info!("Environment: {}", config.app.environment);
    info!("REST API:    http://{}/api", addr);
    info!("Health:      http://{}/health", addr);
    info!("API Docs:    http://{}/swagger-ui", addr);
    info!(
        "Scheduler:   {}",
        if config.scheduler.enabled { "enabled" } else { "disabled" }
    );
    info!("{}", separator);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_keeps_crate_debug() {
        assert_eq!(default_filter("warn"), "warn,hyu=debug,tower_http=debug");
    }

    #[test]
    fn test_second_init_reports_false() {
        let config = ObservabilityConfig::default();
        let _ = init_tracing(&config);
        assert!(!init_tracing(&config));
    }

    #[test]
    fn test_print_startup_info_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_banner();
        print_startup_info(&AppConfig::default());
    }
}
