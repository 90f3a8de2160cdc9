//! Tracing subscriber setup
//!
//! The subscriber is installed before configuration is loaded so config
//! warnings are not lost. Its filter starts from `RUST_LOG` or the command
//! line level and is swapped for the resolved level once the TOML file has
//! been read, unless `RUST_LOG` is set.

use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Default level when nothing else is configured
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Handle used to replace the filter after configuration is resolved
pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Filter directive to start with: `RUST_LOG`, then the command line, then `info`
pub fn startup_directive(rust_log: Option<&str>, cli_level: Option<&str>) -> String {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .or(cli_level.filter(|v| !v.trim().is_empty()))
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .to_string()
}

/// Directive to switch to after configuration, or `None` to keep `RUST_LOG`
pub fn configured_directive(rust_log: Option<&str>, resolved_level: &str) -> Option<String> {
    match rust_log {
        Some(v) if !v.trim().is_empty() => None,
        _ => Some(resolved_level.to_string()),
    }
}

/// Install the global subscriber
pub fn init_tracing(cli_level: Option<&str>) -> FilterHandle {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directive = startup_directive(rust_log.as_deref(), cli_level);
    let (filter, handle) = reload::Layer::new(EnvFilter::new(directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    handle
}

/// Apply the resolved log level from configuration
pub fn apply_configured_level(handle: &FilterHandle, resolved_level: &str) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let Some(directive) = configured_directive(rust_log.as_deref(), resolved_level) else {
        return;
    };

    if let Err(e) = handle.reload(EnvFilter::new(&directive)) {
        tracing::warn!("Failed to apply log level {:?}: {}", directive, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_wins_at_startup() {
        assert_eq!(startup_directive(Some("debug"), Some("warn")), "debug");
    }

    #[test]
    fn test_cli_level_used_without_rust_log() {
        assert_eq!(startup_directive(None, Some("warn")), "warn");
        assert_eq!(startup_directive(Some("  "), Some("warn")), "warn");
    }

    #[test]
    fn test_default_level() {
        assert_eq!(startup_directive(None, None), DEFAULT_LOG_LEVEL);
        assert_eq!(startup_directive(None, Some("")), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_configured_level_replaces_startup_filter() {
        assert_eq!(configured_directive(None, "debug").as_deref(), Some("debug"));
        assert_eq!(configured_directive(Some(""), "debug").as_deref(), Some("debug"));
    }

    #[test]
    fn test_rust_log_is_kept_after_configuration() {
        assert!(configured_directive(Some("encore_snap=trace"), "info").is_none());
    }

    #[test]
    fn test_reload_handle_swaps_filter() {
        let (filter, handle) = reload::Layer::<EnvFilter, Registry>::new(EnvFilter::new("info"));
        let _subscriber = tracing_subscriber::registry().with(filter);

        handle.reload(EnvFilter::new("debug")).unwrap();
        let current = handle.with_current(|f| f.to_string()).unwrap();
        assert_eq!(current, "debug");
    }
}
