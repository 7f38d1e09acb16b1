//! Tracing subscriber setup

use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Unknown names fall back to pretty
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Filter directives: `RUST_LOG` wins, then the configured level for this
/// crate, with `extra` appended (e.g. `tower_http=debug` for the server).
pub fn filter_directives(config: &LoggingConfig, extra: &str) -> String {
    let mut directives = format!("gaugeboard={}", config.level);
    if !extra.is_empty() {
        directives.push(',');
        directives.push_str(extra);
    }
    directives
}

/// Install the global subscriber. Safe to call once per process.
pub fn init(config: &LoggingConfig, extra: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config, extra)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match LogFormat::parse(&config.format) {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    if let Err(e) = result {
        eprintln!("Logging already initialised: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Pretty);
    }

    #[test]
    fn test_filter_directives() {
        let config = LoggingConfig {
            level: "debug".into(),
            format: "pretty".into(),
        };
        assert_eq!(filter_directives(&config, ""), "gaugeboard=debug");
        assert_eq!(
            filter_directives(&config, "tower_http=debug"),
            "gaugeboard=debug,tower_http=debug"
        );
    }
}
