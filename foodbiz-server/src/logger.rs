//! Logging setup
//!
//! `RUST_LOG` overrides the default filter. Output is plain text or JSON,
//! to stdout or to a daily rolling file when a log directory exists.

use std::path::Path;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "foodbiz_server=info,tower_http=info";

/// Log output settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub json: bool,
    pub log_dir: Option<String>,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logger(settings: &LogSettings) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false);

    if let Some(dir) = settings.log_dir.as_deref()
        && Path::new(dir).is_dir()
    {
        let file_appender = tracing_appender::rolling::daily(dir, "foodbiz-server");
        let builder = builder.with_writer(file_appender).with_ansi(false);
        if settings.json {
            builder.json().init();
        } else {
            builder.init();
        }
        return;
    }

    if settings.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
