use std::fmt;
use std::fmt::Write;
use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::{prelude::*, EnvFilter};

use super::app_config::config;
use super::error::Result;

pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
    pub use tracing::{debug_span, error_span, info_span, trace_span, warn_span};
    pub use tracing::{event, field::Empty, instrument, span};
}

pub fn setup() -> Result<GlobalLoggingContext> {
    GlobalLoggingContext::new()
}

/// This needs to be held in main
pub struct GlobalLoggingContext {
    worker_guards: Vec<WorkerGuard>,
}

impl GlobalLoggingContext {
    pub fn new() -> Result<Self> {
        let cfg: LoggingConfig = config().get("logging").unwrap_or_default();

        let mut worker_guards = vec![];
        let mut writer = |writer: NonBlocking, guard| {
            worker_guards.push(guard);
            writer
        };

        let (term, guard) = NonBlockingBuilder::default()
            .lossy(false)
            .finish(std::io::stderr());
        let term_layer = FmtLayer::default()
            .with_ansi(true)
            .with_target(false)
            .with_timer(ISOTimeFormat)
            .with_writer(writer(term, guard));

        let file_layer = cfg.file.as_ref().map(|file| {
            let (appender, guard) = NonBlockingBuilder::default().lossy(false).finish(
                tracing_appender::rolling::RollingFileAppender::new(
                    Rotation::NEVER,
                    &file.directory,
                    &file.name,
                ),
            );
            FmtLayer::default()
                .with_ansi(false)
                .with_target(false)
                .with_timer(ISOTimeFormat)
                .with_writer(writer(appender, guard))
        });

        tracing_subscriber::registry()
            .with(cfg.filter.to_env_filter())
            .with(term_layer)
            .with(file_layer)
            .try_init()?;

        Ok(GlobalLoggingContext { worker_guards })
    }
}

struct ISOTimeFormat;

impl FormatTime for ISOTimeFormat {
    fn format_time(&self, w: &mut dyn Write) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

// ====== Config to Layer ======

impl FilterConfig {
    pub fn to_env_filter(&self) -> EnvFilter {
        let filter = match &self.from_env {
            Some(env) => EnvFilter::from_env(env),
            None => EnvFilter::default(),
        };

        if let Some(dirs) = &self.directives {
            dirs.split(',')
                .filter_map(|s| match s.parse() {
                    Ok(d) => Some(d),
                    Err(err) => {
                        eprintln!("ignoring `{}`: {}", s, err);
                        None
                    }
                })
                .fold(filter, |f, dir| f.add_directive(dir))
        } else {
            filter
        }
    }
}

// ====== Logging Config ======

#[derive(Debug, Default, serde::Deserialize)]
struct LoggingConfig {
    #[serde(default)]
    filter: FilterConfig,
    /// extra file output, disabled unless configured
    #[serde(default)]
    file: Option<FileOutput>,
}

#[derive(Debug, serde::Deserialize)]
struct FilterConfig {
    #[serde(default)]
    directives: Option<String>,
    #[serde(default)]
    from_env: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct FileOutput {
    directory: PathBuf,
    name: PathBuf,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            directives: Some("info".into()),
            from_env: Some("RUST_LOG".into()),
        }
    }
}
