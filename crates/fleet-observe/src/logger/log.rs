use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::{Subscriber, level_filters::LevelFilter};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, MakeWriter, time::OffsetTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::logger::{
    config::{LogWriter, LoggerConfig},
    error::LoggerError,
};

/// Transport crates that log every request at debug.
const QUIET_DEPS: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "bollard=warn"];

pub struct Logger;

impl Logger {
    pub fn text(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        match cfg.writer {
            LogWriter::Stderr => text_to(cfg, std::io::stderr),
            LogWriter::Stdout => text_to(cfg, std::io::stdout),
        }
    }

    pub fn json(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        match cfg.writer {
            LogWriter::Stderr => json_to(cfg, std::io::stderr),
            LogWriter::Stdout => json_to(cfg, std::io::stdout),
        }
    }

    pub fn journald(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let filter = mk_filter(&cfg.level)?;
        mk_journald(filter)
    }
}

fn text_to<W>(cfg: &LoggerConfig, writer: W) -> Result<(), LoggerError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = mk_filter(&cfg.level)?;
    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(cfg.use_color)
        .with_target(cfg.with_targets)
        .with_timer(mk_timer());

    init_with(tracing_subscriber::registry().with(filter).with(fmt_layer))
}

fn json_to<W>(cfg: &LoggerConfig, writer: W) -> Result<(), LoggerError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = mk_filter(&cfg.level)?;
    let fmt_layer = fmt::layer()
        .json()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(cfg.with_targets)
        .with_timer(mk_timer());

    init_with(tracing_subscriber::registry().with(filter).with(fmt_layer))
}

/// Build the filter for `level`.
///
/// A bare level also quiets [`QUIET_DEPS`]; a full directive is taken as given.
pub(crate) fn mk_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    let level = level.trim();
    if level.is_empty() {
        return Err(LoggerError::InvalidLogLevel(level.to_string()));
    }
    let directive = if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        let bare = level
            .parse::<LevelFilter>()
            .map_err(|_| LoggerError::InvalidLogLevel(level.to_string()))?;
        std::iter::once(bare.to_string().to_ascii_lowercase())
            .chain(QUIET_DEPS.iter().map(|d| d.to_string()))
            .collect::<Vec<_>>()
            .join(",")
    };
    EnvFilter::builder()
        .parse(&directive)
        .map_err(|_| LoggerError::InvalidLogLevel(level.to_string()))
}

fn mk_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn as_error(e: impl std::fmt::Display) -> LoggerError {
    let s = e.to_string();
    if s.contains("SetGlobalDefaultError") || s.contains("global default trace dispatcher") {
        LoggerError::AlreadyInitialized
    } else {
        LoggerError::InitializationFailed(s)
    }
}

fn init_with<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(as_error)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn mk_journald(filter: EnvFilter) -> Result<(), LoggerError> {
    let journald = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?
        .with_syslog_identifier("fleet".to_string());
    init_with(tracing_subscriber::registry().with(filter).with(journald))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn mk_journald(_filter: EnvFilter) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}
