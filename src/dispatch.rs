//! The process-wide backend behind the `log` facade.
//!
//! A single static dispatcher is registered with `log::set_logger` the first
//! time a configuration is applied. Later configurations replace the
//! dispatcher's settings wholesale; the facade registration never changes.

use crate::config::Settings;
use crate::error::{ConfigError, EmitError};
use crate::record::LogRecord;
use crate::severity::Severity;
use log::{Log, Metadata, Record};
use once_cell::sync::{Lazy, OnceCell};
use std::sync::{PoisonError, RwLock};

static DISPATCHER: Dispatcher = Dispatcher;
static STATE: Lazy<RwLock<Option<Settings>>> = Lazy::new(|| RwLock::new(None));
static INSTALLED: OnceCell<bool> = OnceCell::new();

/// Summary of the applied configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSettings {
    pub format: String,
    pub level: Severity,
    pub handlers: Vec<&'static str>,
}

struct Dispatcher;

impl Log for Dispatcher {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let state = STATE.read().unwrap_or_else(PoisonError::into_inner);
        match state.as_ref() {
            // Error-level records may carry the critical marker, so a
            // CRITICAL threshold still lets them through to `handle`
            Some(settings) => Severity::from(metadata.level()) >= settings.level.min(Severity::Error),
            None => false,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        handle(&LogRecord::from(record));
    }

    fn flush(&self) {
        let state = STATE.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(settings) = state.as_ref() {
            for handler in &settings.handlers {
                let _ = handler.flush();
            }
        }
    }
}

fn install() -> Result<(), ConfigError> {
    let installed = INSTALLED.get_or_init(|| log::set_logger(&DISPATCHER).is_ok());
    if *installed {
        Ok(())
    } else {
        Err(ConfigError::LoggerAlreadySet)
    }
}

/// Make `settings` the active configuration, replacing any previous one
pub fn apply(settings: Settings) -> Result<(), ConfigError> {
    install()?;
    let level = settings.level;
    let previous = {
        let mut state = STATE.write().unwrap_or_else(PoisonError::into_inner);
        state.replace(settings)
    };
    log::set_max_level(level.to_level_filter());

    if let Some(previous) = previous {
        for handler in &previous.handlers {
            let _ = handler.flush();
        }
    }
    Ok(())
}

/// Send a record to every configured handler, subject to the configured
/// level. This is also the way to emit CRITICAL records.
pub fn handle(record: &LogRecord) {
    let state = STATE.read().unwrap_or_else(PoisonError::into_inner);
    let Some(settings) = state.as_ref() else {
        return;
    };
    if record.severity < settings.level {
        return;
    }
    for handler in &settings.handlers {
        if let Err(e) = handler.emit(record) {
            report_emit_error(&e, record);
        }
    }
}

pub fn is_configured() -> bool {
    STATE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

pub fn current_settings() -> Option<AppliedSettings> {
    let state = STATE.read().unwrap_or_else(PoisonError::into_inner);
    state.as_ref().map(|settings| AppliedSettings {
        format: settings.format.source().to_string(),
        level: settings.level,
        handlers: settings.handlers.iter().map(|h| h.kind().name()).collect(),
    })
}

/// Emit failures must not take the caller down; report them on stderr
fn report_emit_error(error: &EmitError, record: &LogRecord) {
    eprintln!("--- Logging error ---");
    eprintln!("{}", error);
    eprintln!("Message: {:?}", record.message);
    eprintln!("Logger: {} ({})", record.name, record.severity);
}
