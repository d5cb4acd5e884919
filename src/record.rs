use crate::severity::Severity;
use chrono::{DateTime, Local};
use log::kv::{Key, Source};
use once_cell::sync::Lazy;
use std::time::Instant;

/// Reference point for `%(relativeCreated)d`
static START: Lazy<Instant> = Lazy::new(Instant::now);

/// Key-value carrying a pre-rendered failure trace on a facade record
pub const EXC_INFO_KEY: &str = "exc_info";
/// Key-value that promotes an error-level facade record to CRITICAL
pub const CRITICAL_KEY: &str = "critical";

/// A single log event as seen by formatters
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
    /// Logger name; the facade target for records coming through `log`
    pub name: String,
    pub module: Option<String>,
    pub pathname: Option<String>,
    pub lineno: Option<u32>,
    pub created: DateTime<Local>,
    pub relative_created_ms: u128,
    pub thread_name: String,
    pub process_id: u32,
    /// Rendered failure trace, appended after the message
    pub exc_text: Option<String>,
}

impl LogRecord {
    pub fn new(severity: Severity, name: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            name: name.to_string(),
            module: None,
            pathname: None,
            lineno: None,
            created: Local::now(),
            relative_created_ms: START.elapsed().as_millis(),
            thread_name: std::thread::current()
                .name()
                .unwrap_or("<unnamed>")
                .to_string(),
            process_id: std::process::id(),
            exc_text: None,
        }
    }

    pub fn with_location(mut self, pathname: &str, lineno: u32) -> Self {
        self.pathname = Some(pathname.to_string());
        self.lineno = Some(lineno);
        self
    }

    pub fn with_module(mut self, module: &str) -> Self {
        self.module = Some(module.to_string());
        self
    }

    pub fn with_exc_text(mut self, exc_text: impl Into<String>) -> Self {
        self.exc_text = Some(exc_text.into());
        self
    }

    /// Copy of the record without its failure trace
    pub fn without_exc_info(&self) -> Self {
        let mut record = self.clone();
        record.exc_text = None;
        record
    }

    /// Synthetic record used to validate format templates
    pub fn sample() -> Self {
        LogRecord::new(Severity::Info, "name", "msg").with_location("pathname", 0)
    }

    pub fn filename(&self) -> Option<&str> {
        self.pathname
            .as_deref()
            .map(|p| p.rsplit(['/', '\\']).next().unwrap_or(p))
    }
}

impl From<&log::Record<'_>> for LogRecord {
    fn from(record: &log::Record<'_>) -> Self {
        let kvs = record.key_values();
        let mut severity = Severity::from(record.level());
        if severity == Severity::Error
            && kvs
                .get(Key::from_str(CRITICAL_KEY))
                .and_then(|v| v.to_bool())
                .unwrap_or(false)
        {
            severity = Severity::Critical;
        }

        let mut out = LogRecord::new(severity, record.target(), record.args().to_string());
        out.module = record.module_path().map(str::to_string);
        out.pathname = record.file().map(str::to_string);
        out.lineno = record.line();
        out.exc_text = kvs.get(Key::from_str(EXC_INFO_KEY)).map(|v| v.to_string());
        out
    }
}

/// One record per severity, one with control characters and one carrying a
/// failure trace
pub fn sample_records() -> Vec<LogRecord> {
    let record = |severity, message: &str| {
        LogRecord::new(severity, "samples", message)
            .with_location("src/samples.rs", 1)
            .with_module("samples")
    };
    vec![
        record(Severity::Debug, "A debug message"),
        record(Severity::Info, "An info message"),
        record(
            Severity::Info,
            "Another info message. This one contains special characters: \n\t\r\u{8}\u{c}\u{b}\u{7}...",
        ),
        record(Severity::Warning, "A warning message"),
        record(Severity::Error, "An error message"),
        record(Severity::Critical, "A critical message"),
        record(Severity::Error, "A exception message").with_exc_text(
            "Traceback (most recent call last):\n  in samples\nError: Oops",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_exc_info_keeps_everything_else() {
        let record = LogRecord::new(Severity::Error, "app", "boom").with_exc_text("trace");
        let stripped = record.without_exc_info();
        assert!(stripped.exc_text.is_none());
        assert_eq!(stripped.message, "boom");
        assert_eq!(stripped.severity, Severity::Error);
        assert_eq!(record.exc_text.as_deref(), Some("trace"));
    }

    #[test]
    fn test_filename_from_pathname() {
        let record = LogRecord::new(Severity::Info, "app", "m").with_location("src/a/b.rs", 3);
        assert_eq!(record.filename(), Some("b.rs"));
        let record = LogRecord::new(Severity::Info, "app", "m");
        assert_eq!(record.filename(), None);
    }

    #[test]
    fn test_from_facade_record() {
        let kvs: [(&str, &str); 1] = [(EXC_INFO_KEY, "Traceback")];
        let record = log::Record::builder()
            .args(format_args!("hello {}", 42))
            .level(log::Level::Warn)
            .target("my_app::db")
            .file(Some("src/db.rs"))
            .line(Some(12))
            .module_path(Some("my_app::db"))
            .key_values(&kvs)
            .build();
        let converted = LogRecord::from(&record);
        assert_eq!(converted.severity, Severity::Warning);
        assert_eq!(converted.message, "hello 42");
        assert_eq!(converted.name, "my_app::db");
        assert_eq!(converted.lineno, Some(12));
        assert_eq!(converted.exc_text.as_deref(), Some("Traceback"));
    }

    #[test]
    fn test_critical_marker() {
        let kvs: [(&str, bool); 1] = [(CRITICAL_KEY, true)];
        let record = log::Record::builder()
            .args(format_args!("down"))
            .level(log::Level::Error)
            .key_values(&kvs)
            .build();
        assert_eq!(LogRecord::from(&record).severity, Severity::Critical);
    }

    #[test]
    fn test_gallery_covers_every_severity() {
        let records = sample_records();
        for severity in Severity::ALL {
            assert!(records.iter().any(|r| r.severity == severity));
        }
        assert!(records.iter().any(|r| r.exc_text.is_some()));
    }
}
