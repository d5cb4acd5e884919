use crate::colors::{DIM, RESET};
use crate::error::FormatError;
use crate::formatters::{Formatter, TemplateFormatter};
use crate::record::LogRecord;
use crate::severity::Severity;
use terminal_size::{terminal_size, Width};

const TIME_WIDTH: usize = 11; // "[HH:MM:SS] "
const LEVEL_WIDTH: usize = 9; // "CRITICAL "
const DEFAULT_WIDTH: usize = 80;

/// Column layout: time, level, message, and the source location pushed to
/// the right edge of the terminal. Multi-line messages keep their line
/// breaks and are indented under the message column.
pub struct RichFormatter {
    inner: TemplateFormatter,
    style_output: bool,
    width: usize,
}

impl RichFormatter {
    pub fn new(inner: TemplateFormatter, style_output: bool) -> Self {
        // Get terminal width, default to 80 if not available
        let width = if let Some((Width(w), _)) = terminal_size() {
            w as usize
        } else {
            DEFAULT_WIDTH
        };
        Self::with_width(inner, style_output, width)
    }

    pub fn with_width(inner: TemplateFormatter, style_output: bool, width: usize) -> Self {
        Self {
            inner,
            style_output,
            width,
        }
    }

    fn level_style(severity: Severity) -> &'static str {
        match severity {
            Severity::Debug => "\x1b[32m",
            Severity::Info => "\x1b[34m",
            Severity::Warning => "\x1b[31m",
            Severity::Error => "\x1b[1m\x1b[31m",
            Severity::Critical => "\x1b[1m\x1b[7m\x1b[31m",
        }
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.style_output && !style.is_empty() {
            format!("{}{}{}", style, text, RESET)
        } else {
            text.to_string()
        }
    }
}

impl Formatter for RichFormatter {
    fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        let message = self.inner.format(record)?;
        let time = format!("[{}]", record.created.format("%H:%M:%S"));
        let level = format!("{:<width$}", record.severity.name(), width = LEVEL_WIDTH - 1);
        let location = match (record.filename(), record.lineno) {
            (Some(file), Some(line)) => format!("{}:{}", file, line),
            (Some(file), None) => file.to_string(),
            _ => String::new(),
        };

        let mut lines = message.split('\n');
        let first = lines.next().unwrap_or_default();

        let used = TIME_WIDTH + LEVEL_WIDTH + first.chars().count();
        let location_len = location.chars().count();
        let gap = if location.is_empty() {
            0
        } else if used + 1 + location_len <= self.width {
            self.width - used - location_len
        } else {
            1
        };

        let mut out = format!(
            "{} {} {}",
            self.styled(DIM, &time),
            self.styled(Self::level_style(record.severity), &level),
            first
        );
        if !location.is_empty() {
            out.push_str(&" ".repeat(gap));
            out.push_str(&self.styled(DIM, &location));
        }

        let indent = " ".repeat(TIME_WIDTH + LEVEL_WIDTH);
        for line in lines {
            out.push('\n');
            out.push_str(&indent);
            out.push_str(line);
        }

        Ok(out)
    }
}
