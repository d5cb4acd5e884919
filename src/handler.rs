use crate::error::{ConfigError, EmitError, FormatError};
use crate::formatters::{ColorizingFormatter, Formatter, SparseColorFormatter, TemplateFormatter};
use crate::record::LogRecord;
use crate::template::Template;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

#[cfg(feature = "rich")]
use crate::formatters::RichFormatter;

/// The closed set of handler flavors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Whole line escaped and tinted by severity
    Plain { style_output: bool },
    /// Only the level name colored
    Sparse,
    /// Column layout with time, level and source location
    #[cfg(feature = "rich")]
    Rich { style_output: bool },
}

impl HandlerKind {
    /// Map a `LOG_HANDLER` selector to a kind. `style_output` applies to the
    /// kinds that auto-detect styling.
    pub fn from_selector(name: &str, style_output: bool) -> Result<Self, ConfigError> {
        match name {
            "plain" => Ok(HandlerKind::Plain { style_output }),
            "sparse" => Ok(HandlerKind::Sparse),
            #[cfg(feature = "rich")]
            "rich" => Ok(HandlerKind::Rich { style_output }),
            #[cfg(not(feature = "rich"))]
            "rich" => Err(ConfigError::HandlerUnavailable {
                name: name.to_string(),
                hint: "build with the `rich` cargo feature to enable this handler".to_string(),
            }),
            _ => Err(ConfigError::InvalidHandler(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HandlerKind::Plain { .. } => "plain",
            HandlerKind::Sparse => "sparse",
            #[cfg(feature = "rich")]
            HandlerKind::Rich { .. } => "rich",
        }
    }

    /// Formatter this kind uses for a template. A sparse handler swaps in
    /// its own formatter built from the template text.
    pub fn formatter_for(&self, template: &Template) -> Box<dyn Formatter> {
        let standard = TemplateFormatter::new(template.clone());
        match *self {
            HandlerKind::Plain { style_output } => {
                Box::new(ColorizingFormatter::new(standard, style_output))
            }
            HandlerKind::Sparse => Box::new(SparseColorFormatter::new(template)),
            #[cfg(feature = "rich")]
            HandlerKind::Rich { style_output } => Box::new(RichFormatter::new(standard, style_output)),
        }
    }

    /// Formatter used when none is configured
    fn fallback(&self) -> Box<dyn Formatter> {
        match self {
            HandlerKind::Sparse => Box::new(TemplateFormatter::bare()),
            other => other.formatter_for(&Template::message_only()),
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Writes one formatted line per record to a stream, stderr by default
pub struct StreamHandler {
    kind: HandlerKind,
    formatter: Option<Box<dyn Formatter>>,
    fallback: Box<dyn Formatter>,
    stream: Mutex<Box<dyn Write + Send>>,
}

impl StreamHandler {
    pub fn new(kind: HandlerKind) -> Self {
        Self {
            kind,
            formatter: None,
            fallback: kind.fallback(),
            stream: Mutex::new(Box::new(io::stderr())),
        }
    }

    pub fn plain(style_output: bool) -> Self {
        Self::new(HandlerKind::Plain { style_output })
    }

    pub fn sparse() -> Self {
        Self::new(HandlerKind::Sparse)
    }

    #[cfg(feature = "rich")]
    pub fn rich(style_output: bool) -> Self {
        Self::new(HandlerKind::Rich { style_output })
    }

    /// Redirect output, e.g. to a file or an in-memory buffer
    pub fn with_stream<W: Write + Send + 'static>(mut self, stream: W) -> Self {
        self.stream = Mutex::new(Box::new(stream));
        self
    }

    pub fn with_template(mut self, template: &Template) -> Self {
        self.set_template(Some(template));
        self
    }

    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    pub fn has_formatter(&self) -> bool {
        self.formatter.is_some()
    }

    /// Install the kind's formatter for `template`, or clear it with `None`
    pub fn set_template(&mut self, template: Option<&Template>) {
        self.formatter = template.map(|t| self.kind.formatter_for(t));
    }

    /// Replace the formatter outright
    pub fn set_formatter(&mut self, formatter: Option<Box<dyn Formatter>>) {
        self.formatter = formatter;
    }

    pub fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        self.formatter
            .as_deref()
            .unwrap_or(self.fallback.as_ref())
            .format(record)
    }

    pub fn emit(&self, record: &LogRecord) -> Result<(), EmitError> {
        let line = self.format(record)?;
        let mut stream = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(stream, "{}", line)?;
        stream.flush()?;
        Ok(())
    }

    pub fn flush(&self) -> io::Result<()> {
        self.stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

impl fmt::Debug for StreamHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandler")
            .field("kind", &self.kind)
            .field("has_formatter", &self.formatter.is_some())
            .finish()
    }
}
