use crate::error::FormatError;
use crate::record::LogRecord;
use crate::template::Template;

/// Trait for turning a record into a single output line
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> Result<String, FormatError>;
}

pub mod plain;
#[cfg(feature = "rich")]
pub mod rich;
pub mod sparse;

pub use plain::ColorizingFormatter;
#[cfg(feature = "rich")]
pub use rich::RichFormatter;
pub use sparse::SparseColorFormatter;

/// Escape a line as a JSON string literal without the surrounding quotes,
/// so control characters show up as `\n`, `\t`, `\u0007` and friends.
pub fn escape_line(line: &str) -> String {
    let quoted = serde_json::Value::String(line.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// The standard template formatter. A failure trace, when present, follows
/// the rendered template on its own line.
#[derive(Debug, Clone)]
pub struct TemplateFormatter {
    template: Template,
}

impl TemplateFormatter {
    pub fn new(template: Template) -> Self {
        Self { template }
    }

    pub fn bare() -> Self {
        Self::new(Template::message_only())
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

impl Formatter for TemplateFormatter {
    fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        let mut out = self.template.render(record)?;
        if let Some(exc_text) = &record.exc_text {
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(exc_text);
        }
        Ok(out)
    }
}
