use crate::colors::ColorMap;
use crate::error::FormatError;
use crate::formatters::{escape_line, Formatter, TemplateFormatter};
use crate::record::LogRecord;

/// Whole-line colorizer: renders with the standard formatter, escapes the
/// result onto a single line and tints it by severity.
pub struct ColorizingFormatter {
    inner: TemplateFormatter,
    style_output: bool,
    color_map: ColorMap,
}

impl ColorizingFormatter {
    pub fn new(inner: TemplateFormatter, style_output: bool) -> Self {
        Self {
            inner,
            style_output,
            color_map: ColorMap::dim_to_bright(),
        }
    }

    pub fn style_output(&self) -> bool {
        self.style_output
    }
}

impl Formatter for ColorizingFormatter {
    fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        let escaped = escape_line(&self.inner.format(record)?);
        if self.style_output {
            Ok(self.color_map.colored(record.severity, &escaped))
        } else {
            Ok(escaped)
        }
    }
}
