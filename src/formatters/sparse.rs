use crate::colors::{ColorMap, RESET};
use crate::error::FormatError;
use crate::formatters::{escape_line, Formatter, TemplateFormatter};
use crate::record::LogRecord;
use crate::template::Template;

/// Colors only the level name. Text before and after it stays in a
/// secondary style, so timestamps and logger names recede while the level
/// stands out.
pub struct SparseColorFormatter {
    left: Option<TemplateFormatter>,
    has_level: bool,
    right: TemplateFormatter,
    level_color_map: ColorMap,
    other_color_map: ColorMap,
}

impl SparseColorFormatter {
    pub fn new(template: &Template) -> Self {
        let split = template.split_around_level();
        Self {
            left: split.prefix.map(TemplateFormatter::new),
            has_level: split.has_level,
            right: TemplateFormatter::new(split.suffix),
            level_color_map: ColorMap::dim_to_back(),
            other_color_map: ColorMap::dim_or_normal(),
        }
    }
}

impl Formatter for SparseColorFormatter {
    fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        let level_style = self.level_color_map.color(record.severity);
        let other_style = self.other_color_map.color(record.severity);
        let mut out = String::new();

        // Traces belong at the end of the line, never in the prefix
        if let Some(left) = &self.left {
            let text = left.format(&record.without_exc_info())?;
            out.push_str(other_style);
            out.push_str(&escape_line(&text));
            out.push_str(RESET);
        }

        if self.has_level {
            out.push_str(level_style);
            out.push_str(record.severity.name());
            out.push_str(RESET);
        }

        let text = self.right.format(record)?;
        out.push_str(other_style);
        out.push_str(&escape_line(&text));
        out.push_str(RESET);

        Ok(out)
    }
}
