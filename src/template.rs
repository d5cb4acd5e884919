//! %-style format templates, e.g. `%(asctime)s %(levelname)-8s %(message)s`.
//!
//! A template is parsed once into literal and field segments and rendered
//! against a [`LogRecord`] for every event.

use crate::error::FormatError;
use crate::record::LogRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// `%(key)flags width .precision conversion`, anchored at a `%`
static FIELD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^%\((?P<key>[^)]*)\)(?P<flags>[#0+ -]*)(?P<width>\*|\d+)?(?:\.(?P<precision>\*|\d*))?(?P<conversion>.)?")
        .unwrap()
});

const CONVERSIONS: &str = "diuoxXeEfFgGcrsa";

/// Largest width or precision a field may request
pub const MAX_FIELD_WIDTH: usize = 65_535;

/// Record attributes a template may reference
pub const FIELD_NAMES: &[&str] = &[
    "name",
    "levelname",
    "levelno",
    "pathname",
    "filename",
    "module",
    "lineno",
    "created",
    "msecs",
    "relativeCreated",
    "asctime",
    "threadName",
    "process",
    "message",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    pub alternate: bool,
    pub zero_pad: bool,
    pub left_align: bool,
    pub plus: bool,
    pub space: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: String,
    pub flags: Flags,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub conversion: char,
}

impl FieldSpec {
    /// True for the bare `%(levelname)s` token the sparse formatter splits on
    fn is_plain_levelname(&self) -> bool {
        self.key == "levelname"
            && self.conversion == 's'
            && self.flags == Flags::default()
            && self.width.is_none()
            && self.precision.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Field(FieldSpec),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(&text.replace('%', "%%")),
            Segment::Field(spec) => {
                write!(f, "%({})", spec.key)?;
                let flags = &spec.flags;
                for (set, c) in [
                    (flags.alternate, '#'),
                    (flags.zero_pad, '0'),
                    (flags.left_align, '-'),
                    (flags.plus, '+'),
                    (flags.space, ' '),
                ] {
                    if set {
                        write!(f, "{}", c)?;
                    }
                }
                if let Some(width) = spec.width {
                    write!(f, "{}", width)?;
                }
                if let Some(precision) = spec.precision {
                    write!(f, ".{}", precision)?;
                }
                write!(f, "{}", spec.conversion)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

/// A template cut around its last `%(levelname)s` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSplit {
    /// Everything before the level field; `None` when that is empty
    pub prefix: Option<Template>,
    pub has_level: bool,
    /// Everything after the level field, or the whole template when the
    /// field is absent
    pub suffix: Template,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, FormatError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut pos = 0;

        while let Some(offset) = source[pos..].find('%') {
            let start = pos + offset;
            literal.push_str(&source[pos..start]);
            let rest = &source[start..];

            match rest[1..].chars().next() {
                None => return Err(FormatError::IncompleteFormat(start)),
                Some('%') => {
                    literal.push('%');
                    pos = start + 2;
                    continue;
                }
                Some('(') => {}
                Some(_) => return Err(FormatError::MissingMappingKey(start)),
            }

            if !rest.contains(')') {
                return Err(FormatError::UnterminatedKey(start));
            }
            let caps = FIELD_REGEX
                .captures(rest)
                .ok_or(FormatError::UnterminatedKey(start))?;
            let whole = caps.get(0).map_or(0, |m| m.end());

            let width = caps.name("width").map(|m| m.as_str());
            let precision = caps.name("precision").map(|m| m.as_str());
            if width == Some("*") || precision == Some("*") {
                return Err(FormatError::StarNotSupported(start));
            }
            let conversion = caps
                .name("conversion")
                .and_then(|m| m.as_str().chars().next())
                .ok_or(FormatError::IncompleteFormat(start))?;
            if !CONVERSIONS.contains(conversion) {
                return Err(FormatError::UnsupportedConversion {
                    conversion,
                    index: start + whole - conversion.len_utf8(),
                });
            }

            let flag_chars = caps.name("flags").map_or("", |m| m.as_str());
            let flags = Flags {
                alternate: flag_chars.contains('#'),
                zero_pad: flag_chars.contains('0'),
                left_align: flag_chars.contains('-'),
                plus: flag_chars.contains('+'),
                space: flag_chars.contains(' '),
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Field(FieldSpec {
                key: caps["key"].to_string(),
                flags,
                width: width
                    .map(|w| parse_bound(w, FormatError::WidthTooBig(start)))
                    .transpose()?,
                precision: precision
                    .map(|p| parse_bound(p, FormatError::PrecisionTooBig(start)))
                    .transpose()?,
                conversion,
            }));
            pos = start + whole;
        }

        literal.push_str(&source[pos..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Parse, require at least one field and render a synthetic record
    pub fn validate(source: &str) -> Result<Self, FormatError> {
        let template = Self::parse(source)?;
        if !template.has_fields() {
            return Err(FormatError::NoFields);
        }
        template.render(&LogRecord::sample())?;
        Ok(template)
    }

    /// The bare `%(message)s` template
    pub fn message_only() -> Self {
        Self::from_segments(vec![Segment::Field(FieldSpec {
            key: "message".to_string(),
            flags: Flags::default(),
            width: None,
            precision: None,
            conversion: 's',
        })])
    }

    fn from_segments(segments: Vec<Segment>) -> Self {
        let source = segments.iter().map(|s| s.to_string()).collect();
        Self { source, segments }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn has_fields(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Field(_)))
    }

    pub fn split_around_level(&self) -> LevelSplit {
        let last = self.segments.iter().rposition(|s| match s {
            Segment::Field(spec) => spec.is_plain_levelname(),
            Segment::Literal(_) => false,
        });

        match last {
            None => LevelSplit {
                prefix: None,
                has_level: false,
                suffix: self.clone(),
            },
            Some(index) => {
                let prefix = &self.segments[..index];
                LevelSplit {
                    prefix: (!prefix.is_empty()).then(|| Self::from_segments(prefix.to_vec())),
                    has_level: true,
                    suffix: Self::from_segments(self.segments[index + 1..].to_vec()),
                }
            }
        }
    }

    /// Substitute every field from the record. Failure traces are not part
    /// of this; see `TemplateFormatter`.
    pub fn render(&self, record: &LogRecord) -> Result<String, FormatError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(spec) => {
                    let value = lookup(record, &spec.key)?;
                    out.push_str(&render_field(spec, value)?);
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
}

fn lookup(record: &LogRecord, key: &str) -> Result<FieldValue, FormatError> {
    let value = match key {
        "name" => FieldValue::Str(record.name.clone()),
        "levelname" => FieldValue::Str(record.severity.name().to_string()),
        "levelno" => FieldValue::Int(record.severity.number()),
        "pathname" => FieldValue::Str(
            record
                .pathname
                .clone()
                .unwrap_or_else(|| "(unknown file)".to_string()),
        ),
        "filename" => FieldValue::Str(record.filename().unwrap_or("(unknown file)").to_string()),
        "module" => FieldValue::Str(module_name(record)),
        "lineno" => FieldValue::Int(record.lineno.map_or(0, i64::from)),
        "created" => FieldValue::Float(
            record.created.timestamp() as f64
                + f64::from(record.created.timestamp_subsec_micros()) / 1e6,
        ),
        "msecs" => FieldValue::Float(f64::from(record.created.timestamp_subsec_millis())),
        "relativeCreated" => FieldValue::Float(record.relative_created_ms as f64),
        "asctime" => FieldValue::Str(
            record
                .created
                .format("%Y-%m-%d %H:%M:%S,%3f")
                .to_string(),
        ),
        "threadName" => FieldValue::Str(record.thread_name.clone()),
        "process" => FieldValue::Int(i64::from(record.process_id)),
        "message" => FieldValue::Str(record.message.clone()),
        other => return Err(FormatError::UnknownField(other.to_string())),
    };
    Ok(value)
}

fn module_name(record: &LogRecord) -> String {
    if let Some(module) = &record.module {
        return module.clone();
    }
    record
        .filename()
        .map(|f| f.split('.').next().unwrap_or(f).to_string())
        .unwrap_or_else(|| "Unknown module".to_string())
}

fn render_field(spec: &FieldSpec, value: FieldValue) -> Result<String, FormatError> {
    let not_a_number = || FormatError::NotANumber {
        field: spec.key.clone(),
        conversion: spec.conversion,
    };

    match spec.conversion {
        's' | 'r' | 'a' => {
            let text = match (&value, spec.conversion) {
                (FieldValue::Str(s), 's') => s.clone(),
                (FieldValue::Str(s), _) => format!("'{}'", s.escape_default()),
                (FieldValue::Int(i), _) => i.to_string(),
                (FieldValue::Float(f), _) => float_repr(*f),
            };
            let text = match spec.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            };
            pad(spec, "", &text)
        }
        'c' => {
            let c = match value {
                FieldValue::Int(i) => u32::try_from(i).ok().and_then(char::from_u32),
                FieldValue::Str(s) if s.chars().count() == 1 => s.chars().next(),
                _ => None,
            }
            .ok_or_else(|| FormatError::NotAChar(spec.key.clone()))?;
            pad(spec, "", &c.to_string())
        }
        'd' | 'i' | 'u' | 'o' | 'x' | 'X' => {
            let n = match value {
                FieldValue::Int(i) => i,
                FieldValue::Float(f) if matches!(spec.conversion, 'd' | 'i' | 'u') => f.trunc() as i64,
                _ => return Err(not_a_number()),
            };
            let magnitude = n.unsigned_abs();
            let mut digits = match spec.conversion {
                'o' => format!("{:o}", magnitude),
                'x' => format!("{:x}", magnitude),
                'X' => format!("{:X}", magnitude),
                _ => magnitude.to_string(),
            };
            if let Some(p) = spec.precision {
                if digits.len() < p {
                    digits = format!("{}{}", "0".repeat(p - digits.len()), digits);
                }
            }
            let prefix = match (spec.flags.alternate, spec.conversion) {
                (true, 'o') => "0o",
                (true, 'x') => "0x",
                (true, 'X') => "0X",
                _ => "",
            };
            let sign = sign_of(spec, n < 0);
            pad(spec, &format!("{}{}", sign, prefix), &digits)
        }
        'e' | 'E' | 'f' | 'F' | 'g' | 'G' => {
            let f = match value {
                FieldValue::Int(i) => i as f64,
                FieldValue::Float(f) => f,
                FieldValue::Str(_) => return Err(not_a_number()),
            };
            let precision = spec.precision.unwrap_or(6);
            let body = match spec.conversion {
                'e' => exponent_notation(f.abs(), precision, false),
                'E' => exponent_notation(f.abs(), precision, true),
                'f' | 'F' => format!("{:.*}", precision, f.abs()),
                c => general_notation(f.abs(), precision, c == 'G', spec.flags.alternate),
            };
            let sign = sign_of(spec, f.is_sign_negative() && f != 0.0);
            pad(spec, sign, &body)
        }
        other => Err(FormatError::UnsupportedConversion {
            conversion: other,
            index: 0,
        }),
    }
}

fn sign_of(spec: &FieldSpec, negative: bool) -> &'static str {
    if negative {
        "-"
    } else if spec.flags.plus {
        "+"
    } else if spec.flags.space {
        " "
    } else {
        ""
    }
}

/// Apply width, alignment and zero padding. Zero padding goes between the
/// sign/prefix and the digits and only applies to numeric conversions.
fn pad(spec: &FieldSpec, lead: &str, body: &str) -> Result<String, FormatError> {
    let len = lead.chars().count() + body.chars().count();
    let fill = spec.width.unwrap_or(0).saturating_sub(len);
    let mut out = String::new();
    out.try_reserve(fill.saturating_add(lead.len() + body.len()))
        .map_err(|_| FormatError::FieldTooLarge(spec.key.clone()))?;
    let numeric = !matches!(spec.conversion, 's' | 'r' | 'a' | 'c');
    if spec.flags.left_align {
        out.push_str(lead);
        out.push_str(body);
        out.extend(std::iter::repeat(' ').take(fill));
    } else if spec.flags.zero_pad && numeric {
        out.push_str(lead);
        out.extend(std::iter::repeat('0').take(fill));
        out.push_str(body);
    } else {
        out.extend(std::iter::repeat(' ').take(fill));
        out.push_str(lead);
        out.push_str(body);
    }
    Ok(out)
}

/// A width or precision as written; an empty precision (`%.s`) is zero
fn parse_bound(digits: &str, too_big: FormatError) -> Result<usize, FormatError> {
    if digits.is_empty() {
        return Ok(0);
    }
    match digits.parse::<usize>() {
        Ok(n) if n <= MAX_FIELD_WIDTH => Ok(n),
        _ => Err(too_big),
    }
}

/// Floats print with a trailing `.0` when integral, e.g. `2.0`
fn float_repr(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// `1.500000e+00` style: at least two exponent digits, explicit sign
fn exponent_notation(f: f64, precision: usize, upper: bool) -> String {
    let raw = format!("{:.*e}", precision, f);
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    let out = format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    if upper {
        out.to_uppercase()
    } else {
        out
    }
}

fn general_notation(f: f64, precision: usize, upper: bool, keep_zeros: bool) -> String {
    let precision = precision.max(1);
    if f == 0.0 {
        return if keep_zeros {
            format!("{:.*}", precision - 1, 0.0)
        } else {
            "0".to_string()
        };
    }
    let probe = format!("{:.*e}", precision - 1, f);
    let exponent: i32 = probe
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let text = exponent_notation(f, precision - 1, upper);
        if keep_zeros {
            text
        } else {
            let marker = if upper { 'E' } else { 'e' };
            match text.split_once(marker) {
                Some((mantissa, exp)) => {
                    format!("{}{}{}", strip_zeros(mantissa), marker, exp)
                }
                None => text,
            }
        }
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        let text = format!("{:.*}", decimals, f);
        if keep_zeros {
            text
        } else {
            strip_zeros(&text).to_string()
        }
    }
}

fn strip_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Severity;

    fn record() -> LogRecord {
        LogRecord::new(Severity::Warning, "app.db", "boom").with_location("src/db.rs", 42)
    }

    fn render(template: &str) -> String {
        Template::parse(template).unwrap().render(&record()).unwrap()
    }

    #[test]
    fn test_basic_fields() {
        assert_eq!(render("%(levelname)s:%(name)s:%(message)s"), "WARNING:app.db:boom");
        assert_eq!(render("%(filename)s:%(lineno)d"), "db.rs:42");
        assert_eq!(render("%(levelno)d"), "30");
        assert_eq!(render("%(module)s"), "db");
    }

    #[test]
    fn test_every_known_field_renders() {
        let sample = LogRecord::sample();
        for name in FIELD_NAMES {
            let template = Template::parse(&format!("%({})s", name)).unwrap();
            assert!(template.render(&sample).is_ok(), "field {} failed", name);
        }
    }

    #[test]
    fn test_message_only() {
        assert_eq!(Template::message_only().source(), "%(message)s");
        assert_eq!(Template::message_only().render(&record()).unwrap(), "boom");
    }

    #[test]
    fn test_empty_template() {
        let empty = Template::parse("").unwrap();
        assert!(empty.is_empty());
        assert!(!empty.has_fields());
        assert_eq!(empty.render(&record()).unwrap(), "");
        assert!(!Template::parse("text only").unwrap().is_empty());
    }

    #[test]
    fn test_percent_escape() {
        assert_eq!(render("100%% %(message)s"), "100% boom");
    }

    #[test]
    fn test_width_and_alignment() {
        assert_eq!(render("[%(levelname)-8s]"), "[WARNING ]");
        assert_eq!(render("[%(levelname)10s]"), "[   WARNING]");
        assert_eq!(render("[%(lineno)05d]"), "[00042]");
        assert_eq!(render("[%(lineno)+d]"), "[+42]");
        assert_eq!(render("[%(message).2s]"), "[bo]");
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(render("%(lineno)x %(lineno)#X %(lineno)o"), "2a 0X2A 52");
        assert_eq!(render("%(levelno).2f"), "30.00");
        assert_eq!(render("%(levelno)e"), "3.000000e+01");
        assert_eq!(render("%(levelno)g"), "30");
        assert_eq!(render("%(levelno)r"), "30");
        assert_eq!(render("%(message)r"), "'boom'");
    }

    #[test]
    fn test_asctime_shape() {
        let out = render("%(asctime)s");
        // 2024-01-01 10:00:00,123
        assert_eq!(out.len(), 23);
        assert_eq!(&out[19..20], ",");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Template::parse("%(message)s %"),
            Err(FormatError::IncompleteFormat(_))
        ));
        assert!(matches!(
            Template::parse("%s"),
            Err(FormatError::MissingMappingKey(0))
        ));
        assert!(matches!(
            Template::parse("%(message"),
            Err(FormatError::UnterminatedKey(0))
        ));
        assert!(matches!(
            Template::parse("%(message)*s"),
            Err(FormatError::StarNotSupported(0))
        ));
        assert!(matches!(
            Template::parse("%(message)y"),
            Err(FormatError::UnsupportedConversion { conversion: 'y', .. })
        ));
    }

    #[test]
    fn test_oversized_width_and_precision_rejected() {
        assert!(matches!(
            Template::parse("%(message)999999999999999999s"),
            Err(FormatError::WidthTooBig(0))
        ));
        assert!(matches!(
            Template::parse("[%(message)99999999999999999999999s]"),
            Err(FormatError::WidthTooBig(1))
        ));
        assert!(matches!(
            Template::parse("%(levelno).999999999999f"),
            Err(FormatError::PrecisionTooBig(0))
        ));
        let at_cap = format!("%(message){}s", MAX_FIELD_WIDTH);
        assert_eq!(
            Template::parse(&at_cap).unwrap().render(&record()).unwrap().len(),
            MAX_FIELD_WIDTH
        );
        assert!(Template::parse(&format!("%(message){}s", MAX_FIELD_WIDTH + 1)).is_err());
    }

    #[test]
    fn test_empty_precision_is_zero() {
        assert_eq!(render("[%(message).s]"), "[]");
    }

    #[test]
    fn test_render_errors() {
        let template = Template::parse("%(nope)s").unwrap();
        assert!(matches!(
            template.render(&record()),
            Err(FormatError::UnknownField(ref f)) if f == "nope"
        ));
        let template = Template::parse("%(message)d").unwrap();
        assert!(matches!(
            template.render(&record()),
            Err(FormatError::NotANumber { .. })
        ));
    }

    #[test]
    fn test_validate() {
        assert!(Template::validate("%(asctime)s %(levelname)s %(message)s").is_ok());
        assert!(matches!(
            Template::validate("plain text"),
            Err(FormatError::NoFields)
        ));
        assert!(matches!(
            Template::validate("%(bogus)s"),
            Err(FormatError::UnknownField(_))
        ));
    }

    #[test]
    fn test_split_around_last_level() {
        let template = Template::parse("%(asctime)s %(levelname)s %(message)s").unwrap();
        let split = template.split_around_level();
        assert!(split.has_level);
        assert_eq!(split.prefix.unwrap().source(), "%(asctime)s ");
        assert_eq!(split.suffix.source(), " %(message)s");
    }

    #[test]
    fn test_split_glued_level() {
        let template = Template::parse("[%(levelname)s]%(message)s").unwrap();
        let split = template.split_around_level();
        assert!(split.has_level);
        assert_eq!(split.prefix.unwrap().source(), "[");
        assert_eq!(split.suffix.source(), "]%(message)s");
    }

    #[test]
    fn test_split_uses_last_occurrence() {
        let template = Template::parse("%(levelname)s|%(levelname)s|%(message)s").unwrap();
        let split = template.split_around_level();
        assert_eq!(split.prefix.unwrap().source(), "%(levelname)s|");
        assert_eq!(split.suffix.source(), "|%(message)s");
    }

    #[test]
    fn test_split_without_level() {
        let template = Template::parse("%(message)s").unwrap();
        let split = template.split_around_level();
        assert!(!split.has_level);
        assert!(split.prefix.is_none());
        assert_eq!(split.suffix, template);
    }

    #[test]
    fn test_split_ignores_decorated_level() {
        let template = Template::parse("%(levelname)-8s %(message)s").unwrap();
        assert!(!template.split_around_level().has_level);
    }

    #[test]
    fn test_level_at_start_has_no_prefix() {
        let split = Template::parse("%(levelname)s: %(message)s")
            .unwrap()
            .split_around_level();
        assert!(split.prefix.is_none());
        assert!(split.has_level);
    }

    #[test]
    fn test_segment_source_round_trip() {
        let template = Template::parse("50%% %(lineno)-#5x|%(message).3s").unwrap();
        let rebuilt: String = template.segments().iter().map(|s| s.to_string()).collect();
        let reparsed = Template::parse(&rebuilt).unwrap();
        assert_eq!(reparsed.segments(), template.segments());
    }
}
