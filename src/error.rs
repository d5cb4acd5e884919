#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("unsupported format character '{conversion}' at index {index}")]
    UnsupportedConversion { conversion: char, index: usize },

    #[error("unterminated mapping key starting at index {0}")]
    UnterminatedKey(usize),

    #[error("format requires a mapping key at index {0}")]
    MissingMappingKey(usize),

    #[error("incomplete format at index {0}")]
    IncompleteFormat(usize),

    #[error("'*' width and precision are not supported with a mapping key (index {0})")]
    StarNotSupported(usize),

    #[error("width too big at index {0}")]
    WidthTooBig(usize),

    #[error("precision too big at index {0}")]
    PrecisionTooBig(usize),

    #[error("field '{0}' is too large to render")]
    FieldTooLarge(String),

    #[error("format contains no %(...) fields")]
    NoFields,

    #[error("unknown record field '{0}'")]
    UnknownField(String),

    #[error("%{conversion} format: a number is required for field '{field}'")]
    NotANumber { field: String, conversion: char },

    #[error("%c requires an int or a single character for field '{0}'")]
    NotAChar(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid log format: {value}")]
    InvalidFormat {
        value: String,
        #[source]
        source: FormatError,
    },

    #[error("Invalid log level: {0} (expected one of DEBUG, INFO, WARNING, ERROR, CRITICAL)")]
    InvalidLevel(String),

    #[error("Invalid log handler: {0} (expected one of plain, sparse, rich)")]
    InvalidHandler(String),

    #[error("Invalid log handler: {name} ({hint})")]
    HandlerUnavailable { name: String, hint: String },

    #[error("another logger is already registered with the log facade")]
    LoggerAlreadySet,
}

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
