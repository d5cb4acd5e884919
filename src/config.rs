use crate::dispatch;
use crate::error::ConfigError;
use crate::handler::{HandlerKind, StreamHandler};
use crate::severity::Severity;
use crate::template::Template;
use crate::tty;

pub const FORMAT_ENV: &str = "LOG_FORMAT";
pub const LEVEL_ENV: &str = "LOG_LEVEL";
pub const HANDLER_ENV: &str = "LOG_HANDLER";

pub const DEFAULT_FORMAT: &str = "%(asctime)s %(levelname)s %(message)s";
pub const DEFAULT_LEVEL: Severity = Severity::Info;

/// Explicit settings; anything left unset is taken from the environment or
/// falls back to a default
#[derive(Debug, Default)]
pub struct Options {
    pub format: Option<String>,
    pub level: Option<Severity>,
    pub handlers: Option<Vec<StreamHandler>>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn level(mut self, level: Severity) -> Self {
        self.level = Some(level);
        self
    }

    pub fn handlers(mut self, handlers: Vec<StreamHandler>) -> Self {
        self.handlers = Some(handlers);
        self
    }
}

/// Fully resolved configuration, ready to be applied
#[derive(Debug)]
pub struct Settings {
    pub format: Template,
    pub level: Severity,
    pub handlers: Vec<StreamHandler>,
}

/// Resolve every setting from the options, then `env`, then defaults.
/// Handlers without a formatter get one built from the resolved format.
pub fn resolve<F>(options: Options, env: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let format_source = match options.format {
        Some(format) => format,
        None => env(FORMAT_ENV).unwrap_or_else(|| DEFAULT_FORMAT.to_string()),
    };
    let format = valid_format(&format_source)?;

    let level = match options.level {
        Some(level) => level,
        None => match env(LEVEL_ENV) {
            Some(text) => valid_level(&text)?,
            None => DEFAULT_LEVEL,
        },
    };

    let mut handlers = match options.handlers {
        Some(handlers) => handlers,
        None => {
            let style_output = tty::style_output_from(tty::is_stderr_tty(), &env);
            match env(HANDLER_ENV) {
                Some(name) => valid_handlers(&name, style_output)?,
                None => vec![StreamHandler::plain(style_output)],
            }
        }
    };
    for handler in handlers.iter_mut().filter(|h| !h.has_formatter()) {
        handler.set_template(Some(&format));
    }

    Ok(Settings {
        format,
        level,
        handlers,
    })
}

pub fn valid_format(text: &str) -> Result<Template, ConfigError> {
    Template::validate(text).map_err(|source| ConfigError::InvalidFormat {
        value: text.to_string(),
        source,
    })
}

pub fn valid_level(text: &str) -> Result<Severity, ConfigError> {
    text.parse()
}

pub fn valid_handlers(text: &str, style_output: bool) -> Result<Vec<StreamHandler>, ConfigError> {
    let kind = HandlerKind::from_selector(text, style_output)?;
    Ok(vec![StreamHandler::new(kind)])
}

/// Configure the process-wide logger from `LOG_FORMAT`, `LOG_LEVEL` and
/// `LOG_HANDLER`. Any invalid value fails before anything is applied.
pub fn configure(options: Options) -> Result<(), ConfigError> {
    configure_with_env(options, |key| std::env::var(key).ok())
}

/// Same as [`configure`] with a custom environment lookup
pub fn configure_with_env<F>(options: Options, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let settings = resolve(options, env)?;
    dispatch::apply(settings)
}
