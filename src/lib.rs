// src/lib.rs
pub mod colors;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod formatters;
pub mod handler;
pub mod record;
pub mod severity;
pub mod template;
pub mod tty;

pub use error::*;

pub use colors::ColorMap;
pub use config::{configure, configure_with_env, Options, Settings};
pub use dispatch::{current_settings, handle, is_configured, AppliedSettings};
pub use formatters::{escape_line, ColorizingFormatter, Formatter, SparseColorFormatter, TemplateFormatter};
#[cfg(feature = "rich")]
pub use formatters::RichFormatter;
pub use handler::{HandlerKind, StreamHandler};
pub use record::{sample_records, LogRecord};
pub use severity::Severity;
pub use template::{LevelSplit, Template};
pub use tty::should_style_output;
