use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Raised when the input CSS, or CSS synthesized during expansion, cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}:{line}:{column}: {message}", SourceName(.source_name.as_deref()))]
pub struct ParseError {
    pub message: String,
    pub source_name: Option<String>,
    /// 1-based line of the offending token.
    pub line: u32,
    /// 1-based column of the offending token.
    pub column: u32,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: u32, column: u32) -> Self {
        ParseError {
            message: message.into(),
            source_name: None,
            line,
            column,
        }
    }

    pub fn with_source_name(mut self, source_name: Option<&str>) -> Self {
        self.source_name = source_name.map(str::to_string);
        self
    }
}

struct SourceName<'a>(Option<&'a str>);

impl fmt::Display for SourceName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.unwrap_or("<input>"))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid built-in config: {0}")]
    BuiltIn(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MinifyError {
    #[error("failed to parse expanded css: {0}")]
    Parse(String),

    #[error("failed to minify css: {0}")]
    Transform(String),

    #[error("failed to print minified css: {0}")]
    Print(String),
}

/// Failure of an expand-then-minify run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Minify(#[from] MinifyError),
}
