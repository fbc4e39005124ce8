//! Error types and reporting

use crate::ast::Span;
use crate::interp::RuntimeError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CompileError>;

/// A single parse-time diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}Parsing error. At ({line}:{column}) {message}", origin_prefix(.origin))]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub span: Span,
    pub message: String,
    /// Import path when the error comes from an imported file
    pub origin: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize, span: Span) -> Self {
        Self {
            line,
            column,
            span,
            message: message.into(),
            origin: None,
        }
    }

    /// Mark the error as coming from an imported file
    pub fn in_import(mut self, origin: impl Into<String>) -> Self {
        if self.origin.is_none() {
            self.origin = Some(origin.into());
        }
        self
    }
}

fn origin_prefix(origin: &Option<String>) -> String {
    origin.as_ref().map(|o| format!("{o}: ")).unwrap_or_default()
}

/// Pipeline error
#[derive(Debug, Error)]
pub enum CompileError {
    /// One or more parse diagnostics; the program was not evaluated
    #[error("{}", render_parse_errors(.errors))]
    Parse { errors: Vec<ParseError> },

    /// Evaluation failed
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Config error: {message}")]
    Config { message: String },

    /// A host-level fault caught at the evaluation entry point
    #[error("Fatal issue detected: {message}\nABORTED!")]
    Fatal { message: String },
}

fn render_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl CompileError {
    pub fn parse(errors: Vec<ParseError>) -> Self {
        Self::Parse { errors }
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    /// Diagnostics as line-prefixed strings, one per entry
    pub fn diagnostics(&self) -> Vec<String> {
        match self {
            Self::Parse { errors } => errors.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        }
    }

    pub fn parse_errors(&self) -> &[ParseError] {
        match self {
            Self::Parse { errors } => errors,
            _ => &[],
        }
    }
}

/// Report error with ariadne
pub fn report_error(filename: &str, source: &str, error: &CompileError) -> std::io::Result<()> {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    match error {
        CompileError::Parse { errors } => {
            for err in errors {
                // Spans of imported files point into a different source text
                if err.origin.is_some() {
                    eprintln!("{err}");
                    continue;
                }
                let end = err.span.end.max(err.span.start + 1).min(source.len());
                let range = err.span.start.min(end)..end;
                Report::build(ReportKind::Error, (filename, range.clone()))
                    .with_message(format!("Parsing error at {}:{}", err.line, err.column))
                    .with_label(
                        Label::new((filename, range))
                            .with_message(&err.message)
                            .with_color(Color::Red),
                    )
                    .finish()
                    .eprint((filename, Source::from(source)))?;
            }
            Ok(())
        }
        other => {
            let kind = match other {
                CompileError::Runtime(_) => "Runtime",
                CompileError::Io { .. } => "IO",
                CompileError::Config { .. } => "Config",
                CompileError::Fatal { .. } => "Fatal",
                CompileError::Parse { .. } => "Parse",
            };
            Report::build(ReportKind::Error, (filename, 0..0))
                .with_message(format!("{kind} error: {other}"))
                .finish()
                .eprint((filename, Source::from(source)))
        }
    }
}
