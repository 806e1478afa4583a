//! Translation error taxonomy and diagnostic constructors.
//!
//! Advisories flow into the [`DiagnosticSink`](agate_diagnostics::DiagnosticSink)
//! and never stop a conversion; every other condition aborts the whole
//! conversion immediately through [`TranslateError`] and no partial output
//! is considered usable.

use agate_common::{InternalError, Span};
use agate_diagnostics::{Category, Diagnostic, DiagnosticCode};
use thiserror::Error;

/// A fatal translation failure.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// A structural problem in the input design, carrying the positioned
    /// diagnostic that describes it.
    #[error("{0}")]
    Diagnostic(Diagnostic),
    /// Failure to create or write the output file.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
    /// A bug in the translation engine itself.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl From<Diagnostic> for TranslateError {
    fn from(diag: Diagnostic) -> Self {
        TranslateError::Diagnostic(diag)
    }
}

impl TranslateError {
    /// Creates an internal-bug error with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        TranslateError::Internal(InternalError::new(message))
    }
}

/// The standard result type of the translation engine.
pub type TranslateResult<T> = Result<T, TranslateError>;

fn err(number: u16) -> DiagnosticCode {
    DiagnosticCode::new(Category::Error, number)
}

fn warn(number: u16) -> DiagnosticCode {
    DiagnosticCode::new(Category::Warning, number)
}

/// E300: a supplied process is not a valid convertible unit.
pub fn error_arg_type(message: impl Into<String>, span: Span) -> Diagnostic {
    Diagnostic::error(err(300), message, span)
}

/// E301: the top-level target is not a valid convertible unit.
pub fn error_first_arg_type(message: impl Into<String>, span: Span) -> Diagnostic {
    Diagnostic::error(err(301), message, span)
}

/// E302: a port name collides with an existing bound name.
pub fn error_shadowing_signal(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        err(302),
        format!("port name `{name}` shadows an existing signal"),
        span,
    )
    .with_help("rename the port or the conflicting internal signal")
}

/// E303: an operator or construct the translator cannot map.
pub fn error_not_supported(what: impl Into<String>, span: Span) -> Diagnostic {
    Diagnostic::error(err(303), format!("not supported: {}", what.into()), span)
}

/// E304: a value category the inference pass cannot classify.
pub fn error_unsupported_type(message: impl Into<String>, span: Span) -> Diagnostic {
    Diagnostic::error(err(304), message, span)
}

/// E305: a memory whose elements alias cannot be declared as one array.
pub fn error_list_element_not_unique(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        err(305),
        format!("memory `{name}` has non-unique elements and cannot be declared"),
        span,
    )
}

/// E306: a malformed sensitivity list or asynchronous-reset pattern.
pub fn error_sensitivity(message: impl Into<String>, span: Span) -> Diagnostic {
    Diagnostic::error(err(306), message, span)
}

/// E307: a loop or slice bound that is not a compile-time constant.
pub fn error_non_constant_bound(message: impl Into<String>, span: Span) -> Diagnostic {
    Diagnostic::error(err(307), message, span)
        .with_note("loop and slice bounds must be compile-time constants")
}

/// E308: a bounded iteration with a step other than the implicit unit step.
pub fn error_non_unit_step(span: Span) -> Diagnostic {
    Diagnostic::error(err(308), "only unit loop steps are supported", span)
}

/// W300: a driven signal that is never read.
pub fn warn_unused_signal(name: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(warn(300), format!("signal `{name}` is driven but never read"), span)
}

/// W301: a read signal that is never driven, recovered as a constant.
pub fn warn_undriven_signal(name: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(
        warn(301),
        format!("signal `{name}` is read but never driven"),
        span,
    )
    .with_note("declared with a constant assignment of its current value")
}

/// W302: a conversion requested while another is already in progress.
pub fn warn_nested_conversion(span: Span) -> Diagnostic {
    Diagnostic::warning(
        warn(302),
        "nested conversion request skipped; design treated as a plain invocation",
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(
            format!("{}", error_shadowing_signal("clk", Span::DUMMY).code),
            "E302"
        );
        assert_eq!(
            format!("{}", error_non_unit_step(Span::DUMMY).code),
            "E308"
        );
        assert_eq!(
            format!("{}", warn_undriven_signal("s", Span::DUMMY).code),
            "W301"
        );
    }

    #[test]
    fn diagnostic_into_error() {
        let e: TranslateError = error_not_supported("power operator", Span::DUMMY).into();
        assert!(matches!(e, TranslateError::Diagnostic(_)));
        assert_eq!(format!("{e}"), "error[E303]: not supported: power operator");
    }

    #[test]
    fn internal_error() {
        let e = TranslateError::internal("missing annotation");
        assert_eq!(format!("{e}"), "internal error: missing annotation");
    }
}
