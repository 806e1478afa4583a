//! Structured diagnostics for the Agate translation engine.
//!
//! This crate provides structured [`Diagnostic`] messages with severity
//! levels, error codes, and source labels, plus the [`DiagnosticSink`] that
//! accumulates advisories during a conversion. Fatal translation errors wrap
//! a diagnostic and abort; advisories collect in the sink and are surfaced
//! to the caller when the conversion finishes.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod label;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use label::{Label, LabelStyle};
pub use severity::Severity;
pub use sink::DiagnosticSink;
