//! The Agate VHDL emission backend.
//!
//! Takes an in-memory [`Design`](agate_model::Design) of concurrent
//! hardware processes, typed signals, enumerated types, and memories, and
//! emits one synthesizable VHDL text unit. Two passes do the work: the
//! [type inference pass](infer) annotates every expression with a
//! [`VhdlType`] in an immutable side table, then the code generation
//! visitors walk the annotated trees and emit entity, declarations, and
//! one concurrent statement per process. Advisories accumulate in a
//! [`DiagnosticSink`](agate_diagnostics::DiagnosticSink); any structural
//! problem aborts the conversion with a [`TranslateError`] and no partial
//! output is considered usable.

#![warn(missing_docs)]

mod codegen;
mod decls;
mod writer;

pub mod context;
pub mod errors;
pub mod eval;
pub mod infer;
pub mod types;

pub use context::Converter;
pub use errors::{TranslateError, TranslateResult};
pub use infer::{annotate_design, annotate_process, Annotations, DesignAnnotations, InferredType};
pub use types::VhdlType;
