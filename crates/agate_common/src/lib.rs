//! Shared foundational types for the Agate VHDL emission backend.
//!
//! This crate provides interned identifiers, source spans, binary literal
//! formatting helpers, and common result types used by the model and the
//! translation engine.

#![warn(missing_docs)]

pub mod bits;
pub mod ident;
pub mod result;
pub mod span;

pub use bits::bin_str;
pub use ident::{Ident, Interner};
pub use result::{AgateResult, InternalError};
pub use span::{FileId, Span};
