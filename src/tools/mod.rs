//! Transform-and-emit tools.
//!
//! Every tool takes the original bytes plus the relevant page state and
//! returns finished [`Artifact`](crate::emit::Artifact)s. Preconditions are
//! checked before the document is parsed, and nothing is written to disk
//! here; saving is the caller's job (see [`crate::emit`]).

pub mod annotate;
pub mod convert;
pub mod info;
pub mod merge;
pub mod ocr;
pub mod organize;
