//! Canonical FAB-DIS catalog data model.
//!
//! This crate defines the format-agnostic shapes shared by the whole
//! pipeline: the canonical [`Product`] record, per-row [`RowOutcome`]
//! accounting, and the classification vocabulary
//! ([`PhysicalFormat`], [`SchemaVersion`], [`Confidence`]).
//!
//! Everything here is pure data: no I/O, no parsing of source files.

#![deny(unsafe_code)]

pub mod canonical;
mod error;
mod format;
mod outcome;
mod product;

pub use error::{ModelError, Result};
pub use format::{Confidence, PhysicalFormat, SchemaVersion};
pub use outcome::{RowOutcome, RunStats};
pub use product::{Product, Reference};
