//! Declarative normalization rules for FAB-DIS catalogs.
//!
//! A [`RuleSet`] is pure data: sheet-name aliases, column-header
//! aliases and per-field value transforms. New vendor dialects are
//! supported by authoring a new overlay document, never by changing
//! engine code. The [`engine`] module applies a resolved rule set to
//! raw structure and raw cell values.
//!
//! # Example
//!
//! ```ignore
//! use fabdis_rules::{engine, presets};
//!
//! let rules = presets::resolve(Some("cedeo"))?;
//! let map = engine::map_columns(&["Réf. CEDEO".into(), "Prix tarif HT".into()], &rules);
//! ```

#![deny(unsafe_code)]

pub mod engine;
mod error;
pub mod presets;
mod ruleset;

pub use error::{Result, RuleError, ValueNormalizationError};
pub use ruleset::{RuleSet, ValueTransform};
