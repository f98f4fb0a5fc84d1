//! FAB-DIS catalog extraction.
//!
//! One strategy per schema version family turns a classified file
//! into canonical [`Product`](fabdis_model::Product) records plus a
//! per-row outcome trail. Row-level problems are outcome values, not
//! errors: one bad row never aborts an otherwise-good file. Only a
//! structural failure (the canonical skeleton cannot be established
//! at all) is fatal to a run.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use fabdis_ingest::{RunOptions, process_file};
//!
//! let result = process_file(Path::new("catalogue.csv"), &RunOptions::default())?;
//! println!(
//!     "{} products, {} rows in error",
//!     result.products.len(),
//!     result.stats.errored()
//! );
//! ```

#![deny(unsafe_code)]

mod assembly;
mod delimited;
mod error;
pub mod logging;
mod markup;
mod pipeline;
mod run;
mod spreadsheet;

pub use assembly::ProductAssembler;
pub use error::{IngestError, Result};
pub use pipeline::{Extraction, ParserPipeline, pipeline_for};
pub use run::{RunOptions, RunResult, process_file, process_file_best_effort};
