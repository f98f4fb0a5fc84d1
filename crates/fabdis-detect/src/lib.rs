//! Classification of FAB-DIS catalog files.
//!
//! Three stages, composed by [`DetectorManager`]:
//!
//! 1. [`detect_format`] sniffs the physical container from leading
//!    bytes, falling back to the declared extension.
//! 2. [`read_skeleton`] extracts a cheap structural summary (tab
//!    names, header row, root element) without parsing the body.
//! 3. [`detect_version`] matches the skeleton against an ordered
//!    fingerprint table, yielding a version, an optional vendor hint
//!    and a confidence score. `unknown` is a result, not an error.
//!
//! The manager then resolves the rule set (default plus vendor
//! overlay) and returns one immutable [`DetectionReport`] per file.

#![deny(unsafe_code)]

mod error;
mod format;
mod manager;
mod skeleton;
mod version;

pub use error::{DetectError, Result};
pub use format::detect_format;
pub use manager::{DetectionOverrides, DetectionReport, DetectorManager};
pub use skeleton::{SheetSkeleton, StructuralSkeleton, read_skeleton};
pub use version::{VersionMatch, detect_version};
