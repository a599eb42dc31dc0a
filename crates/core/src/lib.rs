//! Core library for pdf-outline
//!
//! This crate implements the **Functional Core** of the pdf-outline tool,
//! following the Functional Core - Imperative Shell pattern:
//!
//! - **`outline_core`** (this crate): title/heading heuristics and input
//!   selection rules, testable with fixture spans and no PDF files
//! - **`pdf`**: turns PDF bytes into pages of [`TextSpan`]s
//! - **`pdf-outline`**: the binary that reads the input directory, runs the
//!   pipeline per file and writes JSON
//!
//! # Module Organization
//!
//! - [`outline`]: [`extract_outline`] and the span/heading/result types
//! - [`files`]: which directory entries are processed and how outputs are named
//!
//! # Example Usage
//!
//! ```rust
//! use outline_core::{extract_outline, HeadingLevel, TextSpan};
//!
//! let pages = vec![vec![
//!     TextSpan::new("Project Report Title", 18.0, "Arial-Bold", 0),
//!     TextSpan::new("Chapter One", 14.0, "Arial", 0),
//! ]];
//!
//! let result = extract_outline(&pages);
//! assert_eq!(result.title, "Project Report Title");
//! assert_eq!(result.outline[1].level, HeadingLevel::H2);
//! ```

pub mod files;
pub mod outline;

pub use outline::{
    extract_outline, word_count, ExtractionResult, HeadingLevel, HeadingRecord, TextSpan,
};
