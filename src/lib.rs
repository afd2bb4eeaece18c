//! docxmerge - Pure-Rust mail merge: batch-generate Word documents from Excel rows
//!
//! This crate reads every spreadsheet (XLSX) in a directory, treats each row
//! as a record, and for each record produces a copy of every template
//! document (DOCX) in that directory with placeholder tokens replaced by the
//! record's field values.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use docxmerge::MergerBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a merger with default settings
//!     let merger = MergerBuilder::new().build()?;
//!
//!     // Process every *.xlsx and *.docx file in the current directory;
//!     // outputs go to ./generated/
//!     let report = merger.merge_directory(".")?;
//!
//!     println!("Generated {} document(s)", report.success_count());
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use docxmerge::{MergerBuilder, PlaceholderStyle};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Only recognize {field} and [field] tokens, write to ./out/
//!     let merger = MergerBuilder::new()
//!         .with_output_dir("out")
//!         .with_placeholder_styles(vec![
//!             PlaceholderStyle::CurlySingle,
//!             PlaceholderStyle::Square,
//!         ])
//!         .build()?;
//!
//!     let report = merger.merge_directory("/path/to/batch")?;
//!     for failure in &report.failures {
//!         eprintln!("{}: {}", failure.record_key, failure.reason);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Placeholders
//!
//! A template author may spell a placeholder for the field `name` in any of
//! four styles: `{name}`, `{{name}}`, `[name]`, `<name>`. Placeholders are
//! replaced in body paragraphs, table cells (including nested tables) and
//! every header/footer variant. A placeholder whose field has no value in a
//! record is left in the output verbatim.
//!
//! Substitution preserves the formatting of single-run paragraphs exactly.
//! When a placeholder straddles a formatting boundary, the paragraph's runs
//! are collapsed into one run carrying the first run's formatting; the text
//! content is always exact.

mod api;
mod builder;
mod document;
mod error;
mod placeholder;
mod records;
mod security;
mod substitute;
mod types;

// 公開API
pub use api::PlaceholderStyle;
pub use builder::{Merger, MergerBuilder};
pub use error::DocxMergeError;
pub use placeholder::expand_placeholders;
pub use records::{load_records, parse_records};
pub use substitute::{substitute_spans, Span};
pub use types::{
    FieldHeader, MergeReport, PairFailure, Record, RecordSet, SkippedSpreadsheet,
};
