//! Markdown documentation of an extract
//!
//! - [`markdown`] - block-based markdown builder with table of contents support
//! - [`statistics`] - per-column summary statistics rendered into the report

pub mod markdown;
pub mod statistics;

pub use markdown::{anchor_for, MarkdownReport, TocEntry};
pub use statistics::{column_statistics, summary_statistics, ColumnStatistics, StatisticsKind};
