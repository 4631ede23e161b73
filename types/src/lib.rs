//! Core domain types shared across the Vigil workspace.
//!
//! This crate is a leaf: plain data with serde derives, no IO, no async.

mod analysis;
mod history;
mod text;

pub use analysis::{AnalysisResult, OutputCategory, RiskLevel};
pub use history::HistoryEntry;
pub use text::truncate_with_ellipsis;
