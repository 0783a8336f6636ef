#![deny(clippy::all)]

mod aggregator;
mod document;
mod error;
pub mod fetch;
mod report;
mod timeline;

pub use aggregator::*;
pub use document::*;
pub use error::{ReportError, Result};
pub use fetch::{fetch_document, fetch_report, FetchOptions};
pub use report::*;
pub use timeline::*;

pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Which accumulator field a derived series is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Count,
    Points,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Count => "count",
            Field::Points => "points",
        }
    }
}

/// A single (category, map) pair from the player document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    pub category: String,
    pub map: String,
    /// Epoch seconds of the first finish; `None` means the map is unfinished.
    pub first_finish: Option<i64>,
    pub points: u64,
}

impl CompletionRecord {
    pub fn is_finished(&self) -> bool {
        self.first_finish.is_some()
    }
}
