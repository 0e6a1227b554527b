//! HTML parsing infrastructure for guide profile pages
//!
//! Trait-based parsing: a numeral normalizer at the bottom, per-field
//! extraction strategies on top of it, and the profile extractor that runs
//! them and applies the validity gate.

pub mod config;
pub mod error;
pub mod number;
pub mod profile_parser;
pub mod strategy;

// Re-export public types
pub use config::{ExtractionRules, FieldRules, HookRule};
pub use error::{ParsingError, ParsingResult};
pub use number::normalize;
pub use profile_parser::{ProfileExtractor, StrongFieldValidator};
pub use strategy::{ExtractionStrategy, PageContent};

use scraper::Html;

/// Parser over an already parsed document plus some context
pub trait ContextualParser {
    type Output;
    type Context;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> ParsingResult<Self::Output>;
}

/// Validation trait for parsed results
pub trait Validator<T> {
    /// Validate parsed data for completeness and correctness
    fn validate(&self, data: &T) -> ParsingResult<()>;
}
