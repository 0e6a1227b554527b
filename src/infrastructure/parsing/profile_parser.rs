//! Profile page parser
//!
//! Runs every field's strategy chain over one loaded page and applies the
//! validity gate: without the strong field (points) the page counts as not
//! parsed at all, never as a zero-value profile.

#![allow(clippy::uninlined_format_args)]

use scraper::Html;
use tracing::debug;

use super::config::ExtractionRules;
use super::strategy::{FieldStrategies, PageContent, compile_selector};
use super::{ContextualParser, ParsingError, ParsingResult, Validator};
use crate::domain::{MetricField, MetricRecord};

/// Rejects records whose strong field is zero
#[derive(Debug, Default, Clone, Copy)]
pub struct StrongFieldValidator;

impl Validator<MetricRecord> for StrongFieldValidator {
    fn validate(&self, data: &MetricRecord) -> ParsingResult<()> {
        if data.has_strong_field() {
            Ok(())
        } else {
            Err(ParsingError::required_field_missing(
                MetricField::STRONG.as_str(),
                Some("profile page"),
            ))
        }
    }
}

/// Field extractor for guide profile pages
pub struct ProfileExtractor {
    chains: Vec<FieldStrategies>,
    validator: StrongFieldValidator,
}

impl ProfileExtractor {
    /// Extractor with the built-in rules
    pub fn new() -> ParsingResult<Self> {
        Self::with_rules(&ExtractionRules::default())
    }

    /// Compile `rules` into strategy chains; bad selectors or patterns fail here
    pub fn with_rules(rules: &ExtractionRules) -> ParsingResult<Self> {
        let containers = rules
            .containers
            .iter()
            .map(|selector| compile_selector(selector))
            .collect::<ParsingResult<Vec<_>>>()?;

        let chains = MetricField::ALL
            .into_iter()
            .filter_map(|field| rules.field(field).map(|field_rules| (field, field_rules)))
            .map(|(field, field_rules)| FieldStrategies::build(field, field_rules, &containers))
            .collect::<ParsingResult<Vec<_>>>()?;

        if !chains.iter().any(|chain| chain.field() == MetricField::STRONG) {
            return Err(ParsingError::NoStrategies {
                field: MetricField::STRONG.to_string(),
            });
        }

        Ok(Self {
            chains,
            validator: StrongFieldValidator,
        })
    }

    /// Extract a record from raw page HTML, `None` when the strong field is missing
    pub fn extract(&self, html: &str) -> Option<MetricRecord> {
        self.extract_page(&PageContent::parse(html))
    }

    pub fn extract_page(&self, page: &PageContent) -> Option<MetricRecord> {
        let record = self.collect(page);
        match self.validator.validate(&record) {
            Ok(()) => Some(record),
            Err(e) => {
                debug!("Discarding extraction: {}", e);
                None
            }
        }
    }

    /// Every field independently; absent fields stay 0
    fn collect(&self, page: &PageContent) -> MetricRecord {
        let mut record = MetricRecord::default();
        for chain in &self.chains {
            if let Some(value) = chain.extract(page) {
                record.set(chain.field(), value);
            }
        }
        record
    }
}

impl ContextualParser for ProfileExtractor {
    type Output = MetricRecord;
    type Context = ();

    fn parse_with_context(&self, html: &Html, _context: &Self::Context) -> ParsingResult<Self::Output> {
        let record = self.collect(&PageContent::parse(&html.html()));
        self.validator.validate(&record)?;
        Ok(record)
    }
}
