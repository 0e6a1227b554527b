//! Extraction strategies
//!
//! Each strategy is one way of finding a single field's numeral on a loaded
//! page: `page -> Option<u64>`. A field owns an ordered list of them and
//! takes the first non-zero answer.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

use super::config::{FieldRules, HookRule, NUMERAL_FRAGMENT, SAME_LINE_GAP};
use super::number::normalize;
use super::{ParsingError, ParsingResult};
use crate::domain::MetricField;

const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// A loaded page, parsed once and shared by every strategy
pub struct PageContent {
    document: Html,
    text: String,
}

impl PageContent {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let text = visible_text(document.root_element());
        Self { document, text }
    }

    pub const fn document(&self) -> &Html {
        &self.document
    }

    /// Visible text of the whole document, one text node per line
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Text nodes under `element` joined by newlines, skipping script-like subtrees
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(element, &mut parts);
    parts.join("\n")
}

fn collect_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if !SKIPPED_TAGS.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed);
            }
        }
    }
}

pub fn compile_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
}

pub fn compile_pattern(pattern: &str) -> ParsingResult<Regex> {
    let regex = Regex::new(pattern).map_err(|e| ParsingError::invalid_pattern(pattern, e))?;
    if regex.captures_len() < 2 {
        return Err(ParsingError::MissingCaptureGroup {
            pattern: pattern.to_string(),
        });
    }
    Ok(regex)
}

/// First capture of the first pattern that normalizes to a non-zero value
fn first_capture(patterns: &[Regex], text: &str) -> Option<u64> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|numeral| normalize(numeral.as_str()))
            .find(|value| *value > 0)
    })
}

/// One way of reading one field off a page
pub trait ExtractionStrategy {
    fn name(&self) -> &'static str;

    /// `None` when the strategy found nothing or only a zero
    fn extract(&self, page: &PageContent) -> Option<u64>;
}

/// Tier 1: known markup hooks, most precise and most brittle
pub struct StructuralHook {
    hooks: Vec<(Selector, Option<String>)>,
}

impl StructuralHook {
    pub fn new(rules: &[HookRule]) -> ParsingResult<Self> {
        let hooks = rules
            .iter()
            .map(|rule| Ok((compile_selector(&rule.selector)?, rule.attribute.clone())))
            .collect::<ParsingResult<Vec<_>>>()?;
        Ok(Self { hooks })
    }
}

impl ExtractionStrategy for StructuralHook {
    fn name(&self) -> &'static str {
        "structural-hook"
    }

    fn extract(&self, page: &PageContent) -> Option<u64> {
        self.hooks.iter().find_map(|(selector, attribute)| {
            page.document()
                .select(selector)
                .map(|element| match attribute {
                    Some(attribute) => normalize(element.value().attr(attribute)),
                    None => normalize(visible_text(element).as_str()),
                })
                .find(|value| *value > 0)
        })
    }
}

/// Tier 2: label words next to a numeral, inside looser containers
pub struct LabeledContainer {
    containers: Vec<Selector>,
    patterns: Vec<Regex>,
}

impl LabeledContainer {
    pub fn new(containers: &[Selector], rules: &FieldRules) -> ParsingResult<Self> {
        // "1,234 points" is the usual layout, so suffix labels go first.
        // Label and numeral must share a text node.
        let suffixed = rules
            .suffix_labels
            .iter()
            .map(|label| format!(r"(?i)({NUMERAL_FRAGMENT}){SAME_LINE_GAP}{}", regex::escape(label)));
        let prefixed = rules.prefix_labels.iter().map(|label| {
            format!(
                r"(?i){}{SAME_LINE_GAP}[:：]?{SAME_LINE_GAP}({NUMERAL_FRAGMENT})",
                regex::escape(label)
            )
        });
        let patterns = suffixed
            .chain(prefixed)
            .map(|pattern| compile_pattern(&pattern))
            .collect::<ParsingResult<Vec<_>>>()?;

        Ok(Self {
            containers: containers.to_vec(),
            patterns,
        })
    }
}

impl ExtractionStrategy for LabeledContainer {
    fn name(&self) -> &'static str {
        "labeled-container"
    }

    fn extract(&self, page: &PageContent) -> Option<u64> {
        if self.patterns.is_empty() {
            return None;
        }
        self.containers.iter().find_map(|container| {
            page.document()
                .select(container)
                .find_map(|element| first_capture(&self.patterns, &visible_text(element)))
        })
    }
}

/// Tier 3: free-text regex over the whole document, the last resort
pub struct TextPattern {
    patterns: Vec<Regex>,
}

impl TextPattern {
    pub fn new(patterns: &[String]) -> ParsingResult<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| compile_pattern(pattern))
            .collect::<ParsingResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }
}

impl ExtractionStrategy for TextPattern {
    fn name(&self) -> &'static str {
        "text-pattern"
    }

    fn extract(&self, page: &PageContent) -> Option<u64> {
        first_capture(&self.patterns, page.text())
    }
}

/// Ordered strategy chain for one field
pub struct FieldStrategies {
    field: MetricField,
    strategies: Vec<Box<dyn ExtractionStrategy + Send + Sync>>,
}

impl FieldStrategies {
    /// Build the three tiers for `field`; tiers without rules are left out
    pub fn build(field: MetricField, rules: &FieldRules, containers: &[Selector]) -> ParsingResult<Self> {
        let mut strategies: Vec<Box<dyn ExtractionStrategy + Send + Sync>> = Vec::new();

        if !rules.hooks.is_empty() {
            strategies.push(Box::new(StructuralHook::new(&rules.hooks)?));
        }
        if !rules.prefix_labels.is_empty() || !rules.suffix_labels.is_empty() {
            strategies.push(Box::new(LabeledContainer::new(containers, rules)?));
        }
        if !rules.text_patterns.is_empty() {
            strategies.push(Box::new(TextPattern::new(&rules.text_patterns)?));
        }

        if strategies.is_empty() {
            return Err(ParsingError::NoStrategies {
                field: field.to_string(),
            });
        }
        Ok(Self { field, strategies })
    }

    pub const fn field(&self) -> MetricField {
        self.field
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn extract(&self, page: &PageContent) -> Option<u64> {
        self.strategies.iter().find_map(|strategy| {
            let value = strategy.extract(page)?;
            trace!("{} = {} via {}", self.field, value, strategy.name());
            Some(value)
        })
    }
}
