//! Two-view merge
//!
//! A guide is scraped from two views of the same profile. Per field, a
//! non-zero value beats a zero; when both views report a non-zero value the
//! primary view wins even if the secondary one is larger. That tie-break can
//! under-report and is kept as is.

use crate::domain::{MetricField, MetricRecord};

/// `None` only when both views failed
pub fn merge(primary: Option<MetricRecord>, secondary: Option<MetricRecord>) -> Option<MetricRecord> {
    match (primary, secondary) {
        (None, None) => None,
        (Some(only), None) | (None, Some(only)) => Some(only),
        (Some(primary), Some(secondary)) => {
            let mut merged = MetricRecord::default();
            for field in MetricField::ALL {
                let value = match primary.get(field) {
                    0 => secondary.get(field),
                    value => value,
                };
                merged.set(field, value);
            }
            Some(merged)
        }
    }
}
