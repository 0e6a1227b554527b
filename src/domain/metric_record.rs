//! Contribution metrics scraped from a single guide profile
//!
//! A `MetricRecord` is a flat set of non-negative integer counters. Two of them
//! are produced per scrape (one per profile view) and merged into one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named counters of a guide profile. Every field defaults to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricRecord {
    pub level: u64,
    pub points: u64,
    pub review_count: u64,
    pub rating_count: u64,
    pub photo_count: u64,
    pub photo_views: u64,
    pub video_count: u64,
    pub edits: u64,
    pub places_added: u64,
    pub roads_added: u64,
    pub facts_added: u64,
    pub questions_answered: u64,
}

/// Field selector used by extraction rules and the merger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricField {
    Level,
    Points,
    ReviewCount,
    RatingCount,
    PhotoCount,
    PhotoViews,
    VideoCount,
    Edits,
    PlacesAdded,
    RoadsAdded,
    FactsAdded,
    QuestionsAnswered,
}

impl MetricField {
    /// All fields in extraction order
    pub const ALL: [Self; 12] = [
        Self::Level,
        Self::Points,
        Self::ReviewCount,
        Self::RatingCount,
        Self::PhotoCount,
        Self::PhotoViews,
        Self::VideoCount,
        Self::Edits,
        Self::PlacesAdded,
        Self::RoadsAdded,
        Self::FactsAdded,
        Self::QuestionsAnswered,
    ];

    /// The strong field whose presence gates a successful extraction
    pub const STRONG: Self = Self::Points;

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Level => "level",
            Self::Points => "points",
            Self::ReviewCount => "reviewCount",
            Self::RatingCount => "ratingCount",
            Self::PhotoCount => "photoCount",
            Self::PhotoViews => "photoViews",
            Self::VideoCount => "videoCount",
            Self::Edits => "edits",
            Self::PlacesAdded => "placesAdded",
            Self::RoadsAdded => "roadsAdded",
            Self::FactsAdded => "factsAdded",
            Self::QuestionsAnswered => "questionsAnswered",
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MetricRecord {
    #[must_use]
    pub const fn get(&self, field: MetricField) -> u64 {
        match field {
            MetricField::Level => self.level,
            MetricField::Points => self.points,
            MetricField::ReviewCount => self.review_count,
            MetricField::RatingCount => self.rating_count,
            MetricField::PhotoCount => self.photo_count,
            MetricField::PhotoViews => self.photo_views,
            MetricField::VideoCount => self.video_count,
            MetricField::Edits => self.edits,
            MetricField::PlacesAdded => self.places_added,
            MetricField::RoadsAdded => self.roads_added,
            MetricField::FactsAdded => self.facts_added,
            MetricField::QuestionsAnswered => self.questions_answered,
        }
    }

    pub fn set(&mut self, field: MetricField, value: u64) {
        let slot = match field {
            MetricField::Level => &mut self.level,
            MetricField::Points => &mut self.points,
            MetricField::ReviewCount => &mut self.review_count,
            MetricField::RatingCount => &mut self.rating_count,
            MetricField::PhotoCount => &mut self.photo_count,
            MetricField::PhotoViews => &mut self.photo_views,
            MetricField::VideoCount => &mut self.video_count,
            MetricField::Edits => &mut self.edits,
            MetricField::PlacesAdded => &mut self.places_added,
            MetricField::RoadsAdded => &mut self.roads_added,
            MetricField::FactsAdded => &mut self.facts_added,
            MetricField::QuestionsAnswered => &mut self.questions_answered,
        };
        *slot = value;
    }

    /// Builder-style setter, mostly for tests and fixtures
    #[must_use]
    pub fn with(mut self, field: MetricField, value: u64) -> Self {
        self.set(field, value);
        self
    }

    /// True when the strong field carries a value
    #[must_use]
    pub const fn has_strong_field(&self) -> bool {
        self.get(MetricField::STRONG) > 0
    }

    /// Iterate `(field, value)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (MetricField, u64)> + '_ {
        MetricField::ALL.iter().map(move |field| (*field, self.get(*field)))
    }
}

impl fmt::Display for MetricRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Level {}, {} points, {} reviews, {} ratings, {} photos, {} views",
            self.level, self.points, self.review_count, self.rating_count, self.photo_count, self.photo_views
        )
    }
}
