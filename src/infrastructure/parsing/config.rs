//! Extraction rules for profile pages
//!
//! Selectors, label words and text patterns per metric field. They are plain
//! data so a markup change on the profile page can be patched in the config
//! file without a rebuild; `ExtractionRules::default()` is what ships.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::MetricField;

/// Numeral fragment used inside label and text patterns.
/// Digits with separators, an optional space-grouped tail and an optional magnitude.
pub const NUMERAL_FRAGMENT: &str =
    r"[0-9][0-9.,\x{00A0}\x{202F}]*(?: [0-9]{3}\b)*(?:[ \x{00A0}]?(?:[KMBk]\b|천|만|억|千|万|萬|億|亿))?";

/// Gap allowed between a label and its numeral. Never crosses a line, and
/// page text puts every text node on its own line.
pub const SAME_LINE_GAP: &str = r"[ \t\x{00A0}\x{202F}]*";

/// A structural hook: elements matching `selector`, value read from `attribute`
/// when set, otherwise from the element text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookRule {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl HookRule {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: None,
        }
    }

    pub fn attribute(selector: &str, attribute: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: Some(attribute.to_string()),
        }
    }
}

/// Rules for one metric field, one list per strategy tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRules {
    /// Tier 1: known markup hooks
    pub hooks: Vec<HookRule>,
    /// Tier 2: label words that come before the numeral ("Points 1,234")
    pub prefix_labels: Vec<String>,
    /// Tier 2: label words that come after the numeral ("1,234 points")
    pub suffix_labels: Vec<String>,
    /// Tier 3: whole-document regexes, capture group 1 is the numeral
    pub text_patterns: Vec<String>,
}

impl FieldRules {
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
            && self.prefix_labels.is_empty()
            && self.suffix_labels.is_empty()
            && self.text_patterns.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    /// Containers scanned by the labeled (tier 2) strategy, in order
    pub containers: Vec<String>,
    pub fields: BTreeMap<MetricField, FieldRules>,
}

impl ExtractionRules {
    pub fn field(&self, field: MetricField) -> Option<&FieldRules> {
        self.fields.get(&field)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// `<number> <label>` for each label, case-insensitive
fn trailing_label_patterns(labels: &[&str]) -> Vec<String> {
    labels
        .iter()
        .map(|label| format!(r"(?i)({NUMERAL_FRAGMENT}){SAME_LINE_GAP}{label}"))
        .collect()
}

/// `<label>: <number>` for each label, case-insensitive
fn leading_label_patterns(labels: &[&str]) -> Vec<String> {
    labels
        .iter()
        .map(|label| format!(r"(?i){label}{SAME_LINE_GAP}[:：]?{SAME_LINE_GAP}({NUMERAL_FRAGMENT})"))
        .collect()
}

fn stat_hook(name: &str) -> HookRule {
    HookRule::text(&format!(r#"[data-stat="{name}"]"#))
}

impl Default for ExtractionRules {
    fn default() -> Self {
        let mut fields = BTreeMap::new();

        fields.insert(
            MetricField::Level,
            FieldRules {
                hooks: vec![
                    HookRule::attribute("[data-level]", "data-level"),
                    HookRule::text(".level-badge"),
                    HookRule::text(r#"[class*="level"]"#),
                ],
                prefix_labels: strings(&["Level", "레벨", "レベル"]),
                suffix_labels: Vec::new(),
                text_patterns: leading_label_patterns(&[r"\blevel", "레벨", "レベル"]),
            },
        );

        fields.insert(
            MetricField::Points,
            FieldRules {
                hooks: vec![stat_hook("points"), HookRule::text(".points-count")],
                prefix_labels: strings(&["Points", "포인트", "ポイント"]),
                suffix_labels: strings(&["points", "point", "포인트", "ポイント"]),
                text_patterns: [
                    trailing_label_patterns(&[r"points?\b", "포인트", "ポイント"]),
                    leading_label_patterns(&[r"\bpoints?", "포인트"]),
                ]
                .concat(),
            },
        );

        fields.insert(
            MetricField::ReviewCount,
            FieldRules {
                hooks: vec![stat_hook("reviews")],
                prefix_labels: strings(&["Reviews", "리뷰", "クチコミ"]),
                suffix_labels: strings(&["reviews", "review", "개의 리뷰", "件のクチコミ"]),
                text_patterns: [
                    trailing_label_patterns(&[r"reviews?\b", "개의 리뷰", "件のクチコミ"]),
                    leading_label_patterns(&[r"\breviews?", "리뷰"]),
                ]
                .concat(),
            },
        );

        fields.insert(
            MetricField::RatingCount,
            FieldRules {
                hooks: vec![stat_hook("ratings")],
                prefix_labels: strings(&["Ratings", "평점"]),
                suffix_labels: strings(&["ratings", "rating", "개의 평점", "件の評価"]),
                text_patterns: [
                    trailing_label_patterns(&[r"ratings?\b", "개의 평점", "件の評価"]),
                    leading_label_patterns(&[r"\bratings?", "평점"]),
                ]
                .concat(),
            },
        );

        fields.insert(
            MetricField::PhotoCount,
            FieldRules {
                hooks: vec![stat_hook("photos")],
                prefix_labels: strings(&["Photos", "사진"]),
                suffix_labels: strings(&["photos", "장의 사진", "枚の写真"]),
                text_patterns: [
                    trailing_label_patterns(&[r"photos\b", "장의 사진", "枚の写真"]),
                    leading_label_patterns(&[r"\bphotos", "사진"]),
                ]
                .concat(),
            },
        );

        fields.insert(
            MetricField::PhotoViews,
            FieldRules {
                hooks: vec![stat_hook("photo-views")],
                prefix_labels: strings(&["Photo views", "조회수"]),
                suffix_labels: strings(&["photo views", "views", "회 조회", "回表示"]),
                text_patterns: [
                    trailing_label_patterns(&[r"photo ?views?\b", r"views?\b", "회 조회", "回表示"]),
                    leading_label_patterns(&[r"\bviews?", "조회수"]),
                ]
                .concat(),
            },
        );

        fields.insert(
            MetricField::VideoCount,
            FieldRules {
                hooks: vec![stat_hook("videos")],
                prefix_labels: strings(&["Videos", "동영상"]),
                suffix_labels: strings(&["videos", "video", "개의 동영상"]),
                text_patterns: trailing_label_patterns(&[r"videos?\b", "개의 동영상"]),
            },
        );

        fields.insert(
            MetricField::Edits,
            FieldRules {
                hooks: vec![stat_hook("edits")],
                prefix_labels: strings(&["Edits", "수정"]),
                suffix_labels: strings(&["edits", "edit", "건의 수정"]),
                text_patterns: trailing_label_patterns(&[r"edits?\b", "건의 수정"]),
            },
        );

        fields.insert(
            MetricField::PlacesAdded,
            FieldRules {
                hooks: vec![stat_hook("places-added")],
                prefix_labels: strings(&["Places added", "추가한 장소"]),
                suffix_labels: strings(&["places added", "place added", "개의 장소 추가"]),
                text_patterns: trailing_label_patterns(&[r"places? added\b", "개의 장소 추가"]),
            },
        );

        fields.insert(
            MetricField::RoadsAdded,
            FieldRules {
                hooks: vec![stat_hook("roads-added")],
                prefix_labels: strings(&["Roads added", "추가한 도로"]),
                suffix_labels: strings(&["roads added", "road added", "개의 도로 추가"]),
                text_patterns: trailing_label_patterns(&[r"roads? added\b", "개의 도로 추가"]),
            },
        );

        fields.insert(
            MetricField::FactsAdded,
            FieldRules {
                hooks: vec![stat_hook("facts")],
                prefix_labels: strings(&["Facts checked", "확인한 정보"]),
                suffix_labels: strings(&["facts", "fact", "개의 정보 확인"]),
                text_patterns: trailing_label_patterns(&[r"facts?\b", "개의 정보 확인"]),
            },
        );

        fields.insert(
            MetricField::QuestionsAnswered,
            FieldRules {
                hooks: vec![stat_hook("answers")],
                prefix_labels: strings(&["Q&A", "답변"]),
                suffix_labels: strings(&["answers", "answer", "개의 답변"]),
                text_patterns: trailing_label_patterns(&[r"answers?\b", r"Q&A", "개의 답변"]),
            },
        );

        Self {
            containers: strings(&[
                r#"[data-section-id="contributions"]"#,
                ".Qha3nb",
                r#"[role="main"]"#,
            ]),
            fields,
        }
    }
}
