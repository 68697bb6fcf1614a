//! Schema Validator: normalizes parsed model output into the declared shape.
//!
//! Every declared field ends up present with the right JSON type: missing or
//! null fields get their default, near-miss types are coerced, and only values
//! with no reasonable coercion raise `SchemaMismatchError`. Output is canonical,
//! so validating an already validated object returns it unchanged.
//!
//! The typed results (`ComparisonResult`, `AuditResult`) are deserialized from
//! validated maps only.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Scores are percentages.
pub const SCORE_MAX: u64 = 100;

#[derive(Debug, Error, PartialEq)]
#[error("field '{field}' {reason}")]
pub struct SchemaMismatchError {
    pub field: String,
    pub reason: String,
}

impl SchemaMismatchError {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    fn nested(self, parent: &str) -> Self {
        Self {
            field: format!("{parent}.{}", self.field),
            reason: self.reason,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Free text, default `""`.
    Text,
    /// Integer in `[0, 100]`, default `0`.
    Score,
    /// Non-negative integer, default `0`.
    Count,
    /// List of strings, default `[]`.
    TextList,
    /// List of scores, default `[]`.
    ScoreList,
    /// Nested object validated against its own schema.
    Object(&'static Schema),
}

#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Alternative keys models use for the same field; first match wins.
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
}

#[derive(Debug)]
pub struct Schema {
    pub fields: &'static [FieldSpec],
}

impl Schema {
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        aliases: &[],
        kind,
    }
}

const fn aliased(
    name: &'static str,
    aliases: &'static [&'static str],
    kind: FieldKind,
) -> FieldSpec {
    FieldSpec {
        name,
        aliases,
        kind,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Declared schemas
// ────────────────────────────────────────────────────────────────────────────

pub static META_TITLE_SCHEMA: Schema = Schema {
    fields: &[
        aliased("url1_title", &["url1Title", "user_title"], FieldKind::Text),
        aliased("url2_title", &["url2Title", "competitor_title"], FieldKind::Text),
    ],
};

pub static WORD_COUNT_SCHEMA: Schema = Schema {
    fields: &[
        aliased("url1_word_count", &["url1", "url1WordCount"], FieldKind::Count),
        aliased("url2_word_count", &["url2", "url2WordCount"], FieldKind::Count),
    ],
};

pub static PERFORMANCE_SCHEMA: Schema = Schema {
    fields: &[
        aliased(
            "missing_keywords_perf",
            &["missingKeywordsPerf"],
            FieldKind::ScoreList,
        ),
        aliased(
            "suggested_keywords_perf",
            &["suggestedKeywordsPerf"],
            FieldKind::ScoreList,
        ),
    ],
};

pub static COMPARISON_SCHEMA: Schema = Schema {
    fields: &[
        aliased(
            "meta_info_comparison",
            &["meta_title_comparison", "metaTitleComparison"],
            FieldKind::Object(&META_TITLE_SCHEMA),
        ),
        aliased("missing_keywords", &["missingKeywords"], FieldKind::TextList),
        aliased("suggested_keywords", &["suggestedKeywords"], FieldKind::TextList),
        aliased(
            "word_count_comparison",
            &["wordCountComparison"],
            FieldKind::Object(&WORD_COUNT_SCHEMA),
        ),
        field("performance", FieldKind::Object(&PERFORMANCE_SCHEMA)),
        aliased(
            "improved_meta_title",
            &["improvedMetaTitle"],
            FieldKind::Text,
        ),
    ],
};

pub static AUDIT_SCHEMA: Schema = Schema {
    fields: &[
        aliased(
            "overall_seo_score",
            &["seo_score", "overallSeoScore"],
            FieldKind::Score,
        ),
        aliased(
            "keyword_usage_score",
            &["keyword_score", "keywordUsageScore"],
            FieldKind::Score,
        ),
        aliased(
            "content_quality_score",
            &["content_quality", "contentQualityScore"],
            FieldKind::Score,
        ),
        aliased("feedback", &["feedBack"], FieldKind::TextList),
        aliased("recommendation", &["recommendations"], FieldKind::TextList),
        aliased("missing_keywords", &["missingKeywords"], FieldKind::TextList),
        aliased(
            "seo_headings_feedback",
            &["seoHeadingsFeedback"],
            FieldKind::TextList,
        ),
        aliased(
            "strong_content_feedback",
            &["positive_feedbacks", "strongContentFeedback"],
            FieldKind::TextList,
        ),
        aliased("industry_tip", &["industry_tips", "industryTip"], FieldKind::TextList),
        aliased("target_audience", &["targetAudience"], FieldKind::Text),
    ],
};

// ────────────────────────────────────────────────────────────────────────────
// Typed results
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaTitleComparison {
    pub url1_title: String,
    pub url2_title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordCountComparison {
    pub url1_word_count: u64,
    pub url2_word_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordPerformance {
    pub missing_keywords_perf: Vec<u8>,
    pub suggested_keywords_perf: Vec<u8>,
}

/// Two-URL competitive comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub meta_info_comparison: MetaTitleComparison,
    pub missing_keywords: Vec<String>,
    pub suggested_keywords: Vec<String>,
    pub word_count_comparison: WordCountComparison,
    pub performance: KeywordPerformance,
    pub improved_meta_title: String,
}

/// Single-URL content audit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub overall_seo_score: u8,
    pub keyword_usage_score: u8,
    pub content_quality_score: u8,
    pub feedback: Vec<String>,
    pub recommendation: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub seo_headings_feedback: Vec<String>,
    pub strong_content_feedback: Vec<String>,
    pub industry_tip: Vec<String>,
    pub target_audience: String,
}

impl ComparisonResult {
    pub fn from_candidate(candidate: &Map<String, Value>) -> Result<Self, SchemaMismatchError> {
        typed(validate(candidate, &COMPARISON_SCHEMA)?)
    }
}

impl AuditResult {
    pub fn from_candidate(candidate: &Map<String, Value>) -> Result<Self, SchemaMismatchError> {
        typed(validate(candidate, &AUDIT_SCHEMA)?)
    }
}

fn typed<T: serde::de::DeserializeOwned>(validated: Map<String, Value>) -> Result<T, SchemaMismatchError> {
    serde_json::from_value(Value::Object(validated))
        .map_err(|e| SchemaMismatchError::new("<root>", format!("does not fit the result type: {e}")))
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

/// Validates `candidate` against `schema`. Unknown keys are dropped.
pub fn validate(
    candidate: &Map<String, Value>,
    schema: &Schema,
) -> Result<Map<String, Value>, SchemaMismatchError> {
    let mut out = Map::with_capacity(schema.fields.len());

    for spec in schema.fields {
        let raw = std::iter::once(spec.name)
            .chain(spec.aliases.iter().copied())
            .find_map(|key| candidate.get(key).filter(|v| !v.is_null()));

        let value = match raw {
            Some(value) => coerce(spec, value)?,
            None => default_for(spec.kind)?,
        };
        out.insert(spec.name.to_string(), value);
    }

    Ok(out)
}

fn default_for(kind: FieldKind) -> Result<Value, SchemaMismatchError> {
    Ok(match kind {
        FieldKind::Text => Value::String(String::new()),
        FieldKind::Score | FieldKind::Count => Value::from(0u64),
        FieldKind::TextList | FieldKind::ScoreList => Value::Array(Vec::new()),
        FieldKind::Object(schema) => Value::Object(validate(&Map::new(), schema)?),
    })
}

fn coerce(spec: &FieldSpec, value: &Value) -> Result<Value, SchemaMismatchError> {
    let name = spec.name;
    match spec.kind {
        FieldKind::Text => coerce_text(name, value).map(Value::String),
        FieldKind::Score => Ok(coerce_number(name, value, Some(SCORE_MAX))?
            .map(Value::from)
            .unwrap_or_else(|| Value::from(0u64))),
        FieldKind::Count => Ok(coerce_number(name, value, None)?
            .map(Value::from)
            .unwrap_or_else(|| Value::from(0u64))),
        FieldKind::TextList => coerce_text_list(name, value),
        FieldKind::ScoreList => coerce_score_list(name, value),
        FieldKind::Object(schema) => match value {
            Value::Object(inner) => validate(inner, schema)
                .map(Value::Object)
                .map_err(|e| e.nested(name)),
            _ => Err(SchemaMismatchError::new(name, "expected an object")),
        },
    }
}

fn coerce_text(name: &str, value: &Value) -> Result<String, SchemaMismatchError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(items) => {
            let parts = items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| scalar_to_string(item).ok_or_else(|| {
                    SchemaMismatchError::new(name, "expected text, found a nested structure")
                }))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(parts.join(", "))
        }
        Value::Object(_) => Err(SchemaMismatchError::new(name, "expected text, found an object")),
        Value::Null => Ok(String::new()),
    }
}

/// `Ok(None)` means "present but meaningless" and maps to the default.
fn coerce_number(
    name: &str,
    value: &Value,
    max: Option<u64>,
) -> Result<Option<u64>, SchemaMismatchError> {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        Value::Bool(_) | Value::Null => None,
        Value::Array(_) => {
            return Err(SchemaMismatchError::new(name, "expected a number, found an array"))
        }
        Value::Object(_) => {
            return Err(SchemaMismatchError::new(name, "expected a number, found an object"))
        }
    };

    Ok(raw.map(|n| clamp_number(n, max)))
}

fn coerce_text_list(name: &str, value: &Value) -> Result<Value, SchemaMismatchError> {
    let items = match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| {
                scalar_to_string(item).ok_or_else(|| {
                    SchemaMismatchError::new(name, "list items must be text, found a nested structure")
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Number(_) | Value::Bool(_) => scalar_to_string(value).into_iter().collect(),
        Value::Null => Vec::new(),
        Value::Object(_) => {
            return Err(SchemaMismatchError::new(name, "expected a list, found an object"))
        }
    };

    Ok(Value::Array(items.into_iter().map(Value::String).collect()))
}

fn coerce_score_list(name: &str, value: &Value) -> Result<Value, SchemaMismatchError> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => {
            return Err(SchemaMismatchError::new(name, "expected a list, found an object"))
        }
        scalar => vec![scalar],
    };

    let scores = items
        .into_iter()
        .map(|item| match item {
            Value::Array(_) | Value::Object(_) => Err(SchemaMismatchError::new(
                name,
                "list items must be numbers, found a nested structure",
            )),
            other => Ok(coerce_number(name, other, Some(SCORE_MAX))?.unwrap_or(0)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Value::Array(scores.into_iter().map(Value::from).collect()))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Accepts "85", " 85.5 ", "85%", "85/100".
fn parse_numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let trimmed = trimmed
        .strip_suffix("/100")
        .or_else(|| trimmed.strip_suffix('%'))
        .unwrap_or(trimmed)
        .trim();
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn clamp_number(n: f64, max: Option<u64>) -> u64 {
    if !n.is_finite() || n <= 0.0 {
        return 0;
    }
    let rounded = n.round();
    match max {
        Some(max) if rounded >= max as f64 => max,
        // Saturating float-to-int cast.
        _ => rounded as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_absent_list_defaults_to_empty() {
        let out = validate(&Map::new(), &COMPARISON_SCHEMA).unwrap();
        assert_eq!(out["missing_keywords"], json!([]));
        assert_eq!(out["suggested_keywords"], json!([]));
    }

    #[test]
    fn test_present_list_is_preserved_verbatim() {
        let out = validate(&obj(json!({"missing_keywords": ["a", "b"]})), &COMPARISON_SCHEMA).unwrap();
        assert_eq!(out["missing_keywords"], json!(["a", "b"]));
    }

    #[test]
    fn test_empty_candidate_yields_full_default_shape() {
        let out = validate(&Map::new(), &COMPARISON_SCHEMA).unwrap();
        assert_eq!(
            Value::Object(out),
            json!({
                "meta_info_comparison": {"url1_title": "", "url2_title": ""},
                "missing_keywords": [],
                "suggested_keywords": [],
                "word_count_comparison": {"url1_word_count": 0, "url2_word_count": 0},
                "performance": {"missing_keywords_perf": [], "suggested_keywords_perf": []},
                "improved_meta_title": ""
            })
        );
    }

    #[test]
    fn test_null_fields_take_defaults() {
        let out = validate(
            &obj(json!({"overall_seo_score": null, "feedback": null, "target_audience": null})),
            &AUDIT_SCHEMA,
        )
        .unwrap();
        assert_eq!(out["overall_seo_score"], json!(0));
        assert_eq!(out["feedback"], json!([]));
        assert_eq!(out["target_audience"], json!(""));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let candidate = obj(json!({
            "seo_score": "87.6%",
            "keyword_usage_score": 140,
            "content_quality_score": -3,
            "feedBack": "Add more headings",
            "recommendation": ["Shorten the title", 42, null],
            "target_audience": ["developers", "students"],
            "unexpected": {"ignored": true}
        }));
        let once = validate(&candidate, &AUDIT_SCHEMA).unwrap();
        let twice = validate(&once, &AUDIT_SCHEMA).unwrap();
        assert_eq!(once, twice);

        let comparison = obj(json!({
            "meta_title_comparison": {"url1Title": "A"},
            "performance": {"missing_keywords_perf": ["70", 101.4]},
            "word_count_comparison": {"url1_word_count": 1200.7}
        }));
        let once = validate(&comparison, &COMPARISON_SCHEMA).unwrap();
        assert_eq!(validate(&once, &COMPARISON_SCHEMA).unwrap(), once);
    }

    #[test]
    fn test_scores_are_clamped_and_rounded() {
        let out = validate(
            &obj(json!({
                "overall_seo_score": 140,
                "keyword_usage_score": -10,
                "content_quality_score": 71.6
            })),
            &AUDIT_SCHEMA,
        )
        .unwrap();
        assert_eq!(out["overall_seo_score"], json!(100));
        assert_eq!(out["keyword_usage_score"], json!(0));
        assert_eq!(out["content_quality_score"], json!(72));
    }

    #[test]
    fn test_numeric_strings_are_parsed() {
        let out = validate(
            &obj(json!({
                "overall_seo_score": "85%",
                "keyword_usage_score": "60/100",
                "content_quality_score": "N/A"
            })),
            &AUDIT_SCHEMA,
        )
        .unwrap();
        assert_eq!(out["overall_seo_score"], json!(85));
        assert_eq!(out["keyword_usage_score"], json!(60));
        assert_eq!(out["content_quality_score"], json!(0));
    }

    #[test]
    fn test_aliases_map_to_canonical_names() {
        let out = validate(
            &obj(json!({
                "seo_score": 80,
                "keyword_score": 70,
                "content_quality": 60,
                "positive_feedbacks": ["clear intro"]
            })),
            &AUDIT_SCHEMA,
        )
        .unwrap();
        assert_eq!(out["overall_seo_score"], json!(80));
        assert_eq!(out["keyword_usage_score"], json!(70));
        assert_eq!(out["content_quality_score"], json!(60));
        assert_eq!(out["strong_content_feedback"], json!(["clear intro"]));
        assert!(!out.contains_key("seo_score"));
    }

    #[test]
    fn test_canonical_name_wins_over_alias() {
        let out = validate(&obj(json!({"seo_score": 10, "overall_seo_score": 90})), &AUDIT_SCHEMA).unwrap();
        assert_eq!(out["overall_seo_score"], json!(90));
    }

    #[test]
    fn test_single_string_becomes_one_element_list() {
        let out = validate(&obj(json!({"feedback": "Use more H2s"})), &AUDIT_SCHEMA).unwrap();
        assert_eq!(out["feedback"], json!(["Use more H2s"]));

        let out = validate(&obj(json!({"feedback": "  "})), &AUDIT_SCHEMA).unwrap();
        assert_eq!(out["feedback"], json!([]));
    }

    #[test]
    fn test_list_of_scalars_joins_into_text() {
        let out = validate(&obj(json!({"target_audience": ["devs", "founders"]})), &AUDIT_SCHEMA).unwrap();
        assert_eq!(out["target_audience"], json!("devs, founders"));
    }

    #[test]
    fn test_object_where_list_expected_is_mismatch() {
        let err = validate(&obj(json!({"missing_keywords": {"a": 1}})), &COMPARISON_SCHEMA).unwrap_err();
        assert_eq!(err.field, "missing_keywords");
    }

    #[test]
    fn test_nested_structure_inside_list_is_mismatch() {
        let err = validate(&obj(json!({"feedback": [["nested"]]})), &AUDIT_SCHEMA).unwrap_err();
        assert_eq!(err.field, "feedback");
    }

    #[test]
    fn test_array_where_score_expected_is_mismatch() {
        assert!(validate(&obj(json!({"overall_seo_score": [1, 2]})), &AUDIT_SCHEMA).is_err());
    }

    #[test]
    fn test_non_object_where_object_expected_is_mismatch() {
        let err = validate(&obj(json!({"performance": "good"})), &COMPARISON_SCHEMA).unwrap_err();
        assert_eq!(err.field, "performance");
    }

    #[test]
    fn test_nested_mismatch_reports_path() {
        let err = validate(
            &obj(json!({"performance": {"missing_keywords_perf": {"x": 1}}})),
            &COMPARISON_SCHEMA,
        )
        .unwrap_err();
        assert_eq!(err.field, "performance.missing_keywords_perf");
    }

    #[test]
    fn test_score_list_coercion() {
        let out = validate(
            &obj(json!({"performance": {"missing_keywords_perf": [80, "65", "high", 250, null]}})),
            &COMPARISON_SCHEMA,
        )
        .unwrap();
        assert_eq!(out["performance"]["missing_keywords_perf"], json!([80, 65, 0, 100, 0]));
        assert_eq!(out["performance"]["suggested_keywords_perf"], json!([]));
    }

    #[test]
    fn test_word_counts_are_non_negative_integers() {
        let out = validate(
            &obj(json!({"word_count_comparison": {"url1_word_count": -5, "url2_word_count": "2,000"}})),
            &COMPARISON_SCHEMA,
        )
        .unwrap();
        assert_eq!(out["word_count_comparison"]["url1_word_count"], json!(0));
        // "2,000" is not a plain number; defaults rather than guessing.
        assert_eq!(out["word_count_comparison"]["url2_word_count"], json!(0));
    }

    #[test]
    fn test_counts_are_not_capped_at_score_max() {
        let out = validate(
            &obj(json!({"word_count_comparison": {"url1_word_count": 2400}})),
            &COMPARISON_SCHEMA,
        )
        .unwrap();
        assert_eq!(out["word_count_comparison"]["url1_word_count"], json!(2400));
    }

    #[test]
    fn test_typed_comparison_result() {
        let result = ComparisonResult::from_candidate(&obj(json!({
            "meta_info_comparison": {"url1_title": "Mine", "url2_title": "Theirs"},
            "missing_keywords": ["rust seo"],
            "performance": {"missing_keywords_perf": [77]},
            "improved_meta_title": "Better title"
        })))
        .unwrap();
        assert_eq!(result.meta_info_comparison.url2_title, "Theirs");
        assert_eq!(result.missing_keywords, vec!["rust seo"]);
        assert!(result.suggested_keywords.is_empty());
        assert_eq!(result.performance.missing_keywords_perf, vec![77]);
        assert_eq!(result.improved_meta_title, "Better title");
    }

    #[test]
    fn test_typed_audit_result_all_defaults() {
        let result = AuditResult::from_candidate(&Map::new()).unwrap();
        assert_eq!(result, AuditResult::default());
    }

    #[test]
    fn test_audit_result_serializes_snake_case() {
        let value = serde_json::to_value(AuditResult::default()).unwrap();
        assert_eq!(value["overall_seo_score"], json!(0));
        assert_eq!(value["industry_tip"], json!([]));
        assert_eq!(value["target_audience"], json!(""));
    }

    #[test]
    fn test_field_names_list_declared_order() {
        assert_eq!(
            COMPARISON_SCHEMA.field_names(),
            vec![
                "meta_info_comparison",
                "missing_keywords",
                "suggested_keywords",
                "word_count_comparison",
                "performance",
                "improved_meta_title"
            ]
        );
    }
}
